//! The [`Document`] property bag.
//!
//! A document is what the pipeline knows about one capture of one URL: a
//! mapping from property name to one or more string values, plus the list of
//! outgoing links found when the capture was parsed.
//!
//! # Structure
//!
//! ```text
//! Document
//! ├── properties: BTreeMap<String, PropertyValue>   # name -> Single | Multi
//! └── links: Vec<Link>                              # (url, text), ordered, duplicates kept
//! ```
//!
//! # Write rules
//!
//! - Every value is trimmed before it is stored.
//! - Blank values are dropped. Setting a property to nothing removes it.
//! - Duplicate values collapse; one distinct value is stored as a scalar.
//!
//! # Examples
//!
//! ```rust
//! use document::Document;
//!
//! let mut doc = Document::new();
//! doc.set("url", " http://example.com/ ");
//! doc.add("date", "20100501120000");
//! doc.add("date", "20081219000000");
//! doc.set("title", "");
//!
//! assert_eq!(doc.get("url"), "http://example.com/");
//! assert_eq!(doc.get_all("date").len(), 2);
//! assert!(!doc.contains("title"));
//! ```
use std::collections::btree_map::{self, BTreeMap};
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::key::IdentityKey;
use crate::value::{clean, PropertyValue};

/// Canonical property names.
pub mod names {
    pub const URL: &str = "url";
    pub const DIGEST: &str = "digest";
    pub const TITLE: &str = "title";
    pub const DATE: &str = "date";
    pub const TYPE: &str = "type";
    pub const LENGTH: &str = "length";
    pub const COLLECTION: &str = "collection";
    pub const CODE: &str = "code";
    pub const CONTENT: &str = "content";
    pub const BOILED: &str = "boiled";
    pub const KEYWORDS: &str = "keywords";
    pub const DESCRIPTION: &str = "description";
    pub const BOOST: &str = "boost";
    pub const STATUS: &str = "status";
    pub const ERROR_MESSAGE: &str = "errorMessage";
    /// Explicit identity key, overriding `url + " " + digest`. Stored as an
    /// ordinary property: merged like any other and serialized with the
    /// document.
    pub const KEY: &str = "_key";
    /// JSON member holding the link list. Not a property.
    pub const OUTLINKS: &str = "outlinks";
}

/// One outgoing link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

impl Link {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into().trim().to_string(),
            text: text.into().trim().to_string(),
        }
    }
}

/// Multi-valued property bag with an ordered link list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub(crate) properties: BTreeMap<String, PropertyValue>,
    pub(crate) links: Vec<Link>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// One value of `name`, or `""` if absent. For multi-valued properties
    /// this is the smallest value.
    pub fn get(&self, name: &str) -> &str {
        self.properties
            .get(name)
            .map(PropertyValue::first)
            .unwrap_or_default()
    }

    /// Every value of `name`; empty if absent.
    pub fn get_all(&self, name: &str) -> BTreeSet<String> {
        self.properties
            .get(name)
            .map(PropertyValue::to_set)
            .unwrap_or_default()
    }

    pub fn value(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Replace `name` with one value. A blank value removes the property.
    pub fn set(&mut self, name: &str, value: &str) {
        match clean(value) {
            Some(value) => {
                self.properties
                    .insert(name.to_string(), PropertyValue::Single(value));
            }
            None => {
                self.properties.remove(name);
            }
        }
    }

    /// Replace `name` with a set of values. No non-blank values removes the
    /// property.
    pub fn set_all<I, S>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match PropertyValue::from_values(values) {
            Some(value) => {
                self.properties.insert(name.to_string(), value);
            }
            None => {
                self.properties.remove(name);
            }
        }
    }

    /// Add one value to `name`. Blank values are ignored.
    pub fn add(&mut self, name: &str, value: &str) {
        let Some(value) = clean(value) else {
            return;
        };
        match self.properties.entry(name.to_string()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(PropertyValue::Single(value));
            }
            btree_map::Entry::Occupied(mut slot) => slot.get_mut().insert(value),
        }
    }

    /// Add several values to `name`.
    pub fn add_all<I, S>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for value in values {
            self.add(name, value.as_ref());
        }
    }

    /// Remove a property entirely, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.properties.remove(name)
    }

    /// Remove one value of a multi-valued property.
    pub fn remove_value(&mut self, name: &str, value: &str) {
        if let Some(existing) = self.properties.get_mut(name) {
            if !existing.remove(value) {
                self.properties.remove(name);
            }
        }
    }

    /// Properties in name order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyValue)> + '_ {
        self.properties
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.links.is_empty()
    }

    /// Append a link. Links without a URL are ignored.
    pub fn add_link(&mut self, url: &str, text: &str) {
        let link = Link::new(url, text);
        if !link.url.is_empty() {
            self.links.push(link);
        }
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn clear_links(&mut self) {
        self.links.clear();
    }

    /// Identity key: `_key` if present, else `url + " " + digest`.
    ///
    /// `_key` is not stripped from the properties, so it is unioned on merge
    /// and shows up in JSON and index output.
    pub fn identity_key(&self) -> Option<IdentityKey> {
        if let Some(explicit) = self.properties.get(names::KEY) {
            return IdentityKey::parse(explicit.first()).ok();
        }
        let url = self.get(names::URL);
        let digest = self.get(names::DIGEST);
        if url.is_empty() || digest.is_empty() {
            return None;
        }
        Some(IdentityKey::new(url, digest))
    }

    /// Numeric HTTP status from `code`. `None` if absent or not an integer.
    pub fn status_code(&self) -> Option<i32> {
        self.properties
            .get(names::CODE)
            .and_then(|code| code.first().parse().ok())
    }

    /// True for placeholder documents produced by a failed parse.
    pub fn is_error(&self) -> bool {
        self.properties
            .get(names::STATUS)
            .is_some_and(|status| status.contains("error"))
    }
}
