//! The merge engine.
//!
//! Partial observations of one logical document (a CDX line, a revisit, a
//! full parse) are combined into a single document:
//!
//! ```text
//! values for key K ──► first value = accumulator ──► acc.merge(v2) ──► acc.merge(v3) ──► ...
//! ```
//!
//! # Rules
//!
//! | Part | Rule |
//! |------|------|
//! | Properties | union of all trimmed, non-blank, distinct values (`date` included) |
//! | Links | adopted from the incoming document only while the accumulator has none |
//!
//! The property union is commutative, associative and idempotent, so any
//! delivery order or grouping of the values produces the same property sets.
//! Links are not unioned: they belong to whichever capture was parsed.
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::document::Document;

/// Options for the merge stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Strip links from every document before merging.
    pub drop_links: bool,
}

impl MergeConfig {
    pub fn with_drop_links(mut self, drop_links: bool) -> Self {
        self.drop_links = drop_links;
        self
    }

    /// Apply map-side options to one incoming document.
    pub fn prepare(&self, mut doc: Document) -> Document {
        if self.drop_links {
            doc.clear_links();
        }
        doc
    }
}

impl Document {
    /// Fold `other` into `self` in place.
    pub fn merge(&mut self, other: &Document) {
        for (name, value) in &other.properties {
            for item in value.iter() {
                self.add(name, item);
            }
        }
        if self.links.is_empty() && !other.links.is_empty() {
            self.links.extend_from_slice(&other.links);
        }
    }
}

/// Merge every document of one group into the first. `None` for an empty
/// group.
pub fn merge_group<I>(values: I) -> Option<Document>
where
    I: IntoIterator<Item = Document>,
{
    let mut values = values.into_iter();
    let mut acc = values.next()?;
    for doc in values {
        acc.merge(&doc);
    }
    Some(acc)
}

/// [`merge_group`] over JSON-encoded documents. Malformed values are logged
/// and skipped.
pub fn merge_json_group<I, S>(key: &str, values: I) -> Option<Document>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    merge_group(values.into_iter().filter_map(|json| {
        match Document::from_json(json.as_ref()) {
            Ok(doc) => Some(doc),
            Err(err) => {
                warn!(key, error = %err, "merge_value_skipped");
                None
            }
        }
    }))
}
