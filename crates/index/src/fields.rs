//! Field handlers: how a merged [`Document`] becomes an [`IndexRecord`].
//!
//! Each handler owns one derived field and reads whatever document
//! properties it needs. Every field carries two flags: whether the value
//! is stored (returned with hits) and how it is indexed (not at all, as one
//! exact keyword, or as tokenized text).
//!
//! | Handler | Field | Stored | Indexed |
//! |---------|-------|--------|---------|
//! | simple copy | `url`, `title`, `keywords`, `description` | yes | text |
//! | simple copy | `digest`, `length` | yes | no |
//! | simple copy | `collection`, `code` | yes | keyword |
//! | [`DateHandler`] | `date` | every full date | `yyyymm` and `yyyy` of each |
//! | [`TypeHandler`] | `type` | normalized | keyword |
//! | [`SiteHandler`] | `site`, `tld` | no | keyword |
//! | [`TextHandler`] | `content`, `boiled` | yes | text |
//! | [`BoostHandler`] | `boost` | when not 1.0 | no |
use std::sync::Arc;

use document::{names, Document};
use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::normalize::TypeNormalizer;

/// Bump this value whenever the stored `IndexRecord` layout changes.
pub const INDEX_SCHEMA_VERSION: u16 = 1;

/// Default cut-off for the text fields, in characters.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexMode {
    No,
    /// One exact term.
    Keyword,
    /// Tokenized text.
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexField {
    pub name: String,
    pub value: String,
    pub stored: bool,
    pub index: IndexMode,
}

/// One document as stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    /// Identity key text, `"<url> <digest>"`.
    pub key: String,
    pub fields: Vec<IndexField>,
    /// Scoring boost; `None` means the neutral 1.0.
    pub boost: Option<f32>,
}

const fn default_schema_version() -> u16 {
    INDEX_SCHEMA_VERSION
}

impl IndexRecord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            schema_version: INDEX_SCHEMA_VERSION,
            key: key.into(),
            fields: Vec::new(),
            boost: None,
        }
    }

    pub fn add(&mut self, name: &str, value: impl Into<String>, stored: bool, index: IndexMode) {
        self.fields.push(IndexField {
            name: name.to_string(),
            value: value.into(),
            stored,
            index,
        });
    }

    /// Stored values of `name`, in insertion order.
    pub fn stored(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| field.name == name && field.stored)
            .map(|field| field.value.as_str())
            .collect()
    }

    /// Indexed terms of `name`, in insertion order.
    pub fn terms(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| field.name == name && field.index != IndexMode::No)
            .map(|field| field.value.as_str())
            .collect()
    }

    /// First stored value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.stored(name).into_iter().next()
    }
}

/// Derives one index field from a document.
pub trait FieldHandler: Send + Sync {
    fn handle(&self, record: &mut IndexRecord, document: &Document);
}

/// Copies one property, trimmed, if it is not empty.
#[derive(Debug, Clone)]
pub struct SimpleFieldHandler {
    name: String,
    stored: bool,
    index: IndexMode,
}

impl SimpleFieldHandler {
    pub fn new(name: impl Into<String>, stored: bool, index: IndexMode) -> Self {
        Self {
            name: name.into(),
            stored,
            index,
        }
    }
}

impl FieldHandler for SimpleFieldHandler {
    fn handle(&self, record: &mut IndexRecord, document: &Document) {
        let value = document.get(&self.name).trim();
        if !value.is_empty() {
            record.add(&self.name, value, self.stored, self.index);
        }
    }
}

/// Stores every capture date and indexes its month and year prefixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateHandler;

impl FieldHandler for DateHandler {
    fn handle(&self, record: &mut IndexRecord, document: &Document) {
        for date in document.get_all(names::DATE) {
            for width in [6, 4] {
                if let Some(prefix) = date.get(..width) {
                    record.add(names::DATE, prefix, false, IndexMode::Keyword);
                }
            }
            record.add(names::DATE, date, true, IndexMode::No);
        }
    }
}

/// Stores and indexes the normalized content type.
#[derive(Debug, Clone)]
pub struct TypeHandler {
    normalizer: Arc<TypeNormalizer>,
}

impl TypeHandler {
    pub fn new(normalizer: Arc<TypeNormalizer>) -> Self {
        Self { normalizer }
    }
}

impl FieldHandler for TypeHandler {
    fn handle(&self, record: &mut IndexRecord, document: &Document) {
        let normalized = self.normalizer.normalize_document(document);
        if !normalized.is_empty() {
            record.add(names::TYPE, normalized, true, IndexMode::Keyword);
        }
    }
}

/// Indexes the `site` (host without `www.`) and `tld` of the URL.
///
/// Nothing is added for unparseable URLs; IP hosts get a site but no TLD.
#[derive(Debug, Clone, Copy, Default)]
pub struct SiteHandler;

impl FieldHandler for SiteHandler {
    fn handle(&self, record: &mut IndexRecord, document: &Document) {
        let Ok(url) = Url::parse(document.get(names::URL)) else {
            return;
        };
        match url.host() {
            Some(Host::Domain(host)) => {
                let host = host.trim_end_matches('.').to_ascii_lowercase();
                let site = host.strip_prefix("www.").unwrap_or(&host);
                if site.is_empty() {
                    return;
                }
                record.add("site", site, false, IndexMode::Keyword);
                if let Some((_, tld)) = site.rsplit_once('.') {
                    record.add("tld", tld, false, IndexMode::Keyword);
                }
            }
            Some(ip @ (Host::Ipv4(_) | Host::Ipv6(_))) => {
                record.add("site", ip.to_string(), false, IndexMode::Keyword);
            }
            None => {}
        }
    }
}

/// Indexes a large text property, cut at the last space before the
/// maximum length. A single token longer than the maximum is dropped.
#[derive(Debug, Clone)]
pub struct TextHandler {
    name: String,
    max_length: usize,
}

impl TextHandler {
    pub fn new(name: impl Into<String>, max_length: usize) -> Self {
        Self {
            name: name.into(),
            max_length,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl FieldHandler for TextHandler {
    fn handle(&self, record: &mut IndexRecord, document: &Document) {
        let text = document.get(&self.name);
        if let Some(text) = truncate_text(text, self.max_length) {
            record.add(&self.name, text, true, IndexMode::Text);
        }
    }
}

/// `text` cut to at most `max_length` characters at a space boundary.
pub fn truncate_text(text: &str, max_length: usize) -> Option<&str> {
    if text.is_empty() {
        return None;
    }
    let mut last_space = None;
    for (count, (idx, ch)) in text.char_indices().enumerate() {
        if count > max_length {
            return last_space.map(|end| &text[..end]);
        }
        if ch == ' ' {
            last_space = Some(idx);
        }
    }
    Some(text)
}

/// Records a `boost` property other than 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoostHandler;

impl FieldHandler for BoostHandler {
    fn handle(&self, record: &mut IndexRecord, document: &Document) {
        let boost = document
            .get(names::BOOST)
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|b| b.is_finite())
            .unwrap_or(1.0);
        if boost != 1.0 {
            record.add(names::BOOST, boost.to_string(), true, IndexMode::No);
            record.boost = Some(boost);
        }
    }
}

/// The standard handler set.
pub fn default_handlers(
    normalizer: Arc<TypeNormalizer>,
    max_text_length: usize,
) -> Vec<Box<dyn FieldHandler>> {
    vec![
        Box::new(SimpleFieldHandler::new(names::URL, true, IndexMode::Text)),
        Box::new(SimpleFieldHandler::new(names::DIGEST, true, IndexMode::No)),
        Box::new(SimpleFieldHandler::new(names::TITLE, true, IndexMode::Text)),
        Box::new(SimpleFieldHandler::new(names::KEYWORDS, true, IndexMode::Text)),
        Box::new(SimpleFieldHandler::new(names::DESCRIPTION, true, IndexMode::Text)),
        Box::new(SimpleFieldHandler::new(names::LENGTH, true, IndexMode::No)),
        Box::new(SimpleFieldHandler::new(names::COLLECTION, true, IndexMode::Keyword)),
        Box::new(SimpleFieldHandler::new(names::CODE, true, IndexMode::Keyword)),
        Box::new(TextHandler::new(names::CONTENT, max_text_length)),
        Box::new(TextHandler::new(names::BOILED, max_text_length)),
        Box::new(DateHandler),
        Box::new(SiteHandler),
        Box::new(TypeHandler::new(normalizer)),
        Box::new(BoostHandler),
    ]
}
