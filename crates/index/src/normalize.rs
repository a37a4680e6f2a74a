//! Content-type normalization.
//!
//! Servers describe the same format in many ways. Before a document is
//! filtered or indexed its `type` is cut at the first `;` (dropping
//! `charset=...` and friends) and looked up in an alias table:
//!
//! | Alias | Canonical |
//! |-------|-----------|
//! | `application/x-pdf` | `application/pdf` |
//! | `application/xhtml+xml` | `text/html` |
//! | `application/vnd.ms-word`, `.docx` type | `application/msword` |
//! | seven PowerPoint spellings | `application/vnd.ms-powerpoint` |
//!
//! The table is plain data owned by the normalizer and shared through an
//! `Arc` by the type filter and the type field handler.
use std::collections::BTreeMap;

use document::{names, Document};

const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("application/x-pdf", "application/pdf"),
    ("application/xhtml+xml", "text/html"),
    ("application/vnd.ms-word", "application/msword"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "application/msword",
    ),
    ("application/mspowerpoint", "application/vnd.ms-powerpoint"),
    ("application/ms-powerpoint", "application/vnd.ms-powerpoint"),
    ("application/mspowerpnt", "application/vnd.ms-powerpoint"),
    ("application/vnd-mspowerpoint", "application/vnd.ms-powerpoint"),
    ("application/powerpoint", "application/vnd.ms-powerpoint"),
    ("application/x-powerpoint", "application/vnd.ms-powerpoint"),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "application/vnd.ms-powerpoint",
    ),
];

/// Maps declared content types to canonical ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeNormalizer {
    aliases: BTreeMap<String, String>,
}

impl TypeNormalizer {
    /// A normalizer with no aliases; it only strips parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// A normalizer loaded with the default alias table.
    pub fn with_defaults() -> Self {
        Self {
            aliases: default_aliases(),
        }
    }

    /// Add aliases, overriding existing entries.
    pub fn with_aliases<I>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.aliases.extend(aliases);
        self
    }

    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    /// Strip parameters and resolve aliases.
    pub fn normalize(&self, content_type: &str) -> String {
        let base = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        match self.aliases.get(base) {
            Some(canonical) => canonical.clone(),
            None => base.to_string(),
        }
    }

    /// Normalized `type` of a document; `""` when it has none.
    pub fn normalize_document(&self, document: &Document) -> String {
        self.normalize(document.get(names::TYPE))
    }
}

/// The default alias -> canonical table.
pub fn default_aliases() -> BTreeMap<String, String> {
    DEFAULT_ALIASES
        .iter()
        .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
        .collect()
}

/// Parse a configured alias list.
///
/// Entries are whitespace separated; each is `canonical:alias1,alias2`.
/// Entries without an alias or with an empty canonical name are ignored.
pub fn parse_aliases(spec: &str) -> BTreeMap<String, String> {
    let mut aliases = BTreeMap::new();
    for entry in spec.split_whitespace() {
        let mut tokens = entry.split([':', ',']);
        let Some(canonical) = tokens.next().filter(|t| !t.is_empty()) else {
            continue;
        };
        for alias in tokens.filter(|t| !t.is_empty()) {
            aliases.insert(alias.to_string(), canonical.to_string());
        }
    }
    aliases
}
