//! Admission filters.
//!
//! A [`FilterChain`] admits a document only if every filter allows it. The
//! chain short-circuits on the first rejection and reports which filter
//! said no, so the order of filters changes cost, never outcome.
//!
//! | Filter | Rejects |
//! |--------|---------|
//! | [`RequiredFieldsFilter`] | a required property (default `url`) is empty |
//! | [`RobotsFilter`] | URL path is exactly `/robots.txt` or `/favicon.ico` |
//! | [`HttpStatusFilter`] | `code` present and outside every configured range |
//! | [`TypeFilter`] | normalized `type` not in a non-empty allow-list |
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use document::{names, Document};
use url::Url;

use crate::error::IndexError;
use crate::normalize::TypeNormalizer;

/// A pure admission predicate.
pub trait DocumentFilter: Send + Sync {
    fn is_allowed(&self, document: &Document) -> bool;
}

/// Rejects documents missing any of the required properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFieldsFilter {
    fields: Vec<String>,
}

impl RequiredFieldsFilter {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for RequiredFieldsFilter {
    fn default() -> Self {
        Self::new([names::URL])
    }
}

impl DocumentFilter for RequiredFieldsFilter {
    fn is_allowed(&self, document: &Document) -> bool {
        self.fields
            .iter()
            .all(|field| !document.get(field).trim().is_empty())
    }
}

/// Rejects `robots.txt` and `favicon.ico` captures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RobotsFilter;

impl DocumentFilter for RobotsFilter {
    fn is_allowed(&self, document: &Document) -> bool {
        // Unparseable URLs are not this filter's concern.
        match Url::parse(document.get(names::URL)) {
            Ok(url) => !matches!(url.path().trim(), "/robots.txt" | "/favicon.ico"),
            Err(_) => true,
        }
    }
}

/// Inclusive status-code range. `-1` stands for "no status recoverable".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRange {
    pub lower: i32,
    pub upper: i32,
}

impl StatusRange {
    pub const UNKNOWN: StatusRange = StatusRange { lower: -1, upper: -1 };

    pub fn contains(&self, code: i32) -> bool {
        self.lower <= code && code <= self.upper
    }
}

impl fmt::Display for StatusRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == StatusRange::UNKNOWN {
            f.write_str("unknown")
        } else if self.lower == self.upper {
            write!(f, "{}", self.lower)
        } else {
            write!(f, "{}-{}", self.lower, self.upper)
        }
    }
}

/// Admits documents with at least one `code` value in a configured range.
///
/// A merged document can carry several codes, one per capture. Documents
/// with no `code` at all are admitted; older captures predate status
/// recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpStatusFilter {
    ranges: Vec<StatusRange>,
}

impl HttpStatusFilter {
    pub const DEFAULT_RANGE: &'static str = "200-299";

    /// Parse whitespace-separated `N`, `N-M` or `unknown` entries. A blank
    /// spec means [`Self::DEFAULT_RANGE`].
    pub fn parse(spec: &str) -> Result<Self, IndexError> {
        let spec = match spec.trim() {
            "" => Self::DEFAULT_RANGE,
            trimmed => trimmed,
        };
        let ranges = spec
            .split_whitespace()
            .map(parse_range)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { ranges })
    }

    pub fn ranges(&self) -> &[StatusRange] {
        &self.ranges
    }
}

impl Default for HttpStatusFilter {
    fn default() -> Self {
        Self {
            ranges: vec![StatusRange {
                lower: 200,
                upper: 299,
            }],
        }
    }
}

fn parse_range(value: &str) -> Result<StatusRange, IndexError> {
    if value.eq_ignore_ascii_case("unknown") {
        return Ok(StatusRange::UNKNOWN);
    }
    let invalid = || IndexError::InvalidStatusRange(value.to_string());
    let number = |s: &str| s.parse::<i32>().map_err(|_| invalid());
    let range = match value.split_once('-') {
        Some((lower, upper)) => StatusRange {
            lower: number(lower)?,
            upper: number(upper)?,
        },
        None => {
            let code = number(value)?;
            StatusRange {
                lower: code,
                upper: code,
            }
        }
    };
    if range.lower > range.upper {
        return Err(invalid());
    }
    Ok(range)
}

impl DocumentFilter for HttpStatusFilter {
    fn is_allowed(&self, document: &Document) -> bool {
        let codes = document.get_all(names::CODE);
        let mut codes = codes
            .iter()
            .map(|code| code.trim())
            .filter(|code| !code.is_empty())
            .peekable();
        if codes.peek().is_none() {
            return true;
        }
        codes.any(|code| {
            code.parse::<i32>()
                .is_ok_and(|code| self.ranges.iter().any(|range| range.contains(code)))
        })
    }
}

/// Default allow-list of the type filter.
pub const DEFAULT_ALLOWED_TYPES: &[&str] = &[
    "text/html",
    "text/plain",
    "application/pdf",
    "application/msword",
    "application/vnd.ms-powerpoint",
    "application/vnd.oasis.opendocument.text",
    "application/vnd.oasis.opendocument.presentation",
    "application/vnd.oasis.opendocument.spreadsheet",
];

/// Admits documents whose normalized type is allowed. An empty allow-list
/// admits everything.
#[derive(Debug, Clone)]
pub struct TypeFilter {
    allowed: BTreeSet<String>,
    normalizer: Arc<TypeNormalizer>,
}

impl TypeFilter {
    pub fn new<I, S>(allowed: I, normalizer: Arc<TypeNormalizer>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            normalizer,
        }
    }

    pub fn with_defaults(normalizer: Arc<TypeNormalizer>) -> Self {
        Self::new(DEFAULT_ALLOWED_TYPES.iter().copied(), normalizer)
    }

    pub fn allowed(&self) -> &BTreeSet<String> {
        &self.allowed
    }
}

impl DocumentFilter for TypeFilter {
    fn is_allowed(&self, document: &Document) -> bool {
        self.allowed.is_empty()
            || self
                .allowed
                .contains(&self.normalizer.normalize_document(document))
    }
}

/// Ordered, named admission filters combined with logical AND.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<(String, Box<dyn DocumentFilter>)>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter<F>(mut self, name: impl Into<String>, filter: F) -> Self
    where
        F: DocumentFilter + 'static,
    {
        self.push(name, filter);
        self
    }

    pub fn push<F>(&mut self, name: impl Into<String>, filter: F)
    where
        F: DocumentFilter + 'static,
    {
        self.filters.push((name.into(), Box::new(filter)));
    }

    pub fn is_allowed(&self, document: &Document) -> bool {
        self.rejected_by(document).is_none()
    }

    /// Name of the first filter that rejects `document`.
    pub fn rejected_by(&self, document: &Document) -> Option<&str> {
        self.filters
            .iter()
            .find(|(_, filter)| !filter.is_allowed(document))
            .map(|(name, _)| name.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.filters.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(pairs: &[(&str, &str)]) -> Document {
        let mut doc = Document::new();
        for (name, value) in pairs {
            doc.set(name, value);
        }
        doc
    }

    fn standard_chain() -> FilterChain {
        let normalizer = Arc::new(TypeNormalizer::with_defaults());
        FilterChain::new()
            .with_filter("required_fields", RequiredFieldsFilter::default())
            .with_filter("type", TypeFilter::with_defaults(normalizer))
            .with_filter("robots", RobotsFilter)
            .with_filter("http_status", HttpStatusFilter::default())
    }

    #[test]
    fn missing_url_always_rejected_by_required_fields() {
        let chain = standard_chain();
        let document = doc(&[("type", "text/html"), ("code", "200")]);
        assert_eq!(chain.rejected_by(&document), Some("required_fields"));
        let document = doc(&[("type", "image/png"), ("code", "500")]);
        assert_eq!(chain.rejected_by(&document), Some("required_fields"));
    }

    #[test]
    fn status_outside_default_range_rejected_absent_code_allowed() {
        let filter = HttpStatusFilter::default();
        assert!(!filter.is_allowed(&doc(&[("code", "404")])));
        assert!(filter.is_allowed(&doc(&[("code", "204")])));
        assert!(filter.is_allowed(&doc(&[("url", "http://x/")])));
        assert!(!filter.is_allowed(&doc(&[("code", "abc")])));
    }

    #[test]
    fn status_allowed_when_in_any_range() {
        let filter = HttpStatusFilter::parse("200-299 304 unknown").unwrap();
        assert_eq!(filter.ranges().len(), 3);
        assert!(filter.is_allowed(&doc(&[("code", "304")])));
        assert!(filter.is_allowed(&doc(&[("code", "-1")])));
        assert!(!filter.is_allowed(&doc(&[("code", "301")])));
    }

    #[test]
    fn merged_codes_admit_when_any_capture_matches() {
        let filter = HttpStatusFilter::default();
        let mut merged = doc(&[("code", "404")]);
        merged.add("code", "200");
        assert!(filter.is_allowed(&merged));

        let mut failed = doc(&[("code", "404")]);
        failed.add("code", "500");
        assert!(!filter.is_allowed(&failed));
    }

    #[test]
    fn status_spec_parsing() {
        assert_eq!(HttpStatusFilter::parse("  ").unwrap(), HttpStatusFilter::default());
        assert!(matches!(
            HttpStatusFilter::parse("200-abc"),
            Err(IndexError::InvalidStatusRange(_))
        ));
        assert!(HttpStatusFilter::parse("299-200").is_err());
        assert!(HttpStatusFilter::parse("1-2-3").is_err());
        let ranges: Vec<String> = HttpStatusFilter::parse("Unknown 404 200-299")
            .unwrap()
            .ranges()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(ranges, ["unknown", "404", "200-299"]);
    }

    #[test]
    fn robots_and_favicon_rejected() {
        let filter = RobotsFilter;
        assert!(!filter.is_allowed(&doc(&[("url", "http://example.com/robots.txt")])));
        assert!(!filter.is_allowed(&doc(&[("url", "http://example.com/favicon.ico")])));
        assert!(filter.is_allowed(&doc(&[("url", "http://example.com/a/robots.txt")])));
        assert!(filter.is_allowed(&doc(&[("url", "not a url")])));
    }

    #[test]
    fn type_filter_normalizes_before_lookup() {
        let normalizer = Arc::new(TypeNormalizer::with_defaults());
        let filter = TypeFilter::with_defaults(normalizer.clone());
        assert!(filter.is_allowed(&doc(&[("type", "application/x-pdf")])));
        assert!(filter.is_allowed(&doc(&[("type", "text/html; charset=utf-8")])));
        assert!(!filter.is_allowed(&doc(&[("type", "image/png")])));
        assert!(!filter.is_allowed(&Document::new()));

        let open = TypeFilter::new(Vec::<String>::new(), normalizer);
        assert!(open.is_allowed(&doc(&[("type", "image/png")])));
    }

    #[test]
    fn chain_admits_complete_document() {
        let chain = standard_chain();
        let document = doc(&[
            ("url", "http://example.com/"),
            ("type", "text/html"),
            ("code", "200"),
        ]);
        assert!(chain.is_allowed(&document));
        assert_eq!(format!("{chain:?}"), r#"["required_fields", "type", "robots", "http_status"]"#);
    }
}
