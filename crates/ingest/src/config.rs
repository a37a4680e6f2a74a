//! Configuration types for archive ingestion.
//!
//! [`IngestConfig`] controls how much of each record is read, how much of it
//! the parser sees, and what happens when something goes wrong. It is cheap
//! to clone and deserializes from the `ingest` section of the pipeline YAML.
//!
//! # Quick Start
//!
//! ```rust
//! use ingest::IngestConfig;
//!
//! let config = IngestConfig::default()
//!     .with_content_limit(10 * 1024 * 1024)
//!     .with_html_limit(Some(1024 * 1024))
//!     .with_collection("crawl-2010");
//!
//! config.validate().expect("valid configuration");
//! ```
//!
//! # Serialization
//!
//! ```yaml
//! content_limit: -1          # bytes of each record body kept in memory, -1 = unbounded
//! html_limit: 1048576        # bytes of HTML handed to the parser
//! text_limit: null           # bytes of plain text handed to the parser
//! emit_parse_errors: true
//! emit_outlinks: true
//! boilerplate: true
//! abort_on_archive_error: true
//! collection: crawl-2010
//! ```
use archive::SizeLimit;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runtime configuration for archive ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Record body bytes retained by the archive reader. Negative means
    /// unbounded.
    ///
    /// Default: `-1`
    pub content_limit: i64,

    /// Maximum bytes of an HTML-family body handed to the parser. Applied
    /// only when the record is longer than the limit.
    ///
    /// Default: `None`
    pub html_limit: Option<u64>,

    /// Maximum bytes of a `text/plain` body handed to the parser.
    ///
    /// Default: `None`
    pub text_limit: Option<u64>,

    /// Emit a `status=error` document when parsing fails.
    ///
    /// Default: `true`
    pub emit_parse_errors: bool,

    /// Attach parsed outlinks to documents.
    ///
    /// Default: `true`
    pub emit_outlinks: bool,

    /// Produce the `boiled` (boilerplate-stripped) text for HTML.
    ///
    /// Default: `true`
    pub boilerplate: bool,

    /// Propagate archive read errors instead of abandoning the file with a
    /// warning.
    ///
    /// Default: `true`
    pub abort_on_archive_error: bool,

    /// Collection name stamped into every emitted document.
    ///
    /// Default: `None`
    pub collection: Option<String>,
}

/// Configuration validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{field} must be greater than zero when set")]
    ZeroLimit { field: &'static str },
    #[error(
        "{field} ({limit}) exceeds content_limit ({content_limit}); \
         the parser can never see more than the reader retains"
    )]
    ParseLimitExceedsContentLimit {
        field: &'static str,
        limit: u64,
        content_limit: u64,
    },
    #[error("collection name must not be blank")]
    BlankCollection,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            content_limit: -1,
            html_limit: None,
            text_limit: None,
            emit_parse_errors: true,
            emit_outlinks: true,
            boilerplate: true,
            abort_on_archive_error: true,
            collection: None,
        }
    }
}

impl IngestConfig {
    pub fn with_content_limit(mut self, bytes: i64) -> Self {
        self.content_limit = bytes;
        self
    }

    pub fn with_html_limit(mut self, bytes: Option<u64>) -> Self {
        self.html_limit = bytes;
        self
    }

    pub fn with_text_limit(mut self, bytes: Option<u64>) -> Self {
        self.text_limit = bytes;
        self
    }

    pub fn with_emit_parse_errors(mut self, emit: bool) -> Self {
        self.emit_parse_errors = emit;
        self
    }

    pub fn with_emit_outlinks(mut self, emit: bool) -> Self {
        self.emit_outlinks = emit;
        self
    }

    pub fn with_boilerplate(mut self, enabled: bool) -> Self {
        self.boilerplate = enabled;
        self
    }

    pub fn with_abort_on_archive_error(mut self, abort: bool) -> Self {
        self.abort_on_archive_error = abort;
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Reader-side retention limit.
    pub fn size_limit(&self) -> SizeLimit {
        SizeLimit::from_config(self.content_limit)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let content_limit = match self.size_limit() {
            SizeLimit::Bytes(bytes) => Some(bytes),
            SizeLimit::Unbounded => None,
        };
        for (field, limit) in [("html_limit", self.html_limit), ("text_limit", self.text_limit)] {
            match (limit, content_limit) {
                (Some(0), _) => return Err(ConfigError::ZeroLimit { field }),
                (Some(limit), Some(content_limit)) if limit > content_limit => {
                    return Err(ConfigError::ParseLimitExceedsContentLimit {
                        field,
                        limit,
                        content_limit,
                    })
                }
                _ => {}
            }
        }
        if self
            .collection
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(ConfigError::BlankCollection);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = IngestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.size_limit(), SizeLimit::Unbounded);
        assert!(config.emit_parse_errors && config.emit_outlinks && config.boilerplate);
        assert!(config.abort_on_archive_error);
    }

    #[test]
    fn zero_parse_limit_rejected() {
        let config = IngestConfig::default().with_text_limit(Some(0));
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroLimit { field: "text_limit" })
        );
    }

    #[test]
    fn parse_limit_above_content_limit_rejected() {
        let config = IngestConfig::default()
            .with_content_limit(100)
            .with_html_limit(Some(200));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ParseLimitExceedsContentLimit {
                field: "html_limit",
                ..
            })
        ));
    }

    #[test]
    fn blank_collection_rejected() {
        let config = IngestConfig::default().with_collection("  ");
        assert_eq!(config.validate(), Err(ConfigError::BlankCollection));
    }

    #[test]
    fn partial_yaml_style_json_uses_defaults() {
        let config: IngestConfig =
            serde_json::from_str(r#"{"content_limit": 1024, "emit_outlinks": false}"#).unwrap();
        assert_eq!(config.size_limit(), SizeLimit::Bytes(1024));
        assert!(!config.emit_outlinks);
        assert!(config.emit_parse_errors);
    }
}
