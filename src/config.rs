//! YAML configuration for the arcdoc pipeline.
//!
//! One file configures every stage. Sections map onto the per-crate config
//! types and may be left out to take their defaults.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! # arcdoc pipeline configuration
//! version: "1.0"
//! log_level: info
//!
//! ingest:
//!   content_limit: 10000000
//!   html_limit: 1048576
//!   emit_parse_errors: true
//!   emit_outlinks: true
//!   boilerplate: true
//!   abort_on_archive_error: true
//!   collection: crawl-2010
//!
//! merge:
//!   drop_links: false
//!
//! index:
//!   http_status: "200-299 unknown"
//!   allowed_types: [application/rtf]
//!   type_aliases: "application/rtf:text/rtf"
//!   robots: true
//!   required_fields: [url]
//!   max_text_length: 100000
//!   backend:
//!     type: redb
//!     path: /data/arcdoc.redb
//!   compression:
//!     codec: zstd
//!     level: 3
//! ```

use std::fs;
use std::path::Path;

use document::MergeConfig;
use index::{IndexConfig, IndexError};
use ingest::{ConfigError, IngestConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

/// Errors that can occur when loading YAML configuration files.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("invalid log level `{0}`")]
    LogLevel(String),

    #[error("ingest section: {0}")]
    Ingest(#[from] ConfigError),

    #[error("index section: {0}")]
    Index(#[from] IndexError),
}

/// Top-level configuration for every pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Configuration format version.
    pub version: String,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub ingest: IngestConfig,
    pub merge: MergeConfig,
    pub index: IndexConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            log_level: "info".to_string(),
            ingest: IngestConfig::default(),
            merge: MergeConfig::default(),
            index: IndexConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a YAML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate YAML configuration text. Empty text yields the
    /// defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: PipelineConfig = if yaml.trim().is_empty() {
            PipelineConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigLoadError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }
        self.log_level
            .parse::<Level>()
            .map_err(|_| ConfigLoadError::LogLevel(self.log_level.clone()))?;
        self.ingest.validate()?;
        self.index.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use index::{BackendConfig, CompressionCodec};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn full_yaml_round_trips_sections() {
        let yaml = r#"
version: "1.0"
log_level: debug
ingest:
  emit_parse_errors: false
  collection: crawl-2010
merge:
  drop_links: true
index:
  http_status: "200-299 unknown"
  robots: false
  backend:
    type: redb
    path: /tmp/arcdoc.redb
  compression:
    codec: none
"#;
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.log_level, "debug");
        assert!(!config.ingest.emit_parse_errors);
        assert_eq!(config.ingest.collection.as_deref(), Some("crawl-2010"));
        assert!(config.merge.drop_links);
        assert!(!config.index.robots);
        assert_eq!(config.index.backend, BackendConfig::redb("/tmp/arcdoc.redb"));
        assert_eq!(config.index.compression.codec, CompressionCodec::None);

        let reparsed = PipelineConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config = PipelineConfig::from_yaml("version: \"1\"\n").unwrap();
        assert_eq!(config.ingest, IngestConfig::default());
        assert_eq!(config.index, IndexConfig::default());
        assert_eq!(PipelineConfig::from_yaml("").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(matches!(
            PipelineConfig::from_yaml("version: \"2.0\"\n"),
            Err(ConfigLoadError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            PipelineConfig::from_yaml("log_level: chatty\n"),
            Err(ConfigLoadError::LogLevel(_))
        ));
        assert!(matches!(
            PipelineConfig::from_yaml("index:\n  http_status: \"300-200\"\n"),
            Err(ConfigLoadError::Index(_))
        ));
        assert!(matches!(
            PipelineConfig::from_yaml("ingest: [1, 2]\n"),
            Err(ConfigLoadError::YamlParse(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "merge:\n  drop_links: true").unwrap();
        let config = PipelineConfig::from_file(file.path()).unwrap();
        assert!(config.merge.drop_links);

        assert!(matches!(
            PipelineConfig::from_file("/nonexistent/arcdoc.yaml"),
            Err(ConfigLoadError::FileRead(_))
        ));
    }
}
