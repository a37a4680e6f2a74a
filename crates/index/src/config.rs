//! Index configuration.
//!
//! Deserializes from the `index` section of the pipeline YAML:
//!
//! ```yaml
//! index:
//!   http_status: "200-299 unknown"
//!   allowed_types: [application/rtf]
//!   use_default_types: true
//!   type_aliases: "application/pdf:application/acrobat"
//!   use_default_aliases: true
//!   robots: true
//!   required_fields: [url]
//!   max_text_length: 100000
//!   backend:
//!     type: in_memory
//!   compression:
//!     codec: zstd
//!     level: 3
//! ```
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use zstd::{decode_all, encode_all};

use crate::backend::BackendConfig;
use crate::error::IndexError;
use crate::fields::DEFAULT_MAX_TEXT_LENGTH;
use crate::filter::{
    FilterChain, HttpStatusFilter, RequiredFieldsFilter, RobotsFilter, TypeFilter,
    DEFAULT_ALLOWED_TYPES,
};
use crate::normalize::{parse_aliases, TypeNormalizer};

/// Compression codec for stored records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionCodec {
    None,
    #[default]
    Zstd,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub codec: CompressionCodec,
    /// Zstd level, 1-22.
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: 3,
        }
    }
}

impl CompressionConfig {
    pub fn new(codec: CompressionCodec, level: i32) -> Self {
        Self { codec, level }
    }

    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub(crate) fn compress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => {
                encode_all(data, self.level).map_err(|e| IndexError::Compression(e.to_string()))
            }
        }
    }

    pub(crate) fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => {
                decode_all(data).map_err(|e| IndexError::Compression(e.to_string()))
            }
        }
    }
}

/// Admission and storage settings for the document index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Status ranges, e.g. `"200-299 304 unknown"`. Blank means `200-299`.
    pub http_status: String,
    /// Extra allowed content types.
    pub allowed_types: Vec<String>,
    /// Start from the default allow-list. With this off and no
    /// `allowed_types`, every type is admitted.
    pub use_default_types: bool,
    /// Extra aliases, `canonical:alias1,alias2` entries.
    pub type_aliases: String,
    pub use_default_aliases: bool,
    /// Reject `/robots.txt` and `/favicon.ico`.
    pub robots: bool,
    pub required_fields: Vec<String>,
    pub max_text_length: usize,
    pub backend: BackendConfig,
    pub compression: CompressionConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            http_status: HttpStatusFilter::DEFAULT_RANGE.to_string(),
            allowed_types: Vec::new(),
            use_default_types: true,
            type_aliases: String::new(),
            use_default_aliases: true,
            robots: true,
            required_fields: vec![document::names::URL.to_string()],
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            backend: BackendConfig::default(),
            compression: CompressionConfig::default(),
        }
    }
}

impl IndexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http_status(mut self, spec: impl Into<String>) -> Self {
        self.http_status = spec.into();
        self
    }

    pub fn with_allowed_types<I, S>(mut self, types: I, use_defaults: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_types = types.into_iter().map(Into::into).collect();
        self.use_default_types = use_defaults;
        self
    }

    pub fn with_type_aliases(mut self, aliases: impl Into<String>, use_defaults: bool) -> Self {
        self.type_aliases = aliases.into();
        self.use_default_aliases = use_defaults;
        self
    }

    pub fn with_robots(mut self, robots: bool) -> Self {
        self.robots = robots;
        self
    }

    pub fn with_max_text_length(mut self, max: usize) -> Self {
        self.max_text_length = max;
        self
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    pub fn validate(&self) -> Result<(), IndexError> {
        HttpStatusFilter::parse(&self.http_status)?;
        if self.max_text_length == 0 {
            return Err(IndexError::InvalidConfig(
                "max_text_length must be greater than zero".into(),
            ));
        }
        if self.compression.codec == CompressionCodec::Zstd
            && !(1..=22).contains(&self.compression.level)
        {
            return Err(IndexError::InvalidConfig(format!(
                "zstd level {} outside 1-22",
                self.compression.level
            )));
        }
        if let BackendConfig::Redb { path } = &self.backend {
            if path.trim().is_empty() {
                return Err(IndexError::InvalidConfig("redb path must not be empty".into()));
            }
        }
        Ok(())
    }

    /// Normalizer with the default table (if enabled) overlaid by the
    /// configured aliases.
    pub fn type_normalizer(&self) -> TypeNormalizer {
        let base = if self.use_default_aliases {
            TypeNormalizer::with_defaults()
        } else {
            TypeNormalizer::new()
        };
        base.with_aliases(parse_aliases(&self.type_aliases))
    }

    /// Standard chain: required fields, type, robots, http status.
    pub fn filter_chain(&self, normalizer: Arc<TypeNormalizer>) -> Result<FilterChain, IndexError> {
        let mut allowed: Vec<String> = Vec::new();
        if self.use_default_types {
            allowed.extend(DEFAULT_ALLOWED_TYPES.iter().map(|t| t.to_string()));
        }
        allowed.extend(self.allowed_types.iter().cloned());

        let mut chain = FilterChain::new()
            .with_filter(
                "required_fields",
                RequiredFieldsFilter::new(self.required_fields.iter().cloned()),
            )
            .with_filter("type", TypeFilter::new(allowed, normalizer));
        if self.robots {
            chain.push("robots", RobotsFilter);
        }
        chain.push("http_status", HttpStatusFilter::parse(&self.http_status)?);
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use document::Document;

    #[test]
    fn defaults_validate_and_build_four_filters() {
        let config = IndexConfig::default();
        config.validate().unwrap();
        let chain = config
            .filter_chain(Arc::new(config.type_normalizer()))
            .unwrap();
        assert_eq!(
            chain.names().collect::<Vec<_>>(),
            ["required_fields", "type", "robots", "http_status"]
        );
    }

    #[test]
    fn bad_settings_rejected() {
        assert!(IndexConfig::default().with_http_status("2xx").validate().is_err());
        assert!(IndexConfig::default().with_max_text_length(0).validate().is_err());
        let zstd = CompressionConfig::default().with_level(40);
        assert!(IndexConfig::default().with_compression(zstd).validate().is_err());
        let redb = BackendConfig::redb(" ");
        assert!(IndexConfig::default().with_backend(redb).validate().is_err());
    }

    #[test]
    fn no_default_types_and_no_extras_admits_everything() {
        let config = IndexConfig::default().with_allowed_types(Vec::<String>::new(), false);
        let chain = config.filter_chain(Arc::new(config.type_normalizer())).unwrap();
        let mut doc = Document::new();
        doc.set("url", "http://example.com/a.png");
        doc.set("type", "image/png");
        assert!(chain.is_allowed(&doc));
    }

    #[test]
    fn extra_aliases_and_types_apply() {
        let config = IndexConfig::default()
            .with_type_aliases("application/rtf:text/rtf", true)
            .with_allowed_types(["application/rtf"], true);
        let normalizer = config.type_normalizer();
        assert_eq!(normalizer.normalize("text/rtf"), "application/rtf");
        assert_eq!(normalizer.normalize("application/x-pdf"), "application/pdf");
    }

    #[test]
    fn compression_roundtrip() {
        let data = b"repeated repeated repeated repeated".to_vec();
        for codec in [CompressionCodec::None, CompressionCodec::Zstd] {
            let config = CompressionConfig::default().with_codec(codec);
            let packed = config.compress(&data).unwrap();
            assert_eq!(config.decompress(&packed).unwrap(), data);
        }
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: IndexConfig =
            serde_json::from_str(r#"{"robots": false, "compression": {"codec": "none"}}"#).unwrap();
        assert!(!config.robots);
        assert_eq!(config.compression.codec, CompressionCodec::None);
        assert_eq!(config.compression.level, 3);
        assert_eq!(config.http_status, "200-299");
    }
}
