//! # arcdoc Index
//!
//! The last stage of the pipeline: merged documents go through admission
//! filters and end up in a sink. Two sinks ship with the crate:
//!
//! - [`JsonLinesSink`] writes `key<TAB>json` lines, unfiltered. This is the
//!   intermediate format between the parse and merge stages.
//! - [`DocumentIndex`] is an embedded index builder. It applies the
//!   [`FilterChain`], derives index fields with [`FieldHandler`]s, encodes
//!   the resulting [`IndexRecord`] with `bincode`, optionally compresses it
//!   with zstd, and stores it in an [`IndexBackend`].
//!
//! ## Pipeline
//!
//! ```text
//! Document ─► FilterChain ─► FieldHandlers ─► IndexRecord ─► bincode ─► zstd ─► IndexBackend
//!                  │
//!                  └─► Rejected { filter }
//! ```
//!
//! ## Backends
//!
//! | Backend | Feature | Use |
//! |---------|---------|-----|
//! | [`InMemoryBackend`] | always | tests, small runs |
//! | `RedbBackend` | `backend-redb` (default) | on-disk, ACID |
//!
//! ## Example
//!
//! ```
//! use document::Document;
//! use index::{DocumentIndex, DocumentSink, IndexConfig};
//!
//! let mut index = DocumentIndex::new(IndexConfig::default()).unwrap();
//! let mut doc = Document::new();
//! doc.set("url", "http://example.com/");
//! doc.set("digest", "sha1:AAAA");
//! doc.set("type", "text/html; charset=utf-8");
//! let key = doc.identity_key().unwrap();
//!
//! assert!(index.add(&key, &doc).unwrap().is_admitted());
//! let record = index.get(&key).unwrap().unwrap();
//! assert_eq!(record.get("type"), Some("text/html"));
//! ```
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use document::{Document, IdentityKey};
use tracing::{debug, info};

mod backend;
mod config;
mod error;
mod fields;
mod filter;
mod normalize;
mod sink;

#[cfg(feature = "backend-redb")]
pub use crate::backend::RedbBackend;
pub use crate::backend::{BackendConfig, InMemoryBackend, IndexBackend};
pub use crate::config::{CompressionCodec, CompressionConfig, IndexConfig};
pub use crate::error::IndexError;
pub use crate::fields::{
    default_handlers, truncate_text, BoostHandler, DateHandler, FieldHandler, IndexField,
    IndexMode, IndexRecord, SiteHandler, SimpleFieldHandler, TextHandler, TypeHandler,
    DEFAULT_MAX_TEXT_LENGTH, INDEX_SCHEMA_VERSION,
};
pub use crate::filter::{
    DocumentFilter, FilterChain, HttpStatusFilter, RequiredFieldsFilter, RobotsFilter,
    StatusRange, TypeFilter, DEFAULT_ALLOWED_TYPES,
};
pub use crate::normalize::{default_aliases, parse_aliases, TypeNormalizer};
pub use crate::sink::{split_keyed_line, DocumentSink, JsonLinesSink, SinkOutcome};

/// Embedded document index.
pub struct DocumentIndex {
    backend: Box<dyn IndexBackend>,
    cfg: IndexConfig,
    chain: FilterChain,
    handlers: Vec<Box<dyn FieldHandler>>,
    admitted: u64,
    rejected: u64,
}

impl DocumentIndex {
    /// Validate the configuration and build its backend.
    pub fn new(cfg: IndexConfig) -> Result<Self, IndexError> {
        cfg.validate()?;
        let backend = cfg.backend.build()?;
        Self::with_backend(cfg, backend)
    }

    /// Build an index over a caller-supplied backend.
    pub fn with_backend(cfg: IndexConfig, backend: Box<dyn IndexBackend>) -> Result<Self, IndexError> {
        let normalizer = Arc::new(cfg.type_normalizer());
        let chain = cfg.filter_chain(Arc::clone(&normalizer))?;
        let handlers = default_handlers(normalizer, cfg.max_text_length);
        Ok(Self {
            backend,
            cfg,
            chain,
            handlers,
            admitted: 0,
            rejected: 0,
        })
    }

    /// Replace the filter chain.
    pub fn with_filter_chain(mut self, chain: FilterChain) -> Self {
        self.chain = chain;
        self
    }

    /// Replace the field handlers.
    pub fn with_handlers(mut self, handlers: Vec<Box<dyn FieldHandler>>) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn config(&self) -> &IndexConfig {
        &self.cfg
    }

    pub fn filter_chain(&self) -> &FilterChain {
        &self.chain
    }

    /// Documents admitted and rejected so far.
    pub fn counts(&self) -> (u64, u64) {
        (self.admitted, self.rejected)
    }

    /// Derive the index record for a document without storing it.
    pub fn build_record(&self, key: &IdentityKey, document: &Document) -> IndexRecord {
        let mut record = IndexRecord::new(key.to_string());
        for handler in &self.handlers {
            handler.handle(&mut record, document);
        }
        record
    }

    pub fn get(&self, key: &IdentityKey) -> Result<Option<IndexRecord>, IndexError> {
        match self.backend.get(&key.to_string())? {
            Some(data) => Ok(Some(self.decode_record(&data)?)),
            None => Ok(None),
        }
    }

    pub fn delete(&self, key: &IdentityKey) -> Result<(), IndexError> {
        self.backend.delete(&key.to_string())
    }

    /// Visit every stored record in key order.
    pub fn scan(
        &self,
        visitor: &mut dyn FnMut(&IndexRecord) -> Result<(), IndexError>,
    ) -> Result<(), IndexError> {
        self.backend.scan(&mut |data: &[u8]| {
            let record = self.decode_record(data)?;
            visitor(&record)
        })
    }

    /// Filter, convert and store a batch in one backend write.
    pub fn add_batch<'a, I>(&mut self, documents: I) -> Result<Vec<SinkOutcome>, IndexError>
    where
        I: IntoIterator<Item = (&'a IdentityKey, &'a Document)>,
    {
        let mut entries = Vec::new();
        let mut outcomes = Vec::new();
        for (key, document) in documents {
            match self.admit(key, document) {
                SinkOutcome::Admitted => {
                    let record = self.build_record(key, document);
                    entries.push((record.key.clone(), self.encode_record(&record)?));
                    outcomes.push(SinkOutcome::Admitted);
                }
                rejected => outcomes.push(rejected),
            }
        }
        self.backend.batch_put(entries)?;
        Ok(outcomes)
    }

    fn admit(&mut self, key: &IdentityKey, document: &Document) -> SinkOutcome {
        match self.chain.rejected_by(document) {
            Some(filter) => {
                self.rejected += 1;
                debug!(key = %key, filter, "document_rejected");
                SinkOutcome::Rejected {
                    filter: filter.to_string(),
                }
            }
            None => {
                self.admitted += 1;
                SinkOutcome::Admitted
            }
        }
    }

    pub(crate) fn decode_record(&self, data: &[u8]) -> Result<IndexRecord, IndexError> {
        let decompressed = self.cfg.compression.decompress(data)?;
        let (record, _) = decode_from_slice(&decompressed, standard())?;
        Ok(record)
    }

    fn encode_record(&self, record: &IndexRecord) -> Result<Vec<u8>, IndexError> {
        let encoded = encode_to_vec(record, standard())?;
        self.cfg.compression.compress(&encoded)
    }
}

impl DocumentSink for DocumentIndex {
    fn add(&mut self, key: &IdentityKey, document: &Document) -> Result<SinkOutcome, IndexError> {
        let outcome = self.admit(key, document);
        if outcome.is_admitted() {
            let record = self.build_record(key, document);
            let payload = self.encode_record(&record)?;
            self.backend.put(&record.key, &payload)?;
        }
        Ok(outcome)
    }

    fn flush(&mut self) -> Result<(), IndexError> {
        let start = Instant::now();
        self.backend.flush()?;
        info!(
            admitted = self.admitted,
            rejected = self.rejected,
            elapsed_micros = start.elapsed().as_micros(),
            "index_flush"
        );
        Ok(())
    }
}

impl fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("cfg", &self.cfg)
            .field("chain", &self.chain)
            .field("handlers", &self.handlers.len())
            .field("admitted", &self.admitted)
            .field("rejected", &self.rejected)
            .finish()
    }
}
