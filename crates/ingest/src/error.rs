//! Error types produced by the ingest crate.
//!
//! Ingest separates failures by blast radius:
//!
//! | Error | Scope | Handling |
//! |-------|-------|----------|
//! | [`ParseError`] | one record | recoverable: becomes a `status=error` document, or is dropped |
//! | [`IngestError::Archive`] | one archive file | aborts the file; aborts the job when `abort_on_archive_error` is set |
//! | [`IngestError::Config`] | whole job | fatal at startup |
//!
//! # Examples
//!
//! ```rust
//! use ingest::{IngestError, ParseError};
//!
//! fn is_fatal(err: &IngestError) -> bool {
//!     !matches!(err, IngestError::Parse(_))
//! }
//!
//! assert!(!is_fatal(&IngestError::Parse(ParseError::Malformed("bad".into()))));
//! ```
use archive::ArchiveError;
use thiserror::Error;

use crate::config::ConfigError;

/// Failure of the [`Parser`](crate::Parser) collaborator for one record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// The parser has no support for this content type.
    #[error("unsupported content type {0}")]
    Unsupported(String),
    /// The payload could not be interpreted.
    #[error("malformed content: {0}")]
    Malformed(String),
}

/// Errors surfaced by archive ingestion.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IngestError {
    /// The archive stream is unusable past this point.
    #[error("error reading archive {path}: {source}")]
    Archive {
        path: String,
        #[source]
        source: ArchiveError,
    },
    #[error("invalid ingest configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),
}

impl IngestError {
    pub fn archive(path: &str, source: ArchiveError) -> Self {
        IngestError::Archive {
            path: path.to_string(),
            source,
        }
    }
}
