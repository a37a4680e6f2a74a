//! Error types produced while reading archive files.
//!
//! | Error | Scope | Recoverable |
//! |-------|-------|-------------|
//! | [`Io`](ArchiveError::Io) | file | no |
//! | [`UnknownFormat`](ArchiveError::UnknownFormat) | file | no |
//! | [`Framing`](ArchiveError::Framing) | file | no |
//! | [`LengthMismatch`](ArchiveError::LengthMismatch) | record, but desynchronizes the stream | no |
//! | [`UnknownRecordType`](ArchiveError::UnknownRecordType) | record | yes |
//!
//! The first four cannot be skipped past inside one file: the stream
//! position is no longer trustworthy, so [`ArchiveReader`](crate::ArchiveReader)
//! stops yielding records after them. A record of an unknown type is read to
//! its end and comes back as [`ArchiveItem::Invalid`](crate::ArchiveItem::Invalid);
//! [`InvalidRecord::to_error`](crate::InvalidRecord::to_error) turns it into
//! this error when the caller wants to fail. Whether any error aborts the
//! whole job is the caller's decision.
use thiserror::Error;

/// Errors raised by the archive reader.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArchiveError {
    /// Underlying stream failure (including corrupt gzip members).
    #[error("i/o error reading archive: {0}")]
    Io(#[from] std::io::Error),

    /// The input is neither an ARC nor a WARC file.
    #[error("unrecognized archive format: {0}")]
    UnknownFormat(String),

    /// A record envelope could not be parsed.
    #[error("malformed {format} record framing: {detail}")]
    Framing {
        format: &'static str,
        detail: String,
    },

    /// The envelope parsed but names a record type this reader does not know.
    #[error("unknown {format} record type `{record_type}` for {url}")]
    UnknownRecordType {
        format: &'static str,
        record_type: String,
        url: String,
    },

    /// Fewer bytes were available than the record header declared.
    #[error("incorrect number of bytes read for {url}: expected {expected}, read {actual}")]
    LengthMismatch {
        url: String,
        expected: u64,
        actual: u64,
    },
}

impl ArchiveError {
    pub(crate) fn framing(format: &'static str, detail: impl Into<String>) -> Self {
        ArchiveError::Framing {
            format,
            detail: detail.into(),
        }
    }

    /// Short, stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ArchiveError::Io(_) => "io",
            ArchiveError::UnknownFormat(_) => "unknown_format",
            ArchiveError::Framing { .. } => "framing",
            ArchiveError::UnknownRecordType { .. } => "unknown_record_type",
            ArchiveError::LengthMismatch { .. } => "length_mismatch",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_mismatch_message_names_counts() {
        let err = ArchiveError::LengthMismatch {
            url: "http://example.com/".into(),
            expected: 10,
            actual: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("expected 10"));
        assert!(msg.contains("read 7"));
        assert_eq!(err.kind(), "length_mismatch");
    }
}
