//! Ingest Layer
//!
//! This is where archive records become documents. We take the normalized
//! records coming out of an [`ArchiveReader`], decide what each one is worth,
//! run the parser where needed, and emit `(IdentityKey, Document)` pairs for
//! the merge stage.
//!
//! ## What we do here
//!
//! - **Classify** - HTTP responses and FTP data get parsed, revisits become
//!   metadata-only documents, everything else is skipped.
//! - **Protect the parser** - HTML and plain text bodies are cut to the
//!   configured thresholds before parsing. The digest is never affected.
//! - **Keep the grouping invariant** - a failed parse still produces one
//!   `status=error` document under the same key (unless disabled), so the
//!   merge stage sees one record per key per file.
//! - **Map text lines** - JSON documents and CDX lines for the merge stage.
//! - **Log everything** - structured `tracing` events per record and per file.
//!
//! ## Flow
//!
//! ```text
//! ArchiveReader ──► classify ──► Parse    ──► parser_view ──► Parser ──► Document
//!               │            ├─► Revisit  ──► Document(url, digest, date)
//!               │            └─► Skip
//!               └─► Invalid ──► Document(url, digest, status=error), or abort
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use archive::ArchiveReader;
//! use ingest::{ingest_archive, BasicParser, IngestConfig, IngestError};
//!
//! let config = IngestConfig::default();
//! let reader = ArchiveReader::open("crawl.warc.gz")?.with_size_limit(config.size_limit());
//! let stats = ingest_archive(reader, &BasicParser, &config, |key, doc| {
//!     println!("{key}\t{}", doc.to_json().unwrap_or_default());
//!     Ok::<(), IngestError>(())
//! })?;
//! println!("{} documents", stats.emitted());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
use std::time::Instant;

use archive::{ArchiveItem, ArchiveReader, ArchiveRecordProxy, InvalidRecord};
use document::{names, Document, IdentityKey};
use serde::Serialize;
use tracing::{debug, info, warn, Level};

mod classify;
mod config;
mod error;
mod lines;
mod parser;

pub use crate::classify::{classify, parser_view, Disposition, LimitClass};
pub use crate::config::{ConfigError, IngestConfig};
pub use crate::error::{IngestError, ParseError};
pub use crate::lines::{map_line, LineOutcome, CDX_FIELDS};
pub use crate::parser::{
    base_content_type, collapse_whitespace, sniff_content_type, BasicParser, ParseInput,
    ParseOutput, Parser,
};

/// Result of ingesting one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Parsed(IdentityKey, Document),
    Revisit(IdentityKey, Document),
    /// Parse failed; carries the error document when one is emitted.
    ParseFailed(Option<(IdentityKey, Document)>),
    Skipped(&'static str),
}

impl RecordOutcome {
    pub fn into_entry(self) -> Option<(IdentityKey, Document)> {
        match self {
            RecordOutcome::Parsed(key, doc) | RecordOutcome::Revisit(key, doc) => Some((key, doc)),
            RecordOutcome::ParseFailed(entry) => entry,
            RecordOutcome::Skipped(_) => None,
        }
    }
}

/// Counters for one archive file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub records: u64,
    pub parsed: u64,
    pub revisits: u64,
    pub skipped: u64,
    pub parse_errors: u64,
    /// Records of an unknown type, emitted as error documents.
    pub invalid: u64,
    /// Records whose parser input was cut to a threshold.
    pub truncated: u64,
    /// The file ended early on an archive error that was not propagated.
    pub abandoned: bool,
}

impl IngestStats {
    /// Documents emitted, error documents included.
    pub fn emitted(&self) -> u64 {
        self.parsed + self.revisits + self.parse_errors + self.invalid
    }
}

/// Classify one record and build its document.
pub fn ingest_record<P>(record: &ArchiveRecordProxy, parser: &P, config: &IngestConfig) -> RecordOutcome
where
    P: Parser + ?Sized,
{
    ingest_one(record, parser, config).0
}

/// Outcome plus whether the parser input was cut to a threshold.
fn ingest_one<P>(record: &ArchiveRecordProxy, parser: &P, config: &IngestConfig) -> (RecordOutcome, bool)
where
    P: Parser + ?Sized,
{
    match classify(record) {
        Disposition::Skip(reason) => {
            debug!(url = %record.url(), record_type = %record.record_type(), reason, "record_skipped");
            (RecordOutcome::Skipped(reason), false)
        }
        Disposition::Revisit => {
            let key = record_key(record);
            let mut doc = Document::new();
            doc.set(names::URL, record.url());
            doc.set(names::DIGEST, record.digest());
            doc.set(names::DATE, record.date());
            stamp_collection(&mut doc, config);
            debug!(url = %record.url(), digest = %record.digest(), "revisit_emitted");
            (RecordOutcome::Revisit(key, doc), false)
        }
        Disposition::Parse { content_type } => parse_record(record, content_type.as_deref(), parser, config),
    }
}

fn record_key(record: &ArchiveRecordProxy) -> IdentityKey {
    IdentityKey::new(record.url(), record.digest())
}

fn stamp_collection(doc: &mut Document, config: &IngestConfig) {
    if let Some(collection) = &config.collection {
        doc.set(names::COLLECTION, collection);
    }
}

fn parse_record<P>(
    record: &ArchiveRecordProxy,
    declared: Option<&str>,
    parser: &P,
    config: &IngestConfig,
) -> (RecordOutcome, bool)
where
    P: Parser + ?Sized,
{
    let key = record_key(record);
    let (body, cut) = parser_view(record.body(), record.length(), declared, config);
    let truncated = cut.is_some();
    if let Some(limit) = cut {
        warn!(url = %record.url(), limit, length = record.length(), "parse_input_truncated");
    }

    let input = ParseInput {
        url: record.url(),
        content_type: declared,
        body,
    };
    let output = match parser.parse(&input) {
        Ok(output) => output,
        Err(err) => {
            warn!(url = %record.url(), digest = %record.digest(), error = %err, "parse_failure");
            if !config.emit_parse_errors {
                return (RecordOutcome::ParseFailed(None), truncated);
            }
            let mut doc = Document::new();
            doc.set(names::URL, record.url());
            doc.set(names::DIGEST, record.digest());
            doc.set(names::STATUS, "error");
            doc.set(names::ERROR_MESSAGE, &format!("Failed to parse record: {err}"));
            return (RecordOutcome::ParseFailed(Some((key, doc))), truncated);
        }
    };

    let mut doc = Document::new();
    doc.set(names::URL, record.url());
    doc.set(names::DIGEST, record.digest());
    doc.set(names::DATE, record.date());
    doc.set(names::LENGTH, &record.length().to_string());
    if let Some(code) = record.http_status() {
        doc.set(names::CODE, code);
    }
    doc.set(names::TYPE, &output.content_type);
    doc.set(names::TITLE, &output.title);
    doc.set(names::CONTENT, &output.text);
    if config.boilerplate {
        if let Some(boiled) = boilerplate_text(record, declared, &output, truncated, parser) {
            doc.set(names::BOILED, &boiled);
        }
    }
    if let Some(keywords) = &output.keywords {
        doc.set(names::KEYWORDS, keywords);
    }
    if let Some(description) = &output.description {
        doc.set(names::DESCRIPTION, description);
    }
    stamp_collection(&mut doc, config);
    if config.emit_outlinks {
        for (url, text) in &output.links {
            doc.add_link(url, text);
        }
    }
    (RecordOutcome::Parsed(key, doc), truncated)
}

/// Boilerplate-stripped text over the whole retained body. When the parser
/// saw a threshold-cut view, the full body is parsed once more for it.
fn boilerplate_text<P>(
    record: &ArchiveRecordProxy,
    declared: Option<&str>,
    output: &ParseOutput,
    truncated: bool,
    parser: &P,
) -> Option<String>
where
    P: Parser + ?Sized,
{
    if !truncated {
        return output.boiled.clone();
    }
    let input = ParseInput {
        url: record.url(),
        content_type: declared,
        body: record.body(),
    };
    match parser.parse(&input) {
        Ok(full) => full.boiled,
        Err(err) => {
            debug!(url = %record.url(), error = %err, "boilerplate_reparse_failed");
            output.boiled.clone()
        }
    }
}

/// Error document standing in for a record of an unknown type.
fn invalid_document(invalid: &InvalidRecord, config: &IngestConfig) -> (IdentityKey, Document) {
    let mut doc = Document::new();
    doc.set(names::URL, &invalid.url);
    doc.set(names::DIGEST, &invalid.digest);
    doc.set(names::STATUS, "error");
    doc.set(names::ERROR_MESSAGE, &invalid.to_error().to_string());
    stamp_collection(&mut doc, config);
    (IdentityKey::new(&invalid.url, &invalid.digest), doc)
}

/// Ingest every record of one archive file, passing each emitted pair to
/// `emit`.
///
/// With `abort_on_archive_error` any archive error propagates. Without it a
/// record of an unknown type becomes a `status=error` document and reading
/// goes on, while a stream error ends the file early with a warning. Errors
/// returned by `emit` always propagate.
pub fn ingest_archive<P, F, E>(
    reader: ArchiveReader,
    parser: &P,
    config: &IngestConfig,
    mut emit: F,
) -> Result<IngestStats, E>
where
    P: Parser + ?Sized,
    F: FnMut(IdentityKey, Document) -> Result<(), E>,
    E: From<IngestError>,
{
    let start = Instant::now();
    let path = reader.name().to_string();
    let span = tracing::span!(
        Level::INFO,
        "ingest.archive",
        path = %path,
        format = reader.format().as_str()
    );
    let _guard = span.enter();
    info!("archive_start");

    let mut stats = IngestStats::default();
    for item in reader {
        let record = match item {
            Ok(ArchiveItem::Record(record)) => record,
            Ok(ArchiveItem::Skip(skip)) => {
                stats.records += 1;
                stats.skipped += 1;
                debug!(url = %skip.url, reason = %skip.reason, "record_skipped");
                continue;
            }
            Ok(ArchiveItem::Invalid(invalid)) => {
                stats.records += 1;
                warn!(
                    url = %invalid.url,
                    record_type = %invalid.record_type,
                    records = stats.records,
                    "invalid_record"
                );
                if config.abort_on_archive_error {
                    return Err(IngestError::archive(&path, invalid.to_error()).into());
                }
                stats.invalid += 1;
                let (key, doc) = invalid_document(&invalid, config);
                emit(key, doc)?;
                continue;
            }
            Err(err) => {
                warn!(error = %err, kind = err.kind(), records = stats.records, "archive_read_error");
                if config.abort_on_archive_error {
                    return Err(IngestError::archive(&path, err).into());
                }
                stats.abandoned = true;
                break;
            }
        };
        stats.records += 1;

        let (outcome, truncated) = ingest_one(&record, parser, config);
        match &outcome {
            RecordOutcome::Parsed(..) => stats.parsed += 1,
            RecordOutcome::Revisit(..) => stats.revisits += 1,
            RecordOutcome::ParseFailed(_) => stats.parse_errors += 1,
            RecordOutcome::Skipped(_) => stats.skipped += 1,
        }
        if truncated {
            stats.truncated += 1;
        }
        if let Some((key, doc)) = outcome.into_entry() {
            emit(key, doc)?;
        }
    }

    let elapsed_micros = start.elapsed().as_micros();
    info!(
        records = stats.records,
        parsed = stats.parsed,
        revisits = stats.revisits,
        skipped = stats.skipped,
        parse_errors = stats.parse_errors,
        invalid = stats.invalid,
        abandoned = stats.abandoned,
        elapsed_micros,
        "archive_finish"
    );
    Ok(stats)
}
