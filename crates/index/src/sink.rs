//! Document sinks: where admitted documents end up.
use std::io::Write;

use document::{Document, IdentityKey};
use tracing::debug;

use crate::error::IndexError;

/// What a sink did with one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    Admitted,
    /// Rejected by the named filter.
    Rejected { filter: String },
}

impl SinkOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, SinkOutcome::Admitted)
    }
}

/// Consumer of keyed documents.
pub trait DocumentSink {
    fn add(&mut self, key: &IdentityKey, document: &Document) -> Result<SinkOutcome, IndexError>;

    fn flush(&mut self) -> Result<(), IndexError> {
        Ok(())
    }
}

impl<S: DocumentSink + ?Sized> DocumentSink for &mut S {
    fn add(&mut self, key: &IdentityKey, document: &Document) -> Result<SinkOutcome, IndexError> {
        (**self).add(key, document)
    }

    fn flush(&mut self) -> Result<(), IndexError> {
        (**self).flush()
    }
}

impl<S: DocumentSink + ?Sized> DocumentSink for Box<S> {
    fn add(&mut self, key: &IdentityKey, document: &Document) -> Result<SinkOutcome, IndexError> {
        (**self).add(key, document)
    }

    fn flush(&mut self) -> Result<(), IndexError> {
        (**self).flush()
    }
}

/// Collects every document in memory.
impl DocumentSink for Vec<(IdentityKey, Document)> {
    fn add(&mut self, key: &IdentityKey, document: &Document) -> Result<SinkOutcome, IndexError> {
        self.push((key.clone(), document.clone()));
        Ok(SinkOutcome::Admitted)
    }
}

/// Writes `key<TAB>json` lines, the intermediate format read back by the
/// merge stage. Nothing is filtered.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DocumentSink for JsonLinesSink<W> {
    fn add(&mut self, key: &IdentityKey, document: &Document) -> Result<SinkOutcome, IndexError> {
        let json = document.to_json()?;
        writeln!(self.writer, "{key}\t{json}")?;
        self.written += 1;
        Ok(SinkOutcome::Admitted)
    }

    fn flush(&mut self) -> Result<(), IndexError> {
        self.writer.flush()?;
        debug!(written = self.written, "json_lines_flushed");
        Ok(())
    }
}

/// Split a `key<TAB>json` line.
pub fn split_keyed_line(line: &str) -> Option<(&str, &str)> {
    line.split_once('\t')
}
