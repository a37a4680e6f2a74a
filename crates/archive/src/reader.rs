//! Archive file iteration.
//!
//! [`ArchiveReader`] owns one byte stream and yields an [`ArchiveItem`] per
//! archive record. The stream is read strictly forward; after the first error
//! the reader is fused and returns `None` forever, since the stream position
//! can no longer be trusted.
//!
//! ```text
//! file ──► gzip? ──► MultiGzDecoder ──► BufReader ──► arc::read_record           ──► ArchiveItem
//!                └──────────────────────┘          └► WarcReader ──► warc::read_record ─┘
//! ```
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ArchiveError;
use crate::limit::SizeLimit;
use crate::record::ArchiveItem;
use crate::{arc, warc};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Envelope lines longer than this are treated as corrupt framing.
const MAX_ENVELOPE_LINE: u64 = 64 * 1024;

/// Archive container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    Arc,
    Warc,
}

impl ArchiveFormat {
    /// Guess the format from a file name (`.arc`, `.arc.gz`, `.warc`, `.warc.gz`).
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        let stem = lower.strip_suffix(".gz").unwrap_or(&lower);
        if stem.ends_with(".warc") {
            Some(ArchiveFormat::Warc)
        } else if stem.ends_with(".arc") {
            Some(ArchiveFormat::Arc)
        } else {
            None
        }
    }

    /// Guess the format from the first decoded bytes.
    pub fn sniff(head: &[u8]) -> Option<Self> {
        if head.starts_with(b"WARC/") {
            Some(ArchiveFormat::Warc)
        } else if head.starts_with(b"filedesc:") {
            Some(ArchiveFormat::Arc)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveFormat::Arc => "arc",
            ArchiveFormat::Warc => "warc",
        }
    }
}

/// Decoded stream, framed per format.
enum Source {
    Arc {
        input: Box<dyn BufRead + Send>,
        at_start: bool,
    },
    Warc(warc::WarcRecords),
}

/// Forward-only iterator over the records of one archive file.
pub struct ArchiveReader {
    name: String,
    source: Source,
    format: ArchiveFormat,
    limit: SizeLimit,
    fused: bool,
    records: u64,
}

impl std::fmt::Debug for ArchiveReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveReader")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("limit", &self.limit)
            .field("records", &self.records)
            .field("fused", &self.fused)
            .finish()
    }
}

impl ArchiveReader {
    /// Open an archive file, detecting gzip and the container format.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::from_reader(path.to_string_lossy(), file)
    }

    /// Wrap an arbitrary byte stream. `name` is used for format detection
    /// (by extension) and for log fields.
    pub fn from_reader<R>(name: impl Into<String>, reader: R) -> Result<Self, ArchiveError>
    where
        R: Read + Send + 'static,
    {
        let name = name.into();
        let mut raw = BufReader::new(reader);
        let compressed = raw.fill_buf()?.starts_with(&GZIP_MAGIC);
        let mut input: Box<dyn BufRead + Send> = if compressed {
            Box::new(BufReader::new(MultiGzDecoder::new(raw)))
        } else {
            Box::new(raw)
        };

        let format = match ArchiveFormat::sniff(input.fill_buf()?) {
            Some(format) => format,
            None => ArchiveFormat::from_name(&name)
                .ok_or_else(|| ArchiveError::UnknownFormat(name.clone()))?,
        };
        debug!(archive = %name, format = format.as_str(), compressed, "archive_opened");

        let source = match format {
            ArchiveFormat::Arc => Source::Arc {
                input,
                at_start: true,
            },
            ArchiveFormat::Warc => Source::Warc(warc::records(input)),
        };
        Ok(Self {
            name,
            source,
            format,
            limit: SizeLimit::default(),
            fused: false,
            records: 0,
        })
    }

    /// Cap on retained body bytes per record.
    pub fn with_size_limit(mut self, limit: SizeLimit) -> Self {
        self.limit = limit;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    pub fn size_limit(&self) -> SizeLimit {
        self.limit
    }

    /// Records yielded so far, skips included.
    pub fn records_read(&self) -> u64 {
        self.records
    }

    fn read_next(&mut self) -> Result<Option<ArchiveItem>, ArchiveError> {
        match &mut self.source {
            Source::Arc { input, at_start } => arc::read_record(&mut **input, self.limit, at_start),
            Source::Warc(records) => match records.next() {
                None => Ok(None),
                Some(Ok(record)) => warc::read_record(record, self.limit).map(Some),
                Some(Err(err)) => Err(ArchiveError::framing(warc::FORMAT, err.to_string())),
            },
        }
    }
}

impl Iterator for ArchiveReader {
    type Item = Result<ArchiveItem, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        match self.read_next() {
            Ok(Some(item)) => {
                self.records += 1;
                Some(Ok(item))
            }
            Ok(None) => {
                self.fused = true;
                None
            }
            Err(err) => {
                self.fused = true;
                Some(Err(err))
            }
        }
    }
}

impl std::iter::FusedIterator for ArchiveReader {}

/// Read one line, without its line terminator. `None` at end of input.
pub(crate) fn read_line<R: BufRead + ?Sized>(input: &mut R) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    let n = Read::take(&mut *input, MAX_ENVELOPE_LINE).read_until(b'\n', &mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    if n as u64 == MAX_ENVELOPE_LINE && !buf.ends_with(b"\n") {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "archive envelope line too long",
        ));
    }
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Read the next line that is not blank. Records are separated by blank
/// lines in both formats.
pub(crate) fn next_envelope_line<R: BufRead + ?Sized>(
    input: &mut R,
) -> io::Result<Option<String>> {
    while let Some(line) = read_line(input)? {
        if !line.trim().is_empty() {
            return Ok(Some(line));
        }
    }
    Ok(None)
}
