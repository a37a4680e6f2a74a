//! Workspace umbrella crate for arcdoc.
//!
//! arcdoc turns web-archive files into merged, filtered documents. The
//! stages run independently and hand data to each other as `key<TAB>json`
//! text lines, so each stage can run in its own process:
//!
//! ```text
//! ARC/WARC ──► parse_archive_file ──► key\tjson lines ─┐
//!                                          CDX lines ──┴─► merge_lines ──► LocalShuffle
//!                                                                              │
//!                                   DocumentIndex / JsonLinesSink ◄── index_documents
//! ```
//!
//! Parsing is per file and needs nothing from other files. Merging needs
//! every partial document of one identity key in the same accumulator;
//! [`LocalShuffle`] provides that inside one process.
//!
//! # Example
//!
//! ```no_run
//! use arcdoc::{
//!     index_documents, parse_archive_file, BasicParser, DocumentIndex, IndexConfig,
//!     IngestConfig, LocalShuffle, MergeConfig,
//! };
//!
//! let mut shuffle = LocalShuffle::new(MergeConfig::default());
//! parse_archive_file("crawl.warc.gz", &BasicParser, &IngestConfig::default(), &mut shuffle)?;
//!
//! let mut index = DocumentIndex::new(IndexConfig::default())?;
//! let stats = index_documents(shuffle, &mut index)?;
//! println!("{} admitted, {} rejected", stats.admitted, stats.rejected);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
mod shuffle;

pub use archive::{
    dump_records, ArchiveError, ArchiveFormat, ArchiveItem, ArchiveReader, ArchiveRecordProxy,
    RecordType, SizeLimit,
};
pub use document::{names, Document, DocumentError, IdentityKey, Link, MergeConfig};
pub use index::{
    split_keyed_line, BackendConfig, DocumentIndex, DocumentSink, IndexConfig, IndexError,
    JsonLinesSink, SinkOutcome,
};
pub use ingest::{
    ingest_archive, ingest_record, map_line, BasicParser, IngestConfig, IngestError, IngestStats,
    LineOutcome, ParseError, Parser, RecordOutcome,
};

pub use crate::config::{ConfigLoadError, PipelineConfig};
pub use crate::shuffle::LocalShuffle;

use std::error::Error;
use std::fmt;
use std::io::BufRead;
use std::ops::AddAssign;
use std::path::Path;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

/// Errors that stop a pipeline stage.
#[derive(Debug)]
pub enum PipelineError {
    Ingest(IngestError),
    Index(IndexError),
    Io(std::io::Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Ingest(err) => write!(f, "ingest failure: {err}"),
            PipelineError::Index(err) => write!(f, "index failure: {err}"),
            PipelineError::Io(err) => write!(f, "i/o failure: {err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Ingest(err) => Some(err),
            PipelineError::Index(err) => Some(err),
            PipelineError::Io(err) => Some(err),
        }
    }
}

impl From<IngestError> for PipelineError {
    fn from(value: IngestError) -> Self {
        PipelineError::Ingest(value)
    }
}

impl From<IndexError> for PipelineError {
    fn from(value: IndexError) -> Self {
        PipelineError::Index(value)
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(value: std::io::Error) -> Self {
        PipelineError::Io(value)
    }
}

/// Line counters for one merge run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub lines: u64,
    pub mapped: u64,
    /// Blank, comment and `dns:` lines.
    pub ignored: u64,
    pub malformed: u64,
}

impl AddAssign for MergeStats {
    fn add_assign(&mut self, other: Self) {
        self.lines += other.lines;
        self.mapped += other.mapped;
        self.ignored += other.ignored;
        self.malformed += other.malformed;
    }
}

/// Outcome counters for one index run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub admitted: u64,
    pub rejected: u64,
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_parse(&self, latency: Duration, result: Result<&IngestStats, &PipelineError>);
    fn record_merge(&self, latency: Duration, result: Result<&MergeStats, &PipelineError>);
    fn record_index(&self, latency: Duration, result: Result<&IndexStats, &PipelineError>);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    fn record_parse(self, result: Result<&IngestStats, &PipelineError>) {
        self.recorder.record_parse(self.start.elapsed(), result);
    }

    fn record_merge(self, result: Result<&MergeStats, &PipelineError>) {
        self.recorder.record_merge(self.start.elapsed(), result);
    }

    fn record_index(self, result: Result<&IndexStats, &PipelineError>) {
        self.recorder.record_index(self.start.elapsed(), result);
    }
}

/// Read one archive file and pass every emitted document to `sink`.
///
/// Fails on invalid configuration, on an unreadable file, on archive
/// errors when `abort_on_archive_error` is set, and on sink errors.
pub fn parse_archive_file<P, S>(
    path: impl AsRef<Path>,
    parser: &P,
    config: &IngestConfig,
    sink: &mut S,
) -> Result<IngestStats, PipelineError>
where
    P: Parser + ?Sized,
    S: DocumentSink + ?Sized,
{
    let span = MetricsSpan::start();
    let result = read_archive(path.as_ref(), parser, config, sink);
    if let Some(span) = span {
        span.record_parse(result.as_ref());
    }
    result
}

fn read_archive<P, S>(
    path: &Path,
    parser: &P,
    config: &IngestConfig,
    sink: &mut S,
) -> Result<IngestStats, PipelineError>
where
    P: Parser + ?Sized,
    S: DocumentSink + ?Sized,
{
    config.validate().map_err(IngestError::from)?;
    let name = path.display().to_string();
    let reader = ArchiveReader::open(path)
        .map_err(|err| IngestError::archive(&name, err))?
        .with_size_limit(config.size_limit());
    let stats = ingest_archive(reader, parser, config, |key, doc| {
        sink.add(&key, &doc)?;
        Ok::<(), PipelineError>(())
    })?;
    sink.flush()?;
    Ok(stats)
}

/// Feed text lines into `shuffle`.
///
/// Accepts `key<TAB>json` lines written by [`JsonLinesSink`], bare JSON
/// documents, and CDX lines. Unusable lines are logged and counted.
pub fn merge_lines<I, S>(lines: I, shuffle: &mut LocalShuffle) -> MergeStats
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let span = MetricsSpan::start();
    let mut stats = MergeStats::default();
    for line in lines {
        merge_line(line.as_ref(), shuffle, &mut stats);
    }
    if let Some(span) = span {
        span.record_merge(Ok(&stats));
    }
    stats
}

/// [`merge_lines`] over a buffered reader.
pub fn merge_reader<R: BufRead>(
    reader: R,
    shuffle: &mut LocalShuffle,
) -> Result<MergeStats, PipelineError> {
    let span = MetricsSpan::start();
    let result = read_lines(reader, shuffle);
    if let Some(span) = span {
        span.record_merge(result.as_ref());
    }
    result
}

fn read_lines<R: BufRead>(reader: R, shuffle: &mut LocalShuffle) -> Result<MergeStats, PipelineError> {
    let mut stats = MergeStats::default();
    for line in reader.lines() {
        merge_line(&line?, shuffle, &mut stats);
    }
    Ok(stats)
}

fn merge_line(line: &str, shuffle: &mut LocalShuffle, stats: &mut MergeStats) {
    stats.lines += 1;
    match map_keyed_line(line) {
        LineOutcome::Mapped(key, doc) => {
            stats.mapped += 1;
            shuffle.push(key, doc);
        }
        LineOutcome::Ignored => stats.ignored += 1,
        LineOutcome::Malformed(_) => stats.malformed += 1,
    }
}

fn map_keyed_line(line: &str) -> LineOutcome {
    let Some((key, json)) = split_keyed_line(line) else {
        return map_line(line);
    };
    if !json.trim_start().starts_with('{') {
        return map_line(line);
    }
    let parsed = IdentityKey::parse(key).and_then(|key| Ok((key, Document::from_json(json)?)));
    match parsed {
        Ok((key, doc)) => LineOutcome::Mapped(key, doc),
        Err(err) => {
            warn!(error = %err, key, "keyed_line_skipped");
            LineOutcome::Malformed(err.to_string())
        }
    }
}

/// Drain every merged document of `shuffle` into `sink`.
pub fn index_documents<S>(shuffle: LocalShuffle, sink: &mut S) -> Result<IndexStats, PipelineError>
where
    S: DocumentSink + ?Sized,
{
    let span = MetricsSpan::start();
    let start = Instant::now();
    let result = drain_into(shuffle, sink);
    if let Ok(stats) = &result {
        info!(
            admitted = stats.admitted,
            rejected = stats.rejected,
            elapsed_micros = start.elapsed().as_micros(),
            "index_finish"
        );
    }
    if let Some(span) = span {
        span.record_index(result.as_ref());
    }
    result
}

fn drain_into<S>(shuffle: LocalShuffle, sink: &mut S) -> Result<IndexStats, PipelineError>
where
    S: DocumentSink + ?Sized,
{
    let mut stats = IndexStats::default();
    for (key, doc) in shuffle.into_documents() {
        match sink.add(&key, &doc)? {
            SinkOutcome::Admitted => stats.admitted += 1,
            SinkOutcome::Rejected { .. } => stats.rejected += 1,
        }
    }
    sink.flush()?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static METRICS_TEST_LOCK: Mutex<()> = Mutex::new(());

    // Stage calls report to the global recorder, so tests that make them
    // must not overlap with the recorder test.
    fn serial() -> MutexGuard<'static, ()> {
        METRICS_TEST_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[derive(Default)]
    struct CountingMetrics {
        parse: AtomicUsize,
        merge: AtomicUsize,
        index: AtomicUsize,
        failures: AtomicUsize,
    }

    impl CountingMetrics {
        fn failed<T>(&self, result: Result<T, &PipelineError>) {
            if result.is_err() {
                self.failures.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    impl PipelineMetrics for CountingMetrics {
        fn record_parse(&self, _: Duration, result: Result<&IngestStats, &PipelineError>) {
            self.parse.fetch_add(1, Ordering::SeqCst);
            self.failed(result);
        }

        fn record_merge(&self, _: Duration, result: Result<&MergeStats, &PipelineError>) {
            self.merge.fetch_add(1, Ordering::SeqCst);
            self.failed(result);
        }

        fn record_index(&self, _: Duration, result: Result<&IndexStats, &PipelineError>) {
            self.index.fetch_add(1, Ordering::SeqCst);
            self.failed(result);
        }
    }

    fn keyed(url: &str, digest: &str, date: &str) -> String {
        let mut doc = Document::new();
        doc.set("url", url);
        doc.set("digest", digest);
        doc.set("date", date);
        format!("{url} {digest}\t{}", doc.to_json().unwrap())
    }

    #[test]
    fn merge_lines_accepts_all_line_kinds() {
        let _guard = serial();
        let cdx = "http://example.com/ 20100501120000 http://example.com/ text/html 200 \
                   AAAABBBBCCCCDDDDEEEEFFFFGGGGHHHH - - 1234 crawl.arc.gz";
        let json = r#"{"url":"http://example.com/","digest":"sha1:AAAABBBBCCCCDDDDEEEEFFFFGGGGHHHH","title":"Example"}"#;
        let lines = [
            keyed("http://example.com/", "sha1:AAAABBBBCCCCDDDDEEEEFFFFGGGGHHHH", "20090101000000"),
            json.to_string(),
            cdx.to_string(),
            "# comment".to_string(),
            "dns:example.com 20100501120000 x x x x x x x".to_string(),
            "too few fields".to_string(),
        ];

        let mut shuffle = LocalShuffle::new(MergeConfig::default());
        let stats = merge_lines(&lines, &mut shuffle);
        assert_eq!(
            stats,
            MergeStats {
                lines: 6,
                mapped: 3,
                ignored: 2,
                malformed: 1
            }
        );
        assert_eq!(shuffle.len(), 1);

        let (_, doc) = shuffle.into_documents().next().unwrap();
        assert_eq!(doc.get("title"), "Example");
        assert_eq!(doc.get_all("date").len(), 2);
    }

    #[test]
    fn bad_keyed_line_is_malformed() {
        let _guard = serial();
        let mut shuffle = LocalShuffle::new(MergeConfig::default());
        let stats = merge_lines(["no-space-key\t{\"url\":\"u\"}"], &mut shuffle);
        assert_eq!(stats.malformed, 1);
        assert!(shuffle.is_empty());
    }

    #[test]
    fn merge_reader_reads_lines() {
        let _guard = serial();
        let input = format!(
            "{}\n{}\n",
            keyed("http://a/", "sha1:A", "20100101000000"),
            keyed("http://a/", "sha1:A", "20110101000000")
        );
        let mut shuffle = LocalShuffle::new(MergeConfig::default());
        let stats = merge_reader(input.as_bytes(), &mut shuffle).unwrap();
        assert_eq!(stats.mapped, 2);
        assert_eq!(shuffle.len(), 1);
        assert_eq!(shuffle.values(), 2);
    }

    #[test]
    fn index_documents_counts_admitted_and_rejected() {
        let _guard = serial();
        let mut shuffle = LocalShuffle::new(MergeConfig::default());
        let mut page = Document::new();
        page.set("url", "http://example.com/");
        page.set("digest", "sha1:A");
        page.set("type", "text/html");
        page.set("code", "200");
        shuffle.push(page.identity_key().unwrap(), page);

        let mut robots = Document::new();
        robots.set("url", "http://example.com/robots.txt");
        robots.set("digest", "sha1:B");
        robots.set("type", "text/plain");
        robots.set("code", "200");
        shuffle.push(robots.identity_key().unwrap(), robots);

        let mut index = DocumentIndex::new(IndexConfig::default()).unwrap();
        let stats = index_documents(shuffle, &mut index).unwrap();
        assert_eq!(
            stats,
            IndexStats {
                admitted: 1,
                rejected: 1
            }
        );
    }

    #[test]
    fn missing_archive_is_ingest_error() {
        let _guard = serial();
        let mut sink: Vec<(IdentityKey, Document)> = Vec::new();
        let err = parse_archive_file(
            "/nonexistent/crawl.warc.gz",
            &BasicParser,
            &IngestConfig::default(),
            &mut sink,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Ingest(IngestError::Archive { .. })));
        assert!(err.source().is_some());
    }

    #[test]
    fn pipeline_metrics_receive_stage_events() {
        let _guard = serial();
        let metrics = Arc::new(CountingMetrics::default());
        set_pipeline_metrics(Some(metrics.clone()));

        let mut sink: Vec<(IdentityKey, Document)> = Vec::new();
        let _ = parse_archive_file("/nonexistent.arc", &BasicParser, &IngestConfig::default(), &mut sink);
        let mut shuffle = LocalShuffle::new(MergeConfig::default());
        merge_lines([keyed("http://a/", "sha1:A", "20100101000000")], &mut shuffle);
        index_documents(shuffle, &mut sink).unwrap();

        set_pipeline_metrics(None);

        assert_eq!(metrics.parse.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.merge.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.index.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.failures.load(Ordering::SeqCst), 1);
    }
}
