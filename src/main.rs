//! `arcdoc` command line.
//!
//! Each subcommand is one pipeline stage. Data goes to stdout (or
//! `--output`); logs go to stderr.
//!
//! ```text
//! arcdoc parse crawl-*.warc.gz > docs.tsv
//! arcdoc merge docs.tsv extra.cdx > merged.tsv
//! arcdoc --config arcdoc.yaml index merged.tsv
//! arcdoc dump crawl-00.arc.gz
//! ```
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use arcdoc::{
    dump_records, index_documents, merge_reader, parse_archive_file, ArchiveReader, BasicParser,
    DocumentIndex, JsonLinesSink, LocalShuffle, MergeStats, PipelineConfig,
};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "arcdoc", version, about = "Web-archive document pipeline")]
struct Cli {
    /// Pipeline configuration file (YAML). Defaults apply without one.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse ARC/WARC files into `key<TAB>json` document lines.
    Parse {
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(required = true)]
        archives: Vec<PathBuf>,
    },
    /// Merge document and CDX lines by identity key. Reads stdin without inputs.
    Merge {
        #[arg(short, long)]
        output: Option<PathBuf>,
        inputs: Vec<PathBuf>,
    },
    /// Merge, filter and store documents in the configured index.
    Index { inputs: Vec<PathBuf> },
    /// Print one summary line per archive record.
    Dump { archive: PathBuf },
}

fn main() {
    let Err(error) = run() else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(error = %format!("{error:#}"), "arcdoc_failed");
    } else {
        eprintln!("Error: {error:#}");
    }
    process::exit(1);
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    init_tracing(&config.log_level, cli.json_logs);

    match cli.command {
        Command::Parse { output, archives } => parse(&config, output.as_deref(), &archives),
        Command::Merge { output, inputs } => merge(&config, output.as_deref(), &inputs),
        Command::Index { inputs } => index(&config, &inputs),
        Command::Dump { archive } => dump(&config, &archive),
    }
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn parse(config: &PipelineConfig, output: Option<&Path>, archives: &[PathBuf]) -> anyhow::Result<()> {
    let parser = BasicParser::new();
    let mut sink = JsonLinesSink::new(open_output(output)?);
    for archive in archives {
        let stats = parse_archive_file(archive, &parser, &config.ingest, &mut sink)
            .with_context(|| format!("failed to parse {}", archive.display()))?;
        info!(
            path = %archive.display(),
            emitted = stats.emitted(),
            abandoned = stats.abandoned,
            "archive_done"
        );
    }
    info!(documents = sink.written(), "parse_done");
    Ok(())
}

fn merge(config: &PipelineConfig, output: Option<&Path>, inputs: &[PathBuf]) -> anyhow::Result<()> {
    let mut shuffle = LocalShuffle::new(config.merge.clone());
    let lines = read_inputs(inputs, &mut shuffle)?;
    let mut sink = JsonLinesSink::new(open_output(output)?);
    index_documents(shuffle, &mut sink).context("failed to write merged documents")?;
    info!(
        lines = lines.lines,
        malformed = lines.malformed,
        documents = sink.written(),
        "merge_done"
    );
    Ok(())
}

fn index(config: &PipelineConfig, inputs: &[PathBuf]) -> anyhow::Result<()> {
    let mut shuffle = LocalShuffle::new(config.merge.clone());
    read_inputs(inputs, &mut shuffle)?;
    let mut index = DocumentIndex::new(config.index.clone()).context("failed to open index")?;
    let stats = index_documents(shuffle, &mut index).context("failed to index documents")?;
    println!("{}", serde_json::to_string(&stats)?);
    Ok(())
}

fn dump(config: &PipelineConfig, archive: &Path) -> anyhow::Result<()> {
    let reader = ArchiveReader::open(archive)
        .with_context(|| format!("failed to open {}", archive.display()))?
        .with_size_limit(config.ingest.size_limit());
    let mut out = BufWriter::new(io::stdout().lock());
    let records = dump_records(reader, &mut out)
        .with_context(|| format!("failed to read {}", archive.display()))?;
    out.flush()?;
    info!(records, "dump_done");
    Ok(())
}

fn read_inputs(inputs: &[PathBuf], shuffle: &mut LocalShuffle) -> anyhow::Result<MergeStats> {
    if inputs.is_empty() {
        return Ok(merge_reader(io::stdin().lock(), shuffle)?);
    }
    let mut total = MergeStats::default();
    for input in inputs {
        let file = File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
        total += merge_reader(BufReader::new(file), shuffle)
            .with_context(|| format!("failed to read {}", input.display()))?;
    }
    Ok(total)
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}
