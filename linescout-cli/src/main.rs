use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use linescout::{
    search_with_config, CliOverrides, EncodingMode, Occurrence, ScanStats, SearchConfig,
};
use std::io::{self, BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Literal text to search for
    query: String,

    /// Root directory to search in [default: .]
    #[arg(short = 'd', long)]
    root: Option<PathBuf>,

    /// Number of files scanned concurrently
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Completed files buffered before workers wait for output
    #[arg(long)]
    capacity: Option<NonZeroUsize>,

    /// How to handle invalid UTF-8 sequences (failfast|lossy)
    #[arg(long)]
    encoding: Option<EncodingMode>,

    /// Configuration file to load on top of the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print one JSON object per occurrence
    #[arg(long)]
    json: bool,

    /// Show only statistics, not matches
    #[arg(short, long)]
    stats: bool,

    /// Log level used when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            query: Some(self.query.clone()),
            root_path: self.root.clone(),
            thread_count: self.threads,
            channel_capacity: self.capacity,
            encoding_mode: self.encoding,
            log_level: self.log_level.clone(),
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = SearchConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let config = file_config.merge_with_cli(cli.overrides());

    init_logging(&config.log_level);
    if let Some(path) = &cli.config {
        info!("Loaded configuration from {}", path.display());
    }
    debug!("Effective configuration: {:?}", config);

    let mut stream = search_with_config(&config);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if cli.stats {
        stream.by_ref().for_each(drop);
    } else {
        // Flush per file so results show up as each scan completes
        while let Some(batch) = stream.next_batch() {
            for occurrence in &batch {
                print_occurrence(&mut out, occurrence, cli.json)?;
            }
            out.flush()?;
        }
    }

    if !cli.json {
        print_summary(&mut out, &stream.stats())?;
    }
    out.flush()?;
    Ok(())
}

fn print_occurrence(out: &mut impl Write, occurrence: &Occurrence, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(occurrence)?)?;
    } else {
        writeln!(
            out,
            "{}:{}:{}",
            occurrence.file.display().to_string().blue(),
            occurrence.line.to_string().green(),
            occurrence.offset
        )?;
    }
    Ok(())
}

fn print_summary(out: &mut impl Write, stats: &ScanStats) -> Result<()> {
    writeln!(
        out,
        "Found {} matches in {} files",
        stats.occurrences, stats.files_with_matches
    )?;
    if stats.files_failed > 0 {
        writeln!(out, "Skipped {} unreadable files", stats.files_failed)?;
    }
    Ok(())
}
