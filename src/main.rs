//! Biathlon results CLI
//!
//! Reads a competition configuration and an event log, writes the audit log
//! and prints the final results table to stdout.

use anyhow::{Context, Result};
use biathlon::{parse_line, CompetitionConfig, Engine, EventSink, ReportRow, WriterSink};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Biathlon competition processor
#[derive(Parser, Debug)]
#[command(name = "biathlon")]
#[command(about = "Compute biathlon results from a race event log", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the JSON competition configuration
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Path to the incoming events
    #[arg(short, long, value_name = "FILE")]
    events: PathBuf,

    /// Output file for the audit log (discarded if omitted)
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Rendering of the results table
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all diagnostics except errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    let config = CompetitionConfig::load(&args.config)
        .with_context(|| format!("Failed to load config {:?}", args.config))?;
    log::debug!("Configuration loaded: {:?}", config);

    let audit: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Incorrect output log {:?}", path))?,
        )),
        None => Box::new(io::sink()),
    };

    let mut engine = Engine::builder()
        .with_config(config)
        .with_sink(WriterSink::new(audit))
        .build()
        .context("Invalid configuration")?;

    process_file(&mut engine, &args.events)?;
    engine.finalize().context("Failed to finalize competition")?;
    let rows = engine.report()?;

    print_report(&rows, args.format)?;
    Ok(())
}

/// Feed every line of the events file through the engine
fn process_file<L: EventSink>(engine: &mut Engine<L>, path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to load events {:?}", path))?;

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("Failed to read events at line {}", line_no))?;
        if line.trim().is_empty() {
            continue;
        }
        log::trace!("Parsed line: {}", line);

        let event = parse_line(&line)
            .with_context(|| format!("Failed to parse event at line {}: {}", line_no, line))?;
        engine
            .process_event(event)
            .with_context(|| format!("Failed to process event at line {}: {}", line_no, line))?;
    }
    Ok(())
}

fn print_report(rows: &[ReportRow], format: OutputFormat) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Table => {
            for row in rows {
                writeln!(out, "{}", row)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, rows)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
