//! Command-line front end for shower-shape variable computation.
//!
//! Reads JSON Lines event files, computes the per-event variables and writes
//! one record per event as JSON Lines or long-form CSV.
#![allow(clippy::uninlined_format_args, clippy::cast_precision_loss)]

use clap::{Parser, Subcommand};

use showershape_algorithms::{process_batch_records, AnalysisConfig, EventAggregator};
use showershape_core::Event;
use showershape_io::{create_sink, read_layer_positions, EventReader, RecordSink};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    ShowershapeIo(#[from] showershape_io::Error),

    #[error("Analysis error: {0}")]
    Analysis(#[from] showershape_algorithms::Error),

    #[error("event {event} of run {run}: {source}")]
    Event {
        event: u64,
        run: u32,
        source: showershape_algorithms::Error,
    },
}

/// Shower-shape variables for hexagonal calorimeter test-beam events.
#[derive(Parser)]
#[command(name = "showershape")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute shower-shape variables for every event
    Process {
        /// Input event file(s) (JSON Lines)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Layer z-position file (`<layer> <z>` pairs)
        #[arg(short, long)]
        layer_positions: PathBuf,

        /// Output file path (`.csv` for long-form CSV, JSON Lines otherwise)
        #[arg(short, long)]
        output: PathBuf,

        /// Analysis configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the MIP threshold of the configuration
        #[arg(long)]
        mip_threshold: Option<f64>,

        /// Log and skip events that cannot be processed instead of aborting
        #[arg(long)]
        skip_invalid: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show information about an event file
    Info {
        /// Input event file
        input: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn load_config(path: Option<&Path>, mip_threshold: Option<f64>) -> Result<AnalysisConfig> {
    let mut config = match path {
        Some(path) => {
            log::info!("loading analysis configuration from {}", path.display());
            AnalysisConfig::from_file(path)?
        }
        None => AnalysisConfig::default(),
    };
    if let Some(threshold) = mip_threshold {
        let classifier = config.classifier.clone().with_mip_threshold(threshold);
        config = config.with_classifier(classifier);
    }
    Ok(config)
}

/// Reads all events of a file, dropping malformed lines when `skip_invalid` is set.
fn read_events(path: &Path, skip_invalid: bool) -> Result<Vec<Event>> {
    let reader = EventReader::open(path)?;
    let mut events = Vec::new();
    for event in reader.events() {
        match event {
            Ok(event) => events.push(event),
            Err(err) if skip_invalid => log::warn!("skipping malformed line: {err}"),
            Err(err) => return Err(err.into()),
        }
    }
    Ok(events)
}

/// Processes one input file into the sink; returns `(written, skipped)`.
fn process_file(
    path: &Path,
    aggregator: &EventAggregator,
    sink: &mut dyn RecordSink,
    skip_invalid: bool,
) -> Result<(usize, usize)> {
    let events = read_events(path, skip_invalid)?;
    log::debug!("{}: {} events", path.display(), events.len());

    let records = process_batch_records(aggregator, &events);
    let mut written = 0usize;
    let mut skipped = 0usize;
    for (event, record) in events.iter().zip(records) {
        match record {
            Ok(record) => {
                sink.write_record(&record)?;
                written += 1;
            }
            Err(source) => {
                let err = CliError::Event {
                    event: event.run.event,
                    run: event.run.run,
                    source,
                };
                if !skip_invalid {
                    return Err(err);
                }
                log::warn!("skipping {err}");
                skipped += 1;
            }
        }
    }
    Ok((written, skipped))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            layer_positions,
            output,
            config,
            mip_threshold,
            skip_invalid,
            verbose,
        } => {
            init_logging(verbose);

            let config = load_config(config.as_deref(), mip_threshold)?;
            log::debug!("analysis configuration: {config:?}");
            let positions = read_layer_positions(&layer_positions)?;
            let aggregator = EventAggregator::new(config, positions)?;

            let start = Instant::now();
            let mut sink = create_sink(&output)?;
            log::info!("writing output to {}", output.display());

            let mut total_written = 0usize;
            let mut total_skipped = 0usize;
            for path in &input {
                log::info!("reading {}", path.display());
                let (written, skipped) =
                    process_file(path, &aggregator, sink.as_mut(), skip_invalid)?;
                total_written += written;
                total_skipped += skipped;
            }
            sink.finish()?;

            let elapsed = start.elapsed();
            println!(
                "Processed {} files in {:.2}s",
                input.len(),
                elapsed.as_secs_f64()
            );
            println!("Events written: {}", total_written);
            if total_skipped > 0 {
                println!("Events skipped: {}", total_skipped);
            }
        }

        Commands::Info { input } => {
            init_logging(false);

            let reader = EventReader::open(&input)?;
            let file_size = reader.file_size();
            let events = reader.read_all()?;
            let hit_count: usize = events.iter().map(Event::len).sum();

            println!("File: {}", input.display());
            println!(
                "Size: {} bytes ({:.2} MB)",
                file_size,
                file_size as f64 / 1_000_000.0
            );
            println!("Events: {}", events.len());
            println!("Hits: {}", hit_count);

            let layers = events.iter().flat_map(|event| &event.hits).map(|hit| hit.layer);
            if let (Some(min_layer), Some(max_layer)) = (layers.clone().min(), layers.max()) {
                println!("Layer range: {} - {}", min_layer, max_layer);
            }

            let mut runs: Vec<u32> = events.iter().map(|event| event.run.run).collect();
            runs.sort_unstable();
            runs.dedup();
            if !runs.is_empty() {
                println!("Runs: {:?}", runs);
            }
        }
    }

    Ok(())
}
