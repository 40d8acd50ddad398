//! `batch-mean-qbot <BATCH_DIR> <OUTPUT> <WORKERS>`
//!
//! Appends the time-weighted mean bottom flux of every run in a batch
//! directory to its `trials.csv` and writes the result to `OUTPUT`.

use anyhow::{Context, Result};
use clap::Parser;
use richards_batch::{Aggregator, PipelineConfig};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Batch directory with `<i>_qbot`, `<i>_t` and `trials.csv`
    #[arg(value_name = "BATCH_DIR")]
    batch_dir: PathBuf,

    /// Output table (`.parquet` for Parquet, CSV otherwise)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Number of worker threads
    #[arg(value_name = "WORKERS")]
    workers: NonZeroUsize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = PipelineConfig::new(&args.batch_dir, &args.output, args.workers);
    let aggregator = Aggregator::new(config);

    let catalog = aggregator
        .discover()
        .with_context(|| format!("discovering runs in {}", args.batch_dir.display()))?;
    let trials = aggregator
        .load_trials(&catalog)
        .with_context(|| format!("loading {}", aggregator.config().trials_path().display()))?;
    let means = aggregator
        .compute_means(&catalog)
        .context("integrating run fluxes")?;
    let merged = aggregator
        .merge(&trials, &means)
        .context("merging results into trial table")?;
    aggregator
        .write(&merged)
        .with_context(|| format!("writing {}", args.output.display()))?;

    tracing::info!(runs = means.len(), "batch complete");
    Ok(())
}
