//! Batch aggregation pipeline
//!
//! ```text
//! RunCatalog ──> WorkerPool ──(RunLoader → QuadratureEngine) × N──> [(index, mean)]
//!                                                                        │
//! TrialTable ─────────────── sort by index, join by index ───────────────┴──> output
//! ```

use crate::catalog::{RunCatalog, RunIndex};
use crate::config::PipelineConfig;
use crate::loader::RunLoader;
use crate::pool::WorkerPool;
use crate::quadrature::QuadratureEngine;
use crate::table::{write_table, TrialTable};
use crate::{Error, Result};
use arrow::record_batch::RecordBatch;
use std::path::PathBuf;
use tracing::{debug, info, info_span};

/// Outcome of a completed batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    /// Number of runs integrated
    pub runs: usize,
    /// Mean flux per run, ascending run index
    pub means: Vec<(RunIndex, f64)>,
    /// Where the augmented table was written
    pub output: PathBuf,
}

/// Aggregates one batch directory into an augmented trial table
#[derive(Debug)]
pub struct Aggregator {
    config: PipelineConfig,
    pool: WorkerPool,
}

impl Aggregator {
    /// Create an aggregator for `config`
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let pool = WorkerPool::new(config.workers());
        Self { config, pool }
    }

    /// Pipeline configuration
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Discover the runs of the batch.
    ///
    /// # Errors
    /// Returns `EmptyBatch` if no signal file is found, or the catalog error.
    pub fn discover(&self) -> Result<RunCatalog> {
        let catalog = RunCatalog::discover(self.config.batch_dir(), self.config.signal_kind())?;
        if catalog.is_empty() {
            return Err(Error::EmptyBatch {
                path: self.config.batch_dir().to_path_buf(),
            });
        }
        Ok(catalog)
    }

    /// Load the trial table and check it has one row per discovered run.
    ///
    /// # Errors
    /// Returns the load error or `RowCountMismatch`.
    pub fn load_trials(&self, catalog: &RunCatalog) -> Result<TrialTable> {
        let table = TrialTable::load(self.config.trials_path())?;
        if table.num_rows() != catalog.len() {
            return Err(Error::RowCountMismatch {
                results: catalog.len(),
                rows: table.num_rows(),
            });
        }
        Ok(table)
    }

    /// Integrate every run on the worker pool, results in catalog order.
    ///
    /// # Errors
    /// Returns the first failing run's error; no partial results.
    pub fn compute_means(&self, catalog: &RunCatalog) -> Result<Vec<(RunIndex, f64)>> {
        let loader = RunLoader::new(
            catalog.dir(),
            self.config.signal_kind(),
            self.config.time_kind(),
        );
        let engine = QuadratureEngine::new().with_monotonic_check(self.config.check_monotonic());

        self.pool.run_ordered(catalog.indices(), |index| {
            let _span = info_span!("run", %index).entered();
            integrate_run(&loader, &engine, index).map_err(|e| e.for_run(index))
        })
    }

    /// Merge results into the sorted trial table.
    ///
    /// # Errors
    /// See [`TrialTable::merge_results`].
    pub fn merge(&self, trials: &TrialTable, means: &[(RunIndex, f64)]) -> Result<RecordBatch> {
        trials.merge_results(self.config.result_column(), means)
    }

    /// Write the merged table to the configured output.
    ///
    /// # Errors
    /// Returns error if the table cannot be written.
    pub fn write(&self, merged: &RecordBatch) -> Result<()> {
        write_table(merged, self.config.output())?;
        info!(
            output = %self.config.output().display(),
            rows = merged.num_rows(),
            "wrote summary table"
        );
        Ok(())
    }

    /// Run the whole batch: discover, integrate, merge, write.
    ///
    /// Nothing is written unless every run succeeds and the merge is consistent.
    ///
    /// # Errors
    /// Returns the first error of any stage.
    pub fn run(&self) -> Result<BatchSummary> {
        let catalog = self.discover()?;
        let trials = self.load_trials(&catalog)?;
        let means = self.compute_means(&catalog)?;
        let merged = self.merge(&trials, &means)?;
        self.write(&merged)?;

        Ok(BatchSummary {
            runs: means.len(),
            means,
            output: self.config.output().to_path_buf(),
        })
    }
}

fn integrate_run(
    loader: &RunLoader,
    engine: &QuadratureEngine,
    index: RunIndex,
) -> Result<(RunIndex, f64)> {
    let series = loader.load(index)?;
    let mean = engine.mean(&series)?;
    debug!(samples = series.len(), mean, "integrated run");
    Ok((index, mean))
}
