//! Error types for richards-batch
//!
//! Every failure aborts the whole batch: none of these are retried and none
//! are downgraded to a placeholder value, because a partial or misaligned
//! result column cannot be merged into the trial table.

use crate::catalog::RunIndex;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// richards-batch error types
#[derive(Error, Debug)]
pub enum Error {
    /// A signal or time file for a discovered run is absent or undecodable
    #[error("Missing run data for run {index}: cannot read {kind} file {}: {source}", path.display())]
    MissingRunData {
        /// Run the file belongs to
        index: RunIndex,
        /// Kind marker of the file (`qbot`, `t`, ...)
        kind: String,
        /// Expected location of the file
        path: PathBuf,
        /// Underlying I/O or decode failure
        source: std::io::Error,
    },

    /// Signal and time arrays of one run disagree in length
    #[error("Length mismatch for run {index}: {signal} signal samples vs {time} time samples")]
    LengthMismatch {
        /// Run the arrays belong to
        index: RunIndex,
        /// Number of signal samples
        signal: usize,
        /// Number of time samples
        time: usize,
    },

    /// Fewer than two samples, the trapezoid rule needs at least one interval
    #[error("Insufficient samples: {len} sample(s), at least 2 required")]
    InsufficientSamples {
        /// Number of samples supplied
        len: usize,
    },

    /// The time axis spans zero seconds
    #[error("Degenerate time domain: every timestamp equals {value}")]
    DegenerateDomain {
        /// The single timestamp value
        value: f64,
    },

    /// A signal or time sample is NaN or infinite
    #[error("Non-finite {series} sample {value} at position {position}")]
    NonFiniteSample {
        /// Which array holds the sample (`signal` or `time`)
        series: &'static str,
        /// Position of the first non-finite sample
        position: usize,
        /// The offending value
        value: f64,
    },

    /// Integration overflowed to a non-finite mean
    #[error("Non-finite mean {value}: integral or time span overflowed")]
    NonFiniteMean {
        /// The computed value
        value: f64,
    },

    /// A timestamp is smaller than its predecessor
    #[error("Non-monotonic time axis: sample {position} decreases")]
    NonMonotonicTime {
        /// Position of the first decreasing sample
        position: usize,
    },

    /// A per-run task failed; wraps the stage error with the run index
    #[error("Run {index} failed: {source}")]
    RunFailed {
        /// Failing run
        index: RunIndex,
        /// Stage error
        source: Box<Error>,
    },

    /// A directory entry looks like a signal file but its prefix is not a plain integer
    #[error("Invalid run index in {name:?}: {reason}")]
    InvalidRunIndex {
        /// Offending file name
        name: String,
        /// Why the prefix was rejected
        reason: String,
    },

    /// Number of per-run results disagrees with the trial table row count
    #[error("Row count mismatch: {results} run result(s) but trial table has {rows} row(s)")]
    RowCountMismatch {
        /// Number of results
        results: usize,
        /// Number of trial table rows
        rows: usize,
    },

    /// A trial table row has no matching run result
    #[error("Trial table row for run {index} has no matching run result")]
    MissingResult {
        /// Run index of the unmatched row
        index: RunIndex,
    },

    /// The trial table lists a run index twice
    #[error("Duplicate run index {index} in trial table")]
    DuplicateRunIndex {
        /// Repeated run index
        index: RunIndex,
    },

    /// The trial table index column cannot be read as run indices
    #[error("Invalid trial table index column: {0}")]
    InvalidIndexColumn(String),

    /// The batch directory contains no signal files
    #[error("No runs found in batch directory {}", path.display())]
    EmptyBatch {
        /// Batch directory that was scanned
        path: PathBuf,
    },

    /// Invalid input parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Task skipped because another task already failed
    #[error("Task cancelled after an earlier failure")]
    Cancelled,

    /// Worker pool could not be started
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

impl Error {
    /// Attach the run index to a stage error
    ///
    /// Errors that already name their run are returned unchanged.
    #[must_use]
    pub fn for_run(self, index: RunIndex) -> Self {
        match self {
            Self::MissingRunData { .. } | Self::LengthMismatch { .. } | Self::RunFailed { .. } => {
                self
            }
            other => Self::RunFailed {
                index,
                source: Box::new(other),
            },
        }
    }

    /// Run index named by this error, if any
    #[must_use]
    pub const fn run_index(&self) -> Option<RunIndex> {
        match self {
            Self::MissingRunData { index, .. }
            | Self::LengthMismatch { index, .. }
            | Self::RunFailed { index, .. }
            | Self::MissingResult { index }
            | Self::DuplicateRunIndex { index } => Some(*index),
            _ => None,
        }
    }
}
