//! # richards-batch: Batch Aggregation of Richards-Equation Runs
//!
//! Summarizes a batch of independent infiltration simulations. Each run
//! `i` leaves two raw `f32` arrays in the batch directory, the bottom
//! boundary flux `i_qbot` and its time axis `i_t`. The aggregator computes
//! the time-weighted mean flux of every run in parallel and appends it as a
//! column to the batch's trial parameter table.
//!
//! ## Pipeline
//!
//! - [`catalog`]: discover run indices from `<index>_qbot` file names
//! - [`loader`]: decode a run's signal and time arrays
//! - [`quadrature`]: trapezoidal time-weighted mean
//! - [`pool`]: ordered, all-or-nothing parallel execution
//! - [`table`]: sort the trial table and join results by run index
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use richards_batch::{Aggregator, PipelineConfig};
//! use std::num::NonZeroUsize;
//!
//! let workers = NonZeroUsize::new(4).unwrap();
//! let config = PipelineConfig::new("batch/3", "batch/3.csv", workers);
//! let summary = Aggregator::new(config).run()?;
//! println!("{} runs aggregated", summary.runs);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod pool;
pub mod quadrature;
pub mod table;

pub use catalog::{RunCatalog, RunIndex};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::{Error, Result};
pub use pipeline::{Aggregator, BatchSummary};
