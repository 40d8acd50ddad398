//! Parallel task orchestrator
//!
//! Fans one task per input out over a fixed-size worker pool and returns the
//! results in submission order, whatever order the workers finish in.
//!
//! The batch is all-or-nothing:
//! - the first failure raises a cancel flag, tasks not yet started are skipped
//! - tasks already running are allowed to finish
//! - the reported error is the failure at the lowest input position
//!
//! Worker threads live in a scope owned by [`WorkerPool::run_ordered`] and are
//! joined before it returns, on the error path as well.

use crate::{Error, Result};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Outcome of one task slot
enum Slot<T> {
    Done(T),
    Failed(Error),
    Skipped,
}

/// Fixed-size pool of worker threads
#[derive(Debug)]
pub struct WorkerPool {
    workers: NonZeroUsize,
    live: AtomicUsize,
}

impl WorkerPool {
    /// Create a pool of `workers` threads; threads are only spawned per batch
    #[must_use]
    pub fn new(workers: NonZeroUsize) -> Self {
        Self {
            workers,
            live: AtomicUsize::new(0),
        }
    }

    /// Configured worker count
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers.get()
    }

    /// Number of worker threads currently alive
    #[must_use]
    pub fn live_workers(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Run `task` on every input, returning results in input order.
    ///
    /// # Errors
    /// Returns the failure at the lowest input position if any task fails, or
    /// `WorkerPool` if the threads cannot be started. No partial results are
    /// returned.
    pub fn run_ordered<I, T, F>(&self, inputs: &[I], task: F) -> Result<Vec<T>>
    where
        I: Copy + Send + Sync,
        T: Send,
        F: Fn(I) -> Result<T> + Sync,
    {
        info!(
            workers = self.workers(),
            tasks = inputs.len(),
            "dispatching tasks"
        );

        let cancel = AtomicBool::new(false);
        let live = &self.live;

        let slots: Vec<Slot<T>> = ThreadPoolBuilder::new()
            .num_threads(self.workers())
            .thread_name(|i| format!("richards-worker-{i}"))
            .build_scoped(
                |thread| {
                    live.fetch_add(1, Ordering::AcqRel);
                    thread.run();
                    live.fetch_sub(1, Ordering::AcqRel);
                },
                |pool| {
                    pool.install(|| {
                        inputs
                            .par_iter()
                            .map(|&input| {
                                if cancel.load(Ordering::Acquire) {
                                    return Slot::Skipped;
                                }
                                match task(input) {
                                    Ok(value) => Slot::Done(value),
                                    Err(e) => {
                                        cancel.store(true, Ordering::Release);
                                        Slot::Failed(e)
                                    }
                                }
                            })
                            .collect()
                    })
                },
            )
            .map_err(|e| Error::WorkerPool(e.to_string()))?;

        collect_ordered(slots)
    }
}

/// Turn slots into results, or the lowest-positioned failure
fn collect_ordered<T>(slots: Vec<Slot<T>>) -> Result<Vec<T>> {
    let skipped = slots.iter().filter(|s| matches!(s, Slot::Skipped)).count();
    let mut results = Vec::with_capacity(slots.len());
    let mut first_failure = None;

    for slot in slots {
        match slot {
            Slot::Done(value) => results.push(value),
            Slot::Failed(e) => {
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
            Slot::Skipped => {}
        }
    }

    if let Some(e) = first_failure {
        warn!(skipped, error = %e, "batch aborted");
        return Err(e);
    }
    if skipped > 0 {
        return Err(Error::Cancelled);
    }

    debug!(results = results.len(), "all tasks completed");
    Ok(results)
}
