//! Pipeline configuration

use crate::{Error, Result};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Kind marker of the flux signal files (`<index>_qbot`)
pub const DEFAULT_SIGNAL_KIND: &str = "qbot";

/// Kind marker of the time axis files (`<index>_t`)
pub const DEFAULT_TIME_KIND: &str = "t";

/// Trial table file name inside the batch directory
pub const DEFAULT_TRIALS_FILE: &str = "trials.csv";

/// Name of the column receiving the mean flux
pub const DEFAULT_RESULT_COLUMN: &str = "qbot";

/// Settings for one aggregation run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    batch_dir: PathBuf,
    output: PathBuf,
    workers: NonZeroUsize,
    signal_kind: String,
    time_kind: String,
    trials_file: String,
    result_column: String,
    check_monotonic: bool,
}

impl PipelineConfig {
    /// Configuration with default file naming.
    #[must_use]
    pub fn new(
        batch_dir: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        workers: NonZeroUsize,
    ) -> Self {
        Self {
            batch_dir: batch_dir.into(),
            output: output.into(),
            workers,
            signal_kind: DEFAULT_SIGNAL_KIND.to_string(),
            time_kind: DEFAULT_TIME_KIND.to_string(),
            trials_file: DEFAULT_TRIALS_FILE.to_string(),
            result_column: DEFAULT_RESULT_COLUMN.to_string(),
            check_monotonic: true,
        }
    }

    /// Create a builder for overriding file naming.
    #[must_use]
    pub fn builder(
        batch_dir: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        workers: NonZeroUsize,
    ) -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::new(batch_dir, output, workers),
        }
    }

    /// Batch directory holding run files and the trial table
    #[must_use]
    pub fn batch_dir(&self) -> &Path {
        &self.batch_dir
    }

    /// Destination of the augmented table
    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Worker pool size
    #[must_use]
    pub const fn workers(&self) -> NonZeroUsize {
        self.workers
    }

    /// Kind marker of signal files
    #[must_use]
    pub fn signal_kind(&self) -> &str {
        &self.signal_kind
    }

    /// Kind marker of time files
    #[must_use]
    pub fn time_kind(&self) -> &str {
        &self.time_kind
    }

    /// Name of the result column
    #[must_use]
    pub fn result_column(&self) -> &str {
        &self.result_column
    }

    /// Whether decreasing time axes are rejected
    #[must_use]
    pub const fn check_monotonic(&self) -> bool {
        self.check_monotonic
    }

    /// Location of the trial table
    #[must_use]
    pub fn trials_path(&self) -> PathBuf {
        self.batch_dir.join(&self.trials_file)
    }
}

/// Builder for `PipelineConfig`.
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Set the signal file kind marker.
    #[must_use]
    pub fn signal_kind(mut self, kind: impl Into<String>) -> Self {
        self.config.signal_kind = kind.into();
        self
    }

    /// Set the time file kind marker.
    #[must_use]
    pub fn time_kind(mut self, kind: impl Into<String>) -> Self {
        self.config.time_kind = kind.into();
        self
    }

    /// Set the trial table file name.
    #[must_use]
    pub fn trials_file(mut self, name: impl Into<String>) -> Self {
        self.config.trials_file = name.into();
        self
    }

    /// Set the result column name.
    #[must_use]
    pub fn result_column(mut self, name: impl Into<String>) -> Self {
        self.config.result_column = name.into();
        self
    }

    /// Enable or disable the monotonic time check.
    #[must_use]
    pub fn check_monotonic(mut self, enabled: bool) -> Self {
        self.config.check_monotonic = enabled;
        self
    }

    /// Build the `PipelineConfig`.
    ///
    /// # Errors
    /// Returns `InvalidInput` if a name is empty or both kinds are equal.
    pub fn build(self) -> Result<PipelineConfig> {
        let c = &self.config;
        for (what, value) in [
            ("signal kind", &c.signal_kind),
            ("time kind", &c.time_kind),
            ("trials file", &c.trials_file),
            ("result column", &c.result_column),
        ] {
            if value.is_empty() {
                return Err(Error::InvalidInput(format!("{what} must not be empty")));
            }
        }
        if c.signal_kind == c.time_kind {
            return Err(Error::InvalidInput(format!(
                "signal and time kinds are both {:?}",
                c.signal_kind
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two() -> NonZeroUsize {
        NonZeroUsize::new(2).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::new("batch", "out.csv", two());
        assert_eq!(config.signal_kind(), "qbot");
        assert_eq!(config.time_kind(), "t");
        assert_eq!(config.result_column(), "qbot");
        assert_eq!(config.trials_path(), Path::new("batch").join("trials.csv"));
        assert_eq!(config.workers().get(), 2);
        assert!(config.check_monotonic());
    }

    #[test]
    fn test_builder_overrides() {
        let config = PipelineConfig::builder("batch", "out.csv", two())
            .signal_kind("qtop")
            .trials_file("params.parquet")
            .result_column("mean_qtop")
            .check_monotonic(false)
            .build()
            .unwrap();
        assert_eq!(config.signal_kind(), "qtop");
        assert_eq!(config.result_column(), "mean_qtop");
        assert_eq!(config.trials_path(), Path::new("batch").join("params.parquet"));
        assert!(!config.check_monotonic());
    }

    #[test]
    fn test_builder_rejects_clashing_kinds() {
        let result = PipelineConfig::builder("batch", "out.csv", two())
            .time_kind("qbot")
            .build();
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_builder_rejects_empty_names() {
        let result = PipelineConfig::builder("batch", "out.csv", two())
            .result_column("")
            .build();
        assert!(result.unwrap_err().to_string().contains("result column"));
    }
}
