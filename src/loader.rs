//! Run loader
//!
//! Maps a run index to its raw sample files and decodes them. Files are bare
//! arrays of native-endian `f32` with no header; samples are widened to `f64`
//! for integration.

use crate::catalog::RunIndex;
use crate::{Error, Result};
use std::io;
use std::path::{Path, PathBuf};

/// Width in bytes of one raw sample
pub const SAMPLE_WIDTH: usize = std::mem::size_of::<f32>();

/// Signal and time samples of one run, equal length
#[derive(Debug, Clone, PartialEq)]
pub struct RunSeries {
    index: RunIndex,
    signal: Vec<f64>,
    time: Vec<f64>,
}

impl RunSeries {
    /// Pair signal and time samples of one run.
    ///
    /// # Errors
    /// Returns `LengthMismatch` if the two arrays differ in length.
    pub fn new(index: RunIndex, signal: Vec<f64>, time: Vec<f64>) -> Result<Self> {
        if signal.len() != time.len() {
            return Err(Error::LengthMismatch {
                index,
                signal: signal.len(),
                time: time.len(),
            });
        }
        Ok(Self {
            index,
            signal,
            time,
        })
    }

    /// Run the samples belong to
    #[must_use]
    pub const fn index(&self) -> RunIndex {
        self.index
    }

    /// Signal samples
    #[must_use]
    pub fn signal(&self) -> &[f64] {
        &self.signal
    }

    /// Time samples (seconds)
    #[must_use]
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Number of samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.signal.len()
    }

    /// True when the run recorded no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signal.is_empty()
    }
}

/// Reads `<index>_<kind>` sample files from a batch directory
#[derive(Debug, Clone)]
pub struct RunLoader {
    dir: PathBuf,
    signal_kind: String,
    time_kind: String,
}

impl RunLoader {
    /// Create a loader for the batch directory `dir`
    #[must_use]
    pub fn new(
        dir: impl Into<PathBuf>,
        signal_kind: impl Into<String>,
        time_kind: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            signal_kind: signal_kind.into(),
            time_kind: time_kind.into(),
        }
    }

    /// Location of a run's signal file
    #[must_use]
    pub fn signal_path(&self, index: RunIndex) -> PathBuf {
        self.dir.join(index.file_name(&self.signal_kind))
    }

    /// Location of a run's time file
    #[must_use]
    pub fn time_path(&self, index: RunIndex) -> PathBuf {
        self.dir.join(index.file_name(&self.time_kind))
    }

    /// Load the signal and time samples of one run.
    ///
    /// # Errors
    /// Returns `MissingRunData` if either file is absent or not a whole number
    /// of samples, `LengthMismatch` if the arrays differ in length.
    pub fn load(&self, index: RunIndex) -> Result<RunSeries> {
        let signal = read_samples(index, &self.signal_kind, &self.signal_path(index))?;
        let time = read_samples(index, &self.time_kind, &self.time_path(index))?;
        RunSeries::new(index, signal, time)
    }
}

/// Read one run file and widen its samples to `f64`
fn read_samples(index: RunIndex, kind: &str, path: &Path) -> Result<Vec<f64>> {
    let missing = |source| Error::MissingRunData {
        index,
        kind: kind.to_string(),
        path: path.to_path_buf(),
        source,
    };

    let bytes = std::fs::read(path).map_err(missing)?;
    let samples = decode_samples(&bytes).map_err(missing)?;
    Ok(samples.into_iter().map(f64::from).collect())
}

/// Decode a headerless native-endian `f32` array.
///
/// # Errors
/// Returns `InvalidData` if the byte count is not a multiple of the sample width.
pub fn decode_samples(bytes: &[u8]) -> io::Result<Vec<f32>> {
    if bytes.len() % SAMPLE_WIDTH != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "{} bytes is not a whole number of {SAMPLE_WIDTH}-byte samples",
                bytes.len()
            ),
        ));
    }
    // Copies, so the byte buffer need not be aligned for f32
    Ok(bytemuck::pod_collect_to_vec(bytes))
}

/// Encode samples the way the simulator writes them
#[must_use]
pub fn encode_samples(samples: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(samples).to_vec()
}
