//! Quadrature engine
//!
//! Time-weighted mean of a sampled signal: `∫ y dt / (max(t) - min(t))`, with
//! the integral taken by the composite trapezoid rule over the samples in the
//! order given. The simulator's timestep is adaptive, so the grid is generally
//! non-uniform.

use crate::loader::RunSeries;
use crate::{Error, Result};

/// Composite trapezoid integral of `y` over `t`.
///
/// # Errors
/// Returns `InvalidInput` if the slices differ in length, `InsufficientSamples`
/// if fewer than two samples are given.
pub fn trapezoid(y: &[f64], t: &[f64]) -> Result<f64> {
    if y.len() != t.len() {
        return Err(Error::InvalidInput(format!(
            "signal has {} samples but time axis has {}",
            y.len(),
            t.len()
        )));
    }
    if y.len() < 2 {
        return Err(Error::InsufficientSamples { len: y.len() });
    }

    let area = y
        .windows(2)
        .zip(t.windows(2))
        .map(|(yw, tw)| 0.5 * (yw[0] + yw[1]) * (tw[1] - tw[0]))
        .sum();
    Ok(area)
}

/// Time-weighted mean of `y` over the span of `t`.
///
/// # Errors
/// Same as [`trapezoid`], plus `NonFiniteSample` for a NaN or infinite sample,
/// `DegenerateDomain` when all timestamps are equal and `NonFiniteMean` when
/// the result overflows.
///
/// # Example
///
/// ```rust
/// use richards_batch::quadrature::time_weighted_mean;
///
/// let mean = time_weighted_mean(&[0.0, 2.0, 4.0], &[0.0, 1.0, 2.0])?;
/// assert!((mean - 2.0).abs() < 1e-12);
/// # Ok::<(), richards_batch::Error>(())
/// ```
pub fn time_weighted_mean(y: &[f64], t: &[f64]) -> Result<f64> {
    let area = trapezoid(y, t)?;
    ensure_finite("time", t)?;
    ensure_finite("signal", y)?;

    let (lo, hi) = t
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = hi - lo;
    if span == 0.0 {
        return Err(Error::DegenerateDomain { value: lo });
    }

    let mean = area / span;
    if !mean.is_finite() {
        return Err(Error::NonFiniteMean { value: mean });
    }
    Ok(mean)
}

/// First NaN or infinite sample of `samples`, as an error
fn ensure_finite(series: &'static str, samples: &[f64]) -> Result<()> {
    match samples.iter().position(|v| !v.is_finite()) {
        Some(position) => Err(Error::NonFiniteSample {
            series,
            position,
            value: samples[position],
        }),
        None => Ok(()),
    }
}

/// Check that timestamps never decrease.
///
/// # Errors
/// Returns `NonMonotonicTime` naming the first decreasing sample.
pub fn check_monotonic(t: &[f64]) -> Result<()> {
    match t.windows(2).position(|w| w[1] < w[0]) {
        Some(i) => Err(Error::NonMonotonicTime { position: i + 1 }),
        None => Ok(()),
    }
}

/// Per-run mean flux computation
#[derive(Debug, Clone, Copy)]
pub struct QuadratureEngine {
    check_monotonic: bool,
}

impl Default for QuadratureEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadratureEngine {
    /// Engine that rejects decreasing time axes
    #[must_use]
    pub const fn new() -> Self {
        Self {
            check_monotonic: true,
        }
    }

    /// Enable or disable the monotonic time check
    #[must_use]
    pub const fn with_monotonic_check(mut self, enabled: bool) -> Self {
        self.check_monotonic = enabled;
        self
    }

    /// Time-weighted mean of one run's signal.
    ///
    /// # Errors
    /// See [`time_weighted_mean`] and [`check_monotonic`].
    pub fn mean(&self, series: &RunSeries) -> Result<f64> {
        if self.check_monotonic {
            check_monotonic(series.time())?;
        }
        time_weighted_mean(series.signal(), series.time())
    }
}
