//! Run index - integer identifier shared by a run's files and its trial row

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Non-negative integer identifying one simulation run.
///
/// Parsed strictly from ASCII digits: `3.0`, `+3` and `1e2` are rejected even
/// though they denote integral values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunIndex(u64);

impl RunIndex {
    /// Wrap a raw index value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw index value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// File name of this run's `kind` file, `<index>_<kind>`.
    #[must_use]
    pub fn file_name(self, kind: &str) -> String {
        format!("{}_{kind}", self.0)
    }
}

impl fmt::Display for RunIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for RunIndex {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<RunIndex> for u64 {
    fn from(index: RunIndex) -> Self {
        index.0
    }
}

/// Why a textual prefix is not a run index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseRunIndexError {
    /// Not a number at all (`abc`, `trials.csv`, empty)
    #[error("not a number")]
    NotNumeric,
    /// A negative number
    #[error("negative run index")]
    Negative,
    /// A number with a fractional part
    #[error("fractional run index")]
    Fractional,
    /// An integral value not written as plain decimal digits (`3.0`, `+3`, `1e2`)
    #[error("integral value not written as plain decimal digits, expected {canonical}")]
    NonCanonical {
        /// The value the text denotes
        canonical: u64,
    },
    /// Does not fit in 64 bits
    #[error("run index out of range")]
    Overflow,
}

impl ParseRunIndexError {
    /// True when the text merely isn't numeric, as opposed to a malformed number
    #[must_use]
    pub const fn is_not_numeric(&self) -> bool {
        matches!(self, Self::NotNumeric)
    }
}

/// 2^64, first value past `u64::MAX`
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

impl FromStr for RunIndex {
    type Err = ParseRunIndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            return s
                .parse::<u64>()
                .map(Self)
                .map_err(|_| ParseRunIndexError::Overflow);
        }

        // Classify numeric-looking text so callers can tell typos from junk
        match s.parse::<f64>() {
            Ok(v) if !v.is_finite() => Err(ParseRunIndexError::NotNumeric),
            Ok(v) if v < 0.0 => Err(ParseRunIndexError::Negative),
            Ok(v) if v.fract() != 0.0 => Err(ParseRunIndexError::Fractional),
            Ok(v) if v >= U64_LIMIT => Err(ParseRunIndexError::Overflow),
            Ok(v) => {
                // Integral and within range
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let canonical = v as u64;
                Err(ParseRunIndexError::NonCanonical { canonical })
            }
            Err(_) => Err(ParseRunIndexError::NotNumeric),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_digits() {
        assert_eq!("0".parse::<RunIndex>().unwrap(), RunIndex::new(0));
        assert_eq!("42".parse::<RunIndex>().unwrap(), RunIndex::new(42));
        assert_eq!("007".parse::<RunIndex>().unwrap(), RunIndex::new(7));
    }

    #[test]
    fn test_parse_rejections() {
        assert_eq!("abc".parse::<RunIndex>(), Err(ParseRunIndexError::NotNumeric));
        assert_eq!("".parse::<RunIndex>(), Err(ParseRunIndexError::NotNumeric));
        assert_eq!("nan".parse::<RunIndex>(), Err(ParseRunIndexError::NotNumeric));
        assert_eq!("-3".parse::<RunIndex>(), Err(ParseRunIndexError::Negative));
        assert_eq!("2.5".parse::<RunIndex>(), Err(ParseRunIndexError::Fractional));
        assert_eq!(
            "3.0".parse::<RunIndex>(),
            Err(ParseRunIndexError::NonCanonical { canonical: 3 })
        );
        assert_eq!(
            "1e2".parse::<RunIndex>(),
            Err(ParseRunIndexError::NonCanonical { canonical: 100 })
        );
        assert_eq!("1e30".parse::<RunIndex>(), Err(ParseRunIndexError::Overflow));
        assert_eq!(
            "99999999999999999999999".parse::<RunIndex>(),
            Err(ParseRunIndexError::Overflow)
        );
    }

    #[test]
    fn test_file_name() {
        assert_eq!(RunIndex::new(12).file_name("qbot"), "12_qbot");
        assert_eq!(RunIndex::new(12).file_name("t"), "12_t");
    }

    #[test]
    fn test_ordering_is_numeric() {
        assert!(RunIndex::new(2) < RunIndex::new(10));
    }
}
