//! Run index catalog
//!
//! Discovers the runs present in a batch directory. A run is announced by its
//! signal file `<index>_<signal kind>`; the companion time file is looked up
//! later by the loader, which fails loudly if it is absent.
//!
//! Only names whose part after the first `_` equals the signal kind exactly are
//! considered. Among those, a prefix that is not a number is skipped, while a
//! prefix that is a malformed number (`-1`, `2.5`, `3.0`) fails discovery.

mod run_index;

pub use run_index::{ParseRunIndexError, RunIndex};

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Separator between the run index prefix and the kind marker
pub const KIND_SEPARATOR: char = '_';

/// Ordered set of runs discovered in one batch directory
#[derive(Debug, Clone)]
pub struct RunCatalog {
    dir: PathBuf,
    indices: Vec<RunIndex>,
}

impl RunCatalog {
    /// Scan `dir` for `<index>_<signal_kind>` files.
    ///
    /// # Errors
    /// Returns error if the directory cannot be listed or a signal file has a
    /// malformed numeric prefix.
    pub fn discover<P: AsRef<Path>>(dir: P, signal_kind: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => debug!(entry = ?raw, "skipping non UTF-8 directory entry"),
            }
        }

        let catalog = Self::from_names(dir, names, signal_kind)?;
        info!(
            dir = %dir.display(),
            runs = catalog.len(),
            "discovered runs"
        );
        Ok(catalog)
    }

    /// Build a catalog from an already listed set of file names.
    ///
    /// # Errors
    /// Returns error if a signal file has a malformed numeric prefix.
    pub fn from_names<P, I, S>(dir: P, names: I, signal_kind: &str) -> Result<Self>
    where
        P: Into<PathBuf>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut indices = Vec::new();
        for name in names {
            let name = name.as_ref();
            let Some((prefix, kind)) = name.split_once(KIND_SEPARATOR) else {
                continue;
            };
            if kind != signal_kind {
                continue;
            }

            match prefix.parse::<RunIndex>() {
                Ok(index) => indices.push(index),
                Err(e) if e.is_not_numeric() => {
                    warn!(file = %name, "skipping signal file without a numeric run index");
                }
                Err(e) => {
                    let reason = match &e {
                        ParseRunIndexError::NonCanonical { canonical } => format!(
                            "{e}; run files are looked up as {:?}, so this file would never be read",
                            RunIndex::new(*canonical).file_name(signal_kind)
                        ),
                        _ => e.to_string(),
                    };
                    return Err(Error::InvalidRunIndex {
                        name: name.to_string(),
                        reason,
                    });
                }
            }
        }

        // Numeric order, `2` before `10`
        indices.sort_unstable();

        Ok(Self {
            dir: dir.into(),
            indices,
        })
    }

    /// Batch directory the catalog was built from
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Discovered run indices, ascending
    #[must_use]
    pub fn indices(&self) -> &[RunIndex] {
        &self.indices
    }

    /// Number of discovered runs
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True when no run was discovered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
