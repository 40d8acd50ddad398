//! Batch directory fixtures shared by the integration tests

#![allow(dead_code)]

use richards_batch::loader::encode_samples;
use std::path::{Path, PathBuf};

/// Fresh, empty scratch directory unique to this test process
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "richards_batch_it_{name}_{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// Write `<index>_qbot` and `<index>_t`
pub fn write_run(dir: &Path, index: u64, qbot: &[f32], t: &[f32]) {
    std::fs::write(dir.join(format!("{index}_qbot")), encode_samples(qbot)).expect("write qbot");
    std::fs::write(dir.join(format!("{index}_t")), encode_samples(t)).expect("write t");
}

/// Write a `trials.csv` with an unnamed index column for `indices`
pub fn write_trials(dir: &Path, indices: &[u64]) {
    let mut text = String::from(",perm,infdur\n");
    for i in indices {
        text.push_str(&format!("{i},1e-12,{}\n", i * 3600));
    }
    std::fs::write(dir.join("trials.csv"), text).expect("write trials.csv");
}
