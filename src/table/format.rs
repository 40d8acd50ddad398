//! Table storage formats (CSV, Parquet)
//!
//! The format is chosen by file extension: `.parquet` selects Parquet,
//! anything else is comma-separated text with a header row.

use crate::{Error, Result};
use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::record_batch::RecordBatch;
use std::fs::File;
use std::io::Seek;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// On-disk table format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Comma-separated values with a header row
    Csv,
    /// Apache Parquet
    Parquet,
}

impl TableFormat {
    /// Format implied by the file extension of `path`
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let parquet = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));
        if parquet {
            Self::Parquet
        } else {
            Self::Csv
        }
    }
}

/// Read a whole table into a single record batch.
///
/// # Errors
/// Returns error if the file cannot be opened or parsed.
pub fn read_table(path: &Path) -> Result<RecordBatch> {
    match TableFormat::from_path(path) {
        TableFormat::Csv => read_csv(path),
        TableFormat::Parquet => read_parquet(path),
    }
}

/// Read a CSV table, inferring column types from the full file.
///
/// # Errors
/// Returns error if the file cannot be opened or parsed.
pub fn read_csv(path: &Path) -> Result<RecordBatch> {
    let mut file = File::open(path)?;

    let format = Format::default().with_header(true);
    let (schema, records) = format.infer_schema(&mut file, None)?;
    file.rewind()?;
    debug!(path = %path.display(), records, "inferred CSV schema");

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_format(format)
        .build(file)?;

    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

/// Read a Parquet table.
///
/// # Errors
/// Returns error if the file cannot be opened or parsed.
pub fn read_parquet(path: &Path) -> Result<RecordBatch> {
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = Arc::clone(builder.schema());
    let reader = builder.build()?;

    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

/// Write `batch` to `path`, replacing any existing file.
///
/// The table is written to a hidden sibling file first and renamed into place,
/// so readers never observe a partially written table.
///
/// # Errors
/// Returns error if the file cannot be written or renamed.
pub fn write_table(batch: &RecordBatch, path: &Path) -> Result<()> {
    let partial = partial_path(path)?;

    let written = match TableFormat::from_path(path) {
        TableFormat::Csv => write_csv(batch, &partial),
        TableFormat::Parquet => write_parquet(batch, &partial),
    }
    .and_then(|()| std::fs::rename(&partial, path).map_err(Error::from));

    if written.is_err() {
        let _ = std::fs::remove_file(&partial);
    }
    written
}

fn partial_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("{} is not a file path", path.display())))?;
    let mut partial = std::ffi::OsString::from(".");
    partial.push(name);
    partial.push(".partial");
    Ok(path.with_file_name(partial))
}

fn write_csv(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(batch)?;
    writer.into_inner().sync_all()?;
    Ok(())
}

fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    use parquet::arrow::ArrowWriter;

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}
