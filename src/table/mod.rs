//! Trial table merger
//!
//! The trial table is an externally produced table with one row per run; its
//! first column is the run index. Per-run results are attached as a new
//! `Float64` column after sorting the rows by index.
//!
//! Results are joined by run index value, never by position: each sorted row
//! looks up the result carrying its own index. A count mismatch, a duplicated
//! index or a row without a result fails the merge.

mod format;

pub use format::{read_csv, read_parquet, read_table, write_table, TableFormat};

use crate::catalog::RunIndex;
use crate::{Error, Result};
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array};
use arrow::compute::{self, SortOptions};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Position of the run index column
pub const INDEX_COLUMN: usize = 0;

/// Trial parameter table keyed by run index
#[derive(Debug, Clone)]
pub struct TrialTable {
    batch: RecordBatch,
}

impl TrialTable {
    /// Wrap an existing record batch; the first column is the run index.
    ///
    /// # Errors
    /// Returns `InvalidIndexColumn` if the batch has no columns.
    pub fn new(batch: RecordBatch) -> Result<Self> {
        if batch.num_columns() == 0 {
            return Err(Error::InvalidIndexColumn(
                "trial table has no columns".to_string(),
            ));
        }
        Ok(Self { batch })
    }

    /// Load a trial table from CSV or Parquet (by extension).
    ///
    /// # Errors
    /// Returns error if the file cannot be read or has no columns.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let table = Self::new(read_table(path)?)?;
        info!(
            path = %path.display(),
            rows = table.num_rows(),
            columns = table.batch.num_columns(),
            "loaded trial table"
        );
        Ok(table)
    }

    /// Underlying record batch
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Number of trial rows
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Header of the index column (often empty in dataframe exports)
    #[must_use]
    pub fn index_name(&self) -> String {
        self.batch.schema().field(INDEX_COLUMN).name().clone()
    }

    /// Run indices in row order.
    ///
    /// # Errors
    /// Returns `InvalidIndexColumn` if the column holds nulls, negative or
    /// fractional values, or is not numeric.
    pub fn run_indices(&self) -> Result<Vec<RunIndex>> {
        index_values(self.batch.column(INDEX_COLUMN))
    }

    /// Copy of the table with rows in ascending run index order.
    ///
    /// # Errors
    /// Returns error if the index column is invalid or the sort fails.
    pub fn sorted_by_index(&self) -> Result<Self> {
        let index = self.batch.column(INDEX_COLUMN);
        if index.null_count() > 0 {
            return Err(Error::InvalidIndexColumn(format!(
                "{} null run index value(s)",
                index.null_count()
            )));
        }

        let order = compute::sort_to_indices(
            index.as_ref(),
            Some(SortOptions {
                descending: false,
                nulls_first: false,
            }),
            None,
        )?;

        let columns = self
            .batch
            .columns()
            .iter()
            .map(|column| compute::take(column.as_ref(), &order, None))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            batch: RecordBatch::try_new(self.batch.schema(), columns)?,
        })
    }

    /// Sort by run index and attach `results` as column `name`.
    ///
    /// An existing column of the same name is replaced in place, otherwise the
    /// column is appended last.
    ///
    /// # Errors
    /// - `RowCountMismatch` if `results` and the table differ in length
    /// - `DuplicateRunIndex` if an index repeats in the table or the results
    /// - `MissingResult` if a row's index has no result
    /// - `InvalidInput` if `name` is the index column
    pub fn merge_results(&self, name: &str, results: &[(RunIndex, f64)]) -> Result<RecordBatch> {
        if results.len() != self.num_rows() {
            return Err(Error::RowCountMismatch {
                results: results.len(),
                rows: self.num_rows(),
            });
        }

        let sorted = self.sorted_by_index()?;
        let row_indices = sorted.run_indices()?;
        if let Some(pair) = row_indices.windows(2).find(|w| w[0] == w[1]) {
            return Err(Error::DuplicateRunIndex { index: pair[0] });
        }

        let mut by_index = HashMap::with_capacity(results.len());
        for &(index, value) in results {
            if by_index.insert(index, value).is_some() {
                return Err(Error::DuplicateRunIndex { index });
            }
        }

        let values = row_indices
            .iter()
            .map(|index| {
                by_index
                    .get(index)
                    .copied()
                    .ok_or_else(|| Error::MissingResult { index: *index })
            })
            .collect::<Result<Vec<f64>>>()?;

        let merged = sorted.with_column(name, Arc::new(Float64Array::from(values)))?;
        debug!(column = name, rows = merged.num_rows(), "merged run results");
        Ok(merged)
    }

    fn with_column(&self, name: &str, values: ArrayRef) -> Result<RecordBatch> {
        let schema = self.batch.schema();
        let field = Arc::new(Field::new(name, DataType::Float64, false));

        let mut fields: Vec<_> = schema.fields().iter().cloned().collect();
        let mut columns = self.batch.columns().to_vec();

        match schema.index_of(name) {
            Ok(INDEX_COLUMN) => {
                return Err(Error::InvalidInput(format!(
                    "result column {name:?} would overwrite the run index column"
                )));
            }
            Ok(position) => {
                fields[position] = field;
                columns[position] = values;
            }
            Err(_) => {
                fields.push(field);
                columns.push(values);
            }
        }

        let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
        Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
    }
}

/// Read an index column as run indices
fn index_values(column: &ArrayRef) -> Result<Vec<RunIndex>> {
    if column.null_count() > 0 {
        return Err(Error::InvalidIndexColumn(format!(
            "{} null run index value(s)",
            column.null_count()
        )));
    }

    let data_type = column.data_type();
    if data_type.is_integer() {
        let cast = compute::cast(column, &DataType::Int64)?;
        let values = cast
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| Error::InvalidIndexColumn("integer cast failed".to_string()))?;
        if values.null_count() > 0 {
            return Err(Error::InvalidIndexColumn(
                "run index does not fit in 64 bits".to_string(),
            ));
        }
        values
            .values()
            .iter()
            .map(|&v| {
                u64::try_from(v)
                    .map(RunIndex::new)
                    .map_err(|_| Error::InvalidIndexColumn(format!("negative run index {v}")))
            })
            .collect()
    } else if data_type.is_floating() {
        let cast = compute::cast(column, &DataType::Float64)?;
        let values = cast
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| Error::InvalidIndexColumn("float cast failed".to_string()))?;
        values.values().iter().map(|&v| float_index(v)).collect()
    } else {
        Err(Error::InvalidIndexColumn(format!(
            "unsupported run index type {data_type}"
        )))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn float_index(v: f64) -> Result<RunIndex> {
    // 2^64 as f64; larger values would saturate
    const LIMIT: f64 = 18_446_744_073_709_551_616.0;
    if !v.is_finite() || v < 0.0 || v.fract() != 0.0 || v >= LIMIT {
        return Err(Error::InvalidIndexColumn(format!(
            "run index {v} is not a non-negative integer"
        )));
    }
    Ok(RunIndex::new(v as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float32Array, StringArray, UInt16Array};

    fn trial_batch(index: Vec<i64>) -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("", DataType::Int64, false),
            Field::new("infdur", DataType::Float64, false),
            Field::new("label", DataType::Utf8, false),
        ]);
        #[allow(clippy::cast_precision_loss)]
        let infdur = index.iter().map(|&i| i as f64 * 3600.0).collect::<Vec<_>>();
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(index.clone())),
                Arc::new(Float64Array::from(infdur)),
                Arc::new(StringArray::from_iter_values(
                    index.iter().map(|i| format!("trial_{i}")),
                )),
            ],
        )
        .unwrap()
    }

    fn results(pairs: &[(u64, f64)]) -> Vec<(RunIndex, f64)> {
        pairs.iter().map(|&(i, v)| (RunIndex::new(i), v)).collect()
    }

    fn float_column(batch: &RecordBatch, name: &str) -> Vec<f64> {
        let position = batch.schema().index_of(name).unwrap();
        batch
            .column(position)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap()
            .values()
            .to_vec()
    }

    #[test]
    fn test_sorted_by_index_moves_whole_rows() {
        let table = TrialTable::new(trial_batch(vec![10, 2, 7])).unwrap();
        let sorted = table.sorted_by_index().unwrap();

        let indices: Vec<u64> = sorted.run_indices().unwrap().iter().map(|i| i.get()).collect();
        assert_eq!(indices, vec![2, 7, 10]);
        assert_eq!(
            float_column(sorted.batch(), "infdur"),
            vec![7200.0, 25200.0, 36000.0]
        );
    }

    #[test]
    fn test_merge_joins_by_index_not_position() {
        let table = TrialTable::new(trial_batch(vec![2, 1])).unwrap();
        // Results deliberately out of row order
        let merged = table
            .merge_results("qbot", &results(&[(2, 20.0), (1, 10.0)]))
            .unwrap();

        assert_eq!(merged.num_columns(), 4);
        assert_eq!(merged.schema().field(3).name(), "qbot");
        assert_eq!(float_column(&merged, "qbot"), vec![10.0, 20.0]);
        assert_eq!(float_column(&merged, "infdur"), vec![3600.0, 7200.0]);
    }

    #[test]
    fn test_merge_preserves_index_header() {
        let table = TrialTable::new(trial_batch(vec![0])).unwrap();
        let merged = table.merge_results("qbot", &results(&[(0, 1.0)])).unwrap();
        assert_eq!(merged.schema().field(0).name(), "");
        assert_eq!(table.index_name(), "");
    }

    #[test]
    fn test_row_count_mismatch() {
        let table = TrialTable::new(trial_batch(vec![1, 2, 3])).unwrap();
        let err = table
            .merge_results("qbot", &results(&[(1, 1.0), (2, 2.0)]))
            .unwrap_err();
        assert!(matches!(err, Error::RowCountMismatch { results: 2, rows: 3 }));
    }

    #[test]
    fn test_missing_result_for_row() {
        let table = TrialTable::new(trial_batch(vec![1, 2])).unwrap();
        let err = table
            .merge_results("qbot", &results(&[(1, 1.0), (5, 2.0)]))
            .unwrap_err();
        assert!(matches!(err, Error::MissingResult { index } if index.get() == 2));
    }

    #[test]
    fn test_duplicate_row_index() {
        let table = TrialTable::new(trial_batch(vec![1, 1])).unwrap();
        let err = table
            .merge_results("qbot", &results(&[(1, 1.0), (2, 2.0)]))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRunIndex { index } if index.get() == 1));
    }

    #[test]
    fn test_duplicate_result_index() {
        let table = TrialTable::new(trial_batch(vec![1, 2])).unwrap();
        let err = table
            .merge_results("qbot", &results(&[(1, 1.0), (1, 2.0)]))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRunIndex { index } if index.get() == 1));
    }

    #[test]
    fn test_existing_column_replaced() {
        let table = TrialTable::new(trial_batch(vec![1, 2])).unwrap();
        let merged = table
            .merge_results("infdur", &results(&[(1, -1.0), (2, -2.0)]))
            .unwrap();
        assert_eq!(merged.num_columns(), 3);
        assert_eq!(float_column(&merged, "infdur"), vec![-1.0, -2.0]);
    }

    #[test]
    fn test_index_column_cannot_be_overwritten() {
        let table = TrialTable::new(trial_batch(vec![1])).unwrap();
        assert!(matches!(
            table.merge_results("", &results(&[(1, 1.0)])),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_negative_index_rejected() {
        let table = TrialTable::new(trial_batch(vec![-1, 2])).unwrap();
        assert!(matches!(
            table.run_indices(),
            Err(Error::InvalidIndexColumn(_))
        ));
    }

    #[test]
    fn test_float_index_column() {
        let schema = Schema::new(vec![Field::new("", DataType::Float32, false)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema.clone()),
            vec![Arc::new(Float32Array::from(vec![3.0, 1.0]))],
        )
        .unwrap();
        let indices = TrialTable::new(batch).unwrap().run_indices().unwrap();
        assert_eq!(indices, vec![RunIndex::new(3), RunIndex::new(1)]);

        let fractional = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(Float32Array::from(vec![1.5]))],
        )
        .unwrap();
        assert!(TrialTable::new(fractional).unwrap().run_indices().is_err());
    }

    #[test]
    fn test_unsigned_index_column() {
        let schema = Schema::new(vec![Field::new("run", DataType::UInt16, false)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(UInt16Array::from(vec![4, 0]))],
        )
        .unwrap();
        let indices = TrialTable::new(batch).unwrap().run_indices().unwrap();
        assert_eq!(indices, vec![RunIndex::new(4), RunIndex::new(0)]);
    }

    #[test]
    fn test_string_index_column_rejected() {
        let schema = Schema::new(vec![Field::new("", DataType::Utf8, false)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(StringArray::from(vec!["a"]))],
        )
        .unwrap();
        assert!(matches!(
            TrialTable::new(batch).unwrap().run_indices(),
            Err(Error::InvalidIndexColumn(_))
        ));
    }
}
