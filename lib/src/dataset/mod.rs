//! Raw tabular data and dataset abstractions.
//!
//! This module holds the untyped side of the pipeline: cells as they were read
//! from delimited text, and the analysis that turns a table into a
//! [`DatasetDescriptor`].
//!
//! # Core Concepts
//!
//! - **RawValue**: a single cell, either a number or trimmed text.
//! - **RawRow**: one sample, cells ordered like the header.
//! - **RawTable**: header plus all rows; created by the ingestor, read-only afterwards.
//! - **InMemoryDataset**: encoded `(X, Y)` matrices with batch access.
//!
//! # Example
//!
//! ```rust
//! use tabular_nn::dataset::{analyze, parse_csv, TaskType};
//!
//! let table = parse_csv("x,label\n1,A\n2,B\n3,A\n").unwrap();
//! let descriptor = analyze(&table, "label").unwrap();
//! assert_eq!(descriptor.task, TaskType::Classification);
//! assert_eq!(descriptor.label_names(), vec!["A", "B"]);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod analyzer;
pub mod csv;
pub mod memory;

pub use self::analyzer::{
    analyze, analyze_with_threshold, ColumnDescriptor, ColumnKind, DatasetDescriptor, Label,
    TaskType,
};
pub use self::csv::{parse_csv, parse_csv_reader, CsvIngestor};
pub use self::memory::{DatasetBatchIter, InMemoryDataset};

/// A single cell after type coercion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    /// The trimmed cell parsed fully as a finite float.
    Number(f64),
    /// Anything else, trimmed.
    Text(String),
}

impl RawValue {
    /// Coerce a cell: numbers become [`RawValue::Number`], everything else text.
    ///
    /// `-0` and `0` parse to the same value.
    pub fn parse(cell: &str) -> Self {
        let trimmed = cell.trim();
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => RawValue::Number(if v == 0.0 { 0.0 } else { v }),
            _ => RawValue::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(v) => Some(*v),
            RawValue::Text(_) => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, RawValue::Number(_))
    }

    /// Key used for distinct-value counting.
    pub(crate) fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(v) => write!(f, "{}", v),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::parse(s)
    }
}

/// One sample, with cells in header order.
#[derive(Clone, Debug, PartialEq)]
pub struct RawRow {
    values: Vec<RawValue>,
}

impl RawRow {
    pub fn new(values: Vec<RawValue>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[RawValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RawValue> {
        self.values.get(index)
    }
}

/// Header plus rows of ingested text.
#[derive(Clone, Debug, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<RawRow>,
}

impl RawTable {
    /// Build a table, checking that every row matches the header width.
    pub fn new(columns: Vec<String>, rows: Vec<RawRow>) -> crate::Result<Self> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(crate::PipelineError::Parse {
                line: i + 2,
                message: format!(
                    "expected {} fields, got {}",
                    columns.len(),
                    row.len()
                ),
            });
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate over one column's cells.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &RawValue> + '_ {
        self.rows.iter().filter_map(move |r| r.get(index))
    }

    /// Look up a cell by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&RawValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value_parse_number() {
        assert_eq!(RawValue::parse(" 3.5 "), RawValue::Number(3.5));
        assert_eq!(RawValue::parse("-2"), RawValue::Number(-2.0));
        assert_eq!(RawValue::parse("1e3"), RawValue::Number(1000.0));
    }

    #[test]
    fn test_raw_value_parse_negative_zero_is_zero() {
        for cell in ["-0", "-0.0", "-0e5"] {
            match RawValue::parse(cell) {
                RawValue::Number(v) => {
                    assert_eq!(v, 0.0);
                    assert!(v.is_sign_positive(), "{} kept its sign", cell);
                }
                other => panic!("expected a number for {}, got {:?}", cell, other),
            }
        }
        assert_eq!(RawValue::parse("-0").key(), RawValue::parse("0").key());
    }

    #[test]
    fn test_raw_value_parse_text() {
        assert_eq!(RawValue::parse(" cat "), RawValue::Text("cat".into()));
        assert_eq!(RawValue::parse("12abc"), RawValue::Text("12abc".into()));
        assert_eq!(RawValue::parse("   "), RawValue::Text(String::new()));
        assert_eq!(RawValue::parse("NaN"), RawValue::Text("NaN".into()));
    }

    #[test]
    fn test_raw_table_rejects_ragged_rows() {
        let rows = vec![
            RawRow::new(vec![1.0.into(), 2.0.into()]),
            RawRow::new(vec![1.0.into()]),
        ];
        let result = RawTable::new(vec!["a".into(), "b".into()], rows);
        assert!(matches!(
            result,
            Err(crate::PipelineError::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn test_raw_table_cell_lookup() {
        let rows = vec![RawRow::new(vec![1.0.into(), "x".into()])];
        let table = RawTable::new(vec!["a".into(), "b".into()], rows).unwrap();
        assert_eq!(table.cell(0, "b"), Some(&RawValue::Text("x".into())));
        assert_eq!(table.cell(0, "missing"), None);
        assert_eq!(table.column(0).count(), 1);
    }
}
