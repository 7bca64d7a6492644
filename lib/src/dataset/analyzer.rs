//! Dataset analysis: column kinds, task inference and label order.
//!
//! The analyzer scans every column once. A target column with at most
//! `threshold` distinct values, or any non-numeric value, is treated as a
//! classification target; everything else is regression.
//!
//! Label order is the order of first occurrence, never sorted. One-hot indices
//! are assigned from this order, so the same input ordering always produces
//! the same encoding.

use super::{RawTable, RawValue};
use crate::config::DEFAULT_CLASSIFICATION_THRESHOLD;
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::info;

/// Inferred kind of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Every cell parsed as a number.
    Numeric,
    /// At least one cell is text.
    Categorical,
}

/// Summary of one column from a full scan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
    pub unique_count: usize,
}

/// Supervised-learning task implied by the target column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskType {
    Classification,
    Regression,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskType::Classification => f.write_str("classification"),
            TaskType::Regression => f.write_str("regression"),
        }
    }
}

/// A distinct target value of a classification dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Label {
    Number(f64),
    Text(String),
}

impl Label {
    fn from_raw(value: &RawValue) -> Self {
        match value {
            RawValue::Number(v) => Label::Number(*v),
            RawValue::Text(s) => Label::Text(s.clone()),
        }
    }

    /// Whether `value` denotes this label.
    pub fn matches(&self, value: &RawValue) -> bool {
        match (self, value) {
            (Label::Number(a), RawValue::Number(b)) => a == b,
            (Label::Text(a), RawValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Number(v) => write!(f, "{}", v),
            Label::Text(s) => f.write_str(s),
        }
    }
}

/// Everything the encoder and the architecture heuristic need to know about a dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    /// Feature columns in header order; never contains the target.
    pub feature_names: Vec<String>,
    pub target_name: String,
    pub n_samples: usize,
    pub task: TaskType,
    /// Distinct target values in first-occurrence order. Empty for regression.
    pub labels: Vec<Label>,
    /// Per-column summaries in header order, target included.
    pub columns: Vec<ColumnDescriptor>,
}

impl DatasetDescriptor {
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn n_labels(&self) -> usize {
        self.labels.len()
    }

    /// True when any label is text, which selects one-hot target encoding.
    pub fn has_text_labels(&self) -> bool {
        !self.labels.is_empty() && self.labels.iter().any(|l| matches!(l, Label::Text(_)))
    }

    pub fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(ToString::to_string).collect()
    }

    /// Position of `value` in the label list.
    pub fn label_index(&self, value: &RawValue) -> Option<usize> {
        self.labels.iter().position(|l| l.matches(value))
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Analyze `table` with the default classification threshold.
pub fn analyze(table: &RawTable, target: &str) -> Result<DatasetDescriptor, PipelineError> {
    analyze_with_threshold(table, target, DEFAULT_CLASSIFICATION_THRESHOLD)
}

/// Analyze `table`, treating targets with at most `threshold` distinct values as classes.
///
/// # Errors
/// [`PipelineError::Schema`] if the table has no rows or lacks the target column.
pub fn analyze_with_threshold(
    table: &RawTable,
    target: &str,
    threshold: usize,
) -> Result<DatasetDescriptor, PipelineError> {
    if table.n_rows() == 0 {
        return Err(PipelineError::Schema("dataset has no rows".to_string()));
    }
    let target_idx = table.column_index(target).ok_or_else(|| {
        PipelineError::Schema(format!(
            "target column '{}' not found in [{}]",
            target,
            table.columns().join(", ")
        ))
    })?;

    let columns: Vec<ColumnDescriptor> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| describe_column(table, idx, name))
        .collect();

    let mut seen = HashSet::new();
    let mut distinct: Vec<&RawValue> = Vec::new();
    for value in table.column(target_idx) {
        if seen.insert(value.key()) {
            distinct.push(value);
        }
    }

    let has_text = distinct.iter().any(|v| !v.is_number());
    let task = if distinct.len() <= threshold || has_text {
        TaskType::Classification
    } else {
        TaskType::Regression
    };

    let labels = match task {
        TaskType::Classification => distinct.iter().map(|v| Label::from_raw(v)).collect(),
        TaskType::Regression => Vec::new(),
    };

    let feature_names = table
        .columns()
        .iter()
        .filter(|c| c.as_str() != target)
        .cloned()
        .collect();

    info!(
        column = target,
        %task,
        distinct = distinct.len(),
        samples = table.n_rows(),
        "analyzed dataset"
    );

    Ok(DatasetDescriptor {
        feature_names,
        target_name: target.to_string(),
        n_samples: table.n_rows(),
        task,
        labels,
        columns,
    })
}

fn describe_column(table: &RawTable, idx: usize, name: &str) -> ColumnDescriptor {
    let mut unique = HashSet::new();
    let mut numeric = true;
    for value in table.column(idx) {
        numeric &= value.is_number();
        unique.insert(value.key());
    }
    ColumnDescriptor {
        name: name.to_string(),
        kind: if numeric {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        },
        unique_count: unique.len(),
    }
}
