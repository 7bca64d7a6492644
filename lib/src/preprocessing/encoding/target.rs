//! Target column encoding and prediction decoding.
//!
//! | Task | Labels | Encoding | Width |
//! |------|--------|----------|-------|
//! | classification | any text | one-hot in label-list order | label count |
//! | classification | all numeric | the label value itself | 1 |
//! | regression | n/a | `(v - min) / (max - min + 1e-8)` | 1 |
//!
//! The label list comes from the [`DatasetDescriptor`] and is never re-sorted,
//! so encoding and decoding always agree on which index means which label.

use crate::dataset::{DatasetDescriptor, Label, RawTable, RawValue, TaskType};
use crate::error::PipelineError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Guards the min-max denominator of a constant regression target.
pub const RANGE_EPSILON: f64 = 1e-8;

/// How target values are represented in the target matrix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TargetEncoding {
    /// One column per label; a 1 at the label's index.
    OneHot { labels: Vec<Label> },
    /// A single column carrying the numeric label value.
    Scalar { labels: Vec<Label> },
    /// A single column rescaled into `[0, 1]`.
    MinMax { min: f64, max: f64 },
}

impl TargetEncoding {
    /// Number of columns of the encoded target matrix.
    pub fn output_width(&self) -> usize {
        match self {
            TargetEncoding::OneHot { labels } => labels.len(),
            TargetEncoding::Scalar { .. } | TargetEncoding::MinMax { .. } => 1,
        }
    }

    pub fn is_one_hot(&self) -> bool {
        matches!(self, TargetEncoding::OneHot { .. })
    }

    /// Numeric label values in label order for a scalar classification
    /// target; empty otherwise.
    pub fn class_values(&self) -> Vec<f64> {
        match self {
            TargetEncoding::Scalar { labels } => labels
                .iter()
                .filter_map(|l| match l {
                    Label::Number(v) => Some(*v),
                    Label::Text(_) => None,
                })
                .collect(),
            TargetEncoding::OneHot { .. } | TargetEncoding::MinMax { .. } => Vec::new(),
        }
    }

    fn encode_into(&self, value: &RawValue, out: &mut [f64]) -> Result<(), PipelineError> {
        match self {
            TargetEncoding::OneHot { labels } => {
                let idx = labels.iter().position(|l| l.matches(value)).ok_or_else(|| {
                    PipelineError::Encoding(format!("label '{}' is not in the label list", value))
                })?;
                out[idx] = 1.0;
            }
            TargetEncoding::Scalar { .. } => {
                out[0] = value.as_number().ok_or_else(|| {
                    PipelineError::Encoding(format!("expected a numeric label, got '{}'", value))
                })?;
            }
            TargetEncoding::MinMax { min, max } => {
                let v = value.as_number().ok_or_else(|| {
                    PipelineError::Encoding(format!(
                        "expected a numeric regression target, got '{}'",
                        value
                    ))
                })?;
                out[0] = (v - min) / (max - min + RANGE_EPSILON);
            }
        }
        Ok(())
    }

    /// Map a model output vector back to a prediction.
    ///
    /// Accepts both the encoded width and the reconciled width: a one-hot
    /// target read from a single-unit model is rounded to a class index, and a
    /// scalar target read from a multi-unit model names the label at the
    /// arg-max position of the label list.
    pub fn decode(&self, output: &[f64]) -> Result<Prediction, PipelineError> {
        if output.is_empty() {
            return Err(PipelineError::shape("model output", "at least 1 value", "0 values"));
        }
        match self {
            TargetEncoding::OneHot { labels } if output.len() == labels.len() => {
                let index = argmax(output);
                Ok(Prediction::Class {
                    label: labels[index].clone(),
                    index,
                    score: output[index],
                })
            }
            TargetEncoding::OneHot { labels } if output.len() == 1 => {
                let index = nearest_index(output[0], labels.len());
                Ok(Prediction::Class {
                    label: labels[index].clone(),
                    index,
                    score: output[0],
                })
            }
            TargetEncoding::OneHot { labels } => Err(PipelineError::shape(
                "model output",
                format!("1 or {} values", labels.len()),
                format!("{} values", output.len()),
            )),
            TargetEncoding::Scalar { labels } if output.len() == 1 => {
                let v = output[0];
                let (index, label) = labels
                    .iter()
                    .enumerate()
                    .filter_map(|(i, l)| match l {
                        Label::Number(n) => Some((i, *n)),
                        Label::Text(_) => None,
                    })
                    .min_by(|a, b| (a.1 - v).abs().total_cmp(&(b.1 - v).abs()))
                    .ok_or_else(|| PipelineError::Encoding("no numeric labels".to_string()))?;
                Ok(Prediction::Class {
                    label: Label::Number(label),
                    index,
                    score: v,
                })
            }
            TargetEncoding::Scalar { labels } if output.len() == labels.len() => {
                let index = argmax(output);
                Ok(Prediction::Class {
                    label: labels[index].clone(),
                    index,
                    score: output[index],
                })
            }
            TargetEncoding::Scalar { labels } => Err(PipelineError::shape(
                "model output",
                format!("1 or {} values", labels.len()),
                format!("{} values", output.len()),
            )),
            TargetEncoding::MinMax { min, max } if output.len() == 1 => Ok(Prediction::Value(
                output[0] * (max - min + RANGE_EPSILON) + min,
            )),
            TargetEncoding::MinMax { .. } => Err(PipelineError::shape(
                "model output",
                "1 value",
                format!("{} values", output.len()),
            )),
        }
    }
}

/// A decoded model output.
#[derive(Clone, Debug, PartialEq)]
pub enum Prediction {
    /// Predicted class with its position in the label list and the raw model score.
    Class {
        label: Label,
        index: usize,
        score: f64,
    },
    /// Regression value in the original target units.
    Value(f64),
}

/// Index of the largest value; first one wins on ties.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Round a scalar to the nearest class index in `0..n_classes`.
pub fn nearest_index(value: f64, n_classes: usize) -> usize {
    let max = n_classes.saturating_sub(1) as f64;
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, max) as usize
}

/// Encodes the target column of a table (unfitted).
#[derive(Clone, Debug)]
pub struct TargetEncoder {
    target_name: String,
    task: TaskType,
    labels: Vec<Label>,
    text_labels: bool,
}

impl TargetEncoder {
    pub fn new(descriptor: &DatasetDescriptor) -> Self {
        Self {
            target_name: descriptor.target_name.clone(),
            task: descriptor.task,
            labels: descriptor.labels.clone(),
            text_labels: descriptor.has_text_labels(),
        }
    }
}

impl Transformer for TargetEncoder {
    type Input = RawTable;
    type Output = Array2<f64>;
    type Fitted = FittedTargetEncoder;

    fn fit(&self, table: &RawTable) -> Result<FittedTargetEncoder, PipelineError> {
        let idx = target_index(table, &self.target_name)?;

        let encoding = match self.task {
            TaskType::Classification if self.text_labels => TargetEncoding::OneHot {
                labels: self.labels.clone(),
            },
            TaskType::Classification => TargetEncoding::Scalar {
                labels: self.labels.clone(),
            },
            TaskType::Regression => {
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                for value in table.column(idx) {
                    let v = value.as_number().ok_or_else(|| {
                        PipelineError::Encoding(format!(
                            "expected a numeric regression target, got '{}'",
                            value
                        ))
                    })?;
                    min = min.min(v);
                    max = max.max(v);
                }
                if !min.is_finite() {
                    return Err(PipelineError::Schema(
                        "cannot fit target encoder on empty data".to_string(),
                    ));
                }
                TargetEncoding::MinMax { min, max }
            }
        };

        Ok(FittedTargetEncoder {
            target_name: self.target_name.clone(),
            encoding,
        })
    }
}

/// Serializable parameters for a fitted TargetEncoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetEncoderParams {
    pub target_name: String,
    pub encoding: TargetEncoding,
}

/// Fitted TargetEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedTargetEncoder {
    target_name: String,
    encoding: TargetEncoding,
}

impl FittedTargetEncoder {
    pub fn encoding(&self) -> &TargetEncoding {
        &self.encoding
    }

    pub fn output_width(&self) -> usize {
        self.encoding.output_width()
    }

    pub fn decode(&self, output: &[f64]) -> Result<Prediction, PipelineError> {
        self.encoding.decode(output)
    }
}

impl FittedTransformer for FittedTargetEncoder {
    type Input = RawTable;
    type Output = Array2<f64>;
    type Params = TargetEncoderParams;

    fn transform(&self, table: &RawTable) -> Result<Array2<f64>, PipelineError> {
        let idx = target_index(table, &self.target_name)?;
        let mut out = Array2::zeros((table.n_rows(), self.output_width()));

        for (mut out_row, value) in out.rows_mut().into_iter().zip(table.column(idx)) {
            let slice = out_row
                .as_slice_mut()
                .ok_or_else(|| PipelineError::Encoding("non-contiguous target row".into()))?;
            self.encoding.encode_into(value, slice)?;
        }

        debug!(shape = ?out.dim(), one_hot = self.encoding.is_one_hot(), "encoded targets");
        Ok(out)
    }

    fn extract_params(&self) -> TargetEncoderParams {
        TargetEncoderParams {
            target_name: self.target_name.clone(),
            encoding: self.encoding.clone(),
        }
    }

    fn from_params(params: TargetEncoderParams) -> Result<Self, PipelineError> {
        Ok(Self {
            target_name: params.target_name,
            encoding: params.encoding,
        })
    }

    fn n_features_in(&self) -> usize {
        1
    }
}

fn target_index(table: &RawTable, name: &str) -> Result<usize, PipelineError> {
    table
        .column_index(name)
        .ok_or_else(|| PipelineError::Schema(format!("target column '{}' not found", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{analyze, parse_csv};

    fn fit_encode(text: &str, target: &str) -> (FittedTargetEncoder, Array2<f64>) {
        let table = parse_csv(text).unwrap();
        let descriptor = analyze(&table, target).unwrap();
        let fitted = TargetEncoder::new(&descriptor).fit(&table).unwrap();
        let encoded = fitted.transform(&table).unwrap();
        (fitted, encoded)
    }

    #[test]
    fn test_one_hot_follows_label_order() {
        let (fitted, y) = fit_encode("x,label\n1,B\n2,A\n3,C\n4,A\n", "label");
        assert_eq!(fitted.output_width(), 3);
        assert_eq!(y.dim(), (4, 3));
        // labels: B, A, C
        assert_eq!(y.row(0).to_vec(), vec![1.0, 0.0, 0.0]);
        assert_eq!(y.row(1).to_vec(), vec![0.0, 1.0, 0.0]);
        assert_eq!(y.row(2).to_vec(), vec![0.0, 0.0, 1.0]);
        assert_eq!(y.row(3).to_vec(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_one_hot_argmax_is_label_index() {
        let text = "x,label\n1,dog\n2,cat\n3,bird\n4,cat\n5,dog\n6,bird\n";
        let table = parse_csv(text).unwrap();
        let descriptor = analyze(&table, "label").unwrap();
        let fitted = TargetEncoder::new(&descriptor).fit(&table).unwrap();
        let y = fitted.transform(&table).unwrap();

        for (i, row) in y.rows().into_iter().enumerate() {
            let original = table.cell(i, "label").unwrap();
            let expected = descriptor.label_index(original).unwrap();
            assert_eq!(argmax(row.as_slice().unwrap()), expected);
        }
    }

    #[test]
    fn test_one_hot_unknown_label_is_error() {
        let table = parse_csv("x,label\n1,A\n2,B\n").unwrap();
        let descriptor = analyze(&table, "label").unwrap();
        let fitted = TargetEncoder::new(&descriptor).fit(&table).unwrap();

        let other = parse_csv("x,label\n1,A\n2,Z\n").unwrap();
        assert!(matches!(
            fitted.transform(&other),
            Err(PipelineError::Encoding(_))
        ));
    }

    #[test]
    fn test_numeric_labels_scalar_encoding() {
        let (fitted, y) = fit_encode("x,y\n1,0\n2,1\n3,1\n4,0\n", "y");
        assert_eq!(fitted.output_width(), 1);
        assert_eq!(y.column(0).to_vec(), vec![0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_regression_min_max() {
        let mut text = String::from("x,y\n");
        for i in 0..20 {
            text.push_str(&format!("{},{}\n", i, 10.0 + i as f64 * 5.0));
        }
        let (fitted, y) = fit_encode(&text, "y");
        assert_eq!(
            fitted.encoding(),
            &TargetEncoding::MinMax {
                min: 10.0,
                max: 105.0
            }
        );
        assert_eq!(y[[0, 0]], 0.0);
        assert!((y[[19, 0]] - 1.0).abs() < 1e-9);
        assert!(y.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_regression_constant_target_is_finite() {
        let encoding = TargetEncoding::MinMax { min: 3.0, max: 3.0 };
        let mut out = [0.0];
        encoding.encode_into(&RawValue::Number(3.0), &mut out).unwrap();
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn test_decode_one_hot() {
        let encoding = TargetEncoding::OneHot {
            labels: vec![Label::Text("A".into()), Label::Text("B".into())],
        };
        match encoding.decode(&[0.2, 0.7]).unwrap() {
            Prediction::Class { label, index, .. } => {
                assert_eq!(label, Label::Text("B".into()));
                assert_eq!(index, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        // single-unit model reading a collapsed one-hot target
        match encoding.decode(&[0.1]).unwrap() {
            Prediction::Class { index, .. } => assert_eq!(index, 0),
            other => panic!("unexpected {:?}", other),
        }
        assert!(encoding.decode(&[0.1, 0.2, 0.3]).is_err());
    }

    #[test]
    fn test_decode_scalar_nearest_label() {
        let encoding = TargetEncoding::Scalar {
            labels: vec![Label::Number(0.0), Label::Number(1.0)],
        };
        match encoding.decode(&[0.8]).unwrap() {
            Prediction::Class { label, index, .. } => {
                assert_eq!(label, Label::Number(1.0));
                assert_eq!(index, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        match encoding.decode(&[0.9, 0.1]).unwrap() {
            Prediction::Class { label, .. } => assert_eq!(label, Label::Number(0.0)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_scalar_multi_unit_names_existing_label() {
        let encoding = TargetEncoding::Scalar {
            labels: vec![Label::Number(1.0), Label::Number(2.0), Label::Number(3.0)],
        };
        assert_eq!(encoding.class_values(), vec![1.0, 2.0, 3.0]);

        match encoding.decode(&[0.1, 0.2, 0.9]).unwrap() {
            Prediction::Class { label, index, .. } => {
                assert_eq!(label, Label::Number(3.0));
                assert_eq!(index, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        match encoding.decode(&[0.7, 0.2, 0.1]).unwrap() {
            Prediction::Class { label, .. } => assert_eq!(label, Label::Number(1.0)),
            other => panic!("unexpected {:?}", other),
        }
        assert!(encoding.decode(&[0.5, 0.5]).is_err());
    }

    #[test]
    fn test_class_values_empty_for_one_hot_and_regression() {
        let one_hot = TargetEncoding::OneHot {
            labels: vec![Label::Text("A".into()), Label::Text("B".into())],
        };
        assert!(one_hot.class_values().is_empty());
        assert!(TargetEncoding::MinMax { min: 0.0, max: 1.0 }
            .class_values()
            .is_empty());
    }

    #[test]
    fn test_decode_min_max_inverts_encoding() {
        let encoding = TargetEncoding::MinMax {
            min: 10.0,
            max: 30.0,
        };
        let mut out = [0.0];
        encoding.encode_into(&RawValue::Number(25.0), &mut out).unwrap();
        match encoding.decode(&out).unwrap() {
            Prediction::Value(v) => assert!((v - 25.0).abs() < 1e-9),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_nearest_index_clamps() {
        assert_eq!(nearest_index(-3.0, 3), 0);
        assert_eq!(nearest_index(1.4, 3), 1);
        assert_eq!(nearest_index(1.5, 3), 2);
        assert_eq!(nearest_index(9.0, 3), 2);
        assert_eq!(nearest_index(f64::NAN, 3), 0);
    }

    #[test]
    fn test_argmax_first_wins_ties() {
        assert_eq!(argmax(&[0.5, 0.5, 0.1]), 0);
        assert_eq!(argmax(&[0.0, 0.2, 0.9]), 2);
    }
}
