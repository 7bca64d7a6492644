//! Feature matrix encoding.
//!
//! Numeric cells pass through unchanged. What happens to text cells is an
//! explicit [`CategoricalPolicy`]:
//!
//! | Policy | Text cell becomes |
//! |--------|-------------------|
//! | [`CategoricalPolicy::Zero`] | `0.0` (default) |
//! | [`CategoricalPolicy::Ordinal`] | index of first occurrence of that text in its column |

use crate::dataset::{RawTable, RawValue};
use crate::error::PipelineError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How non-numeric feature cells are mapped to numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoricalPolicy {
    /// Every text cell becomes `0.0`.
    #[default]
    Zero,
    /// Text cells become their first-occurrence index within the column.
    /// A text value not seen during fit is an encoding error.
    Ordinal,
}

/// Encodes the feature columns of a table into a numeric matrix (unfitted).
#[derive(Clone, Debug)]
pub struct FeatureEncoder {
    feature_names: Vec<String>,
    policy: CategoricalPolicy,
}

impl FeatureEncoder {
    /// Encoder for the given columns, in output order.
    pub fn new(feature_names: Vec<String>) -> Self {
        Self {
            feature_names,
            policy: CategoricalPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CategoricalPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Transformer for FeatureEncoder {
    type Input = RawTable;
    type Output = Array2<f64>;
    type Fitted = FittedFeatureEncoder;

    fn fit(&self, table: &RawTable) -> Result<FittedFeatureEncoder, PipelineError> {
        let indices = column_indices(table, &self.feature_names)?;

        let vocabularies = match self.policy {
            CategoricalPolicy::Zero => vec![Vec::new(); indices.len()],
            CategoricalPolicy::Ordinal => indices
                .iter()
                .map(|&idx| {
                    let mut vocab: Vec<String> = Vec::new();
                    for value in table.column(idx) {
                        if let RawValue::Text(s) = value {
                            if !vocab.contains(s) {
                                vocab.push(s.clone());
                            }
                        }
                    }
                    vocab
                })
                .collect(),
        };

        Ok(FittedFeatureEncoder {
            params: FeatureEncoderParams {
                feature_names: self.feature_names.clone(),
                policy: self.policy,
                vocabularies,
            },
        })
    }
}

/// Serializable parameters for a fitted FeatureEncoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoderParams {
    pub feature_names: Vec<String>,
    pub policy: CategoricalPolicy,
    /// Per-feature text values in first-occurrence order. Empty under `Zero`.
    pub vocabularies: Vec<Vec<String>>,
}

/// Fitted FeatureEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedFeatureEncoder {
    params: FeatureEncoderParams,
}

impl FittedFeatureEncoder {
    pub fn feature_names(&self) -> &[String] {
        &self.params.feature_names
    }

    pub fn policy(&self) -> CategoricalPolicy {
        self.params.policy
    }

    /// Encode one sample whose cells are given in feature order.
    pub fn transform_row(&self, row: &[RawValue]) -> Result<Vec<f64>, PipelineError> {
        if row.len() != self.n_features_in() {
            return Err(PipelineError::shape(
                "feature row",
                format!("{} features", self.n_features_in()),
                format!("{} features", row.len()),
            ));
        }
        row.iter()
            .enumerate()
            .map(|(j, value)| self.encode_cell(j, value))
            .collect()
    }

    fn encode_cell(&self, feature: usize, value: &RawValue) -> Result<f64, PipelineError> {
        match (value, self.params.policy) {
            (RawValue::Number(v), _) => Ok(*v),
            (RawValue::Text(_), CategoricalPolicy::Zero) => Ok(0.0),
            (RawValue::Text(s), CategoricalPolicy::Ordinal) => self.params.vocabularies[feature]
                .iter()
                .position(|v| v == s)
                .map(|i| i as f64)
                .ok_or_else(|| {
                    PipelineError::Encoding(format!(
                        "unknown category '{}' in feature '{}'",
                        s, self.params.feature_names[feature]
                    ))
                }),
        }
    }
}

impl FittedTransformer for FittedFeatureEncoder {
    type Input = RawTable;
    type Output = Array2<f64>;
    type Params = FeatureEncoderParams;

    fn transform(&self, table: &RawTable) -> Result<Array2<f64>, PipelineError> {
        let indices = column_indices(table, &self.params.feature_names)?;
        let mut out = Array2::zeros((table.n_rows(), indices.len()));

        for (i, row) in table.rows().iter().enumerate() {
            for (j, &idx) in indices.iter().enumerate() {
                if let Some(value) = row.get(idx) {
                    out[[i, j]] = self.encode_cell(j, value)?;
                }
            }
        }

        debug!(shape = ?out.dim(), policy = ?self.params.policy, "encoded features");
        Ok(out)
    }

    fn extract_params(&self) -> FeatureEncoderParams {
        self.params.clone()
    }

    fn from_params(params: FeatureEncoderParams) -> Result<Self, PipelineError> {
        if params.policy == CategoricalPolicy::Ordinal
            && params.vocabularies.len() != params.feature_names.len()
        {
            return Err(PipelineError::shape(
                "feature encoder params",
                format!("{} vocabularies", params.feature_names.len()),
                format!("{} vocabularies", params.vocabularies.len()),
            ));
        }
        Ok(Self { params })
    }

    fn n_features_in(&self) -> usize {
        self.params.feature_names.len()
    }
}

fn column_indices(table: &RawTable, names: &[String]) -> Result<Vec<usize>, PipelineError> {
    names
        .iter()
        .map(|name| {
            table.column_index(name).ok_or_else(|| {
                PipelineError::Schema(format!("feature column '{}' not found", name))
            })
        })
        .collect()
}
