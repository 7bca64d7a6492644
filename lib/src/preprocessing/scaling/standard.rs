//! Z-score normalization of the feature matrix.
//!
//! Statistics are taken over every sample of the upload, before splitting,
//! and then reused verbatim for prediction inputs:
//! ```text
//! z = (x - u) / s
//! ```
//! where `u` is the column mean, and `s` is the population
//! standard deviation (`ddof = 0`). A feature whose standard deviation is
//! exactly zero stores `s = 1`, so a constant column maps to a constant 0
//! column instead of NaN.
//!
//! # Example
//! ```rust
//! use ndarray::array;
//! use tabular_nn::preprocessing::{FittedTransformer, StandardScaler, Transformer};
//!
//! let data = array![[1.0, 5.0], [3.0, 5.0]];
//! let fitted = StandardScaler::new().fit(&data).unwrap();
//! assert_eq!(fitted.params().std, vec![1.0, 1.0]);
//!
//! // Later, for a single prediction input:
//! let row = fitted.transform_row(&[2.0, 5.0]).unwrap();
//! assert_eq!(row, vec![0.0, 0.0]);
//! ```

use crate::error::PipelineError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Learned normalization parameters.
///
/// Invariant: no entry of `std` is zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    pub mean: Vec<f64>,
    /// Population standard deviation, with zeros replaced by 1.
    pub std: Vec<f64>,
}

impl NormalizationParams {
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }
}

/// Z-score normalizer (unfitted). Has no hyperparameters.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardScaler;

impl StandardScaler {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for StandardScaler {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Fitted = FittedStandardScaler;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PipelineError> {
        let (rows, cols) = data.dim();

        if rows == 0 {
            return Err(PipelineError::Schema(
                "cannot fit StandardScaler on empty data".to_string(),
            ));
        }

        let mean = data
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(cols));
        let std = data
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 { 1.0 } else { s });

        debug!(features = cols, samples = rows, "fitted standard scaler");

        Ok(FittedStandardScaler {
            params: NormalizationParams {
                mean: mean.to_vec(),
                std: std.to_vec(),
            },
            mean,
            std,
        })
    }
}

/// Normalizer holding the statistics of the data it was fitted on.
#[derive(Clone, Debug)]
pub struct FittedStandardScaler {
    params: NormalizationParams,
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl FittedStandardScaler {
    pub fn params(&self) -> &NormalizationParams {
        &self.params
    }

    /// Per-feature mean.
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Per-feature divisor, never zero.
    pub fn std(&self) -> &Array1<f64> {
        &self.std
    }

    /// Normalize a single sample with the stored parameters.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, PipelineError> {
        self.check_features(row.len())?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(self.std.iter()))
            .map(|(&x, (&m, &s))| (x - m) / s)
            .collect())
    }

    /// Reverse the transformation.
    pub fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        self.check_features(data.ncols())?;
        Ok(data * &self.std + &self.mean)
    }

    fn check_features(&self, got: usize) -> Result<(), PipelineError> {
        if got != self.n_features_in() {
            return Err(PipelineError::shape(
                "normalizer input",
                format!("{} features", self.n_features_in()),
                format!("{} features", got),
            ));
        }
        Ok(())
    }
}

impl FittedTransformer for FittedStandardScaler {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = NormalizationParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PipelineError> {
        self.check_features(data.ncols())?;
        Ok((data - &self.mean) / &self.std)
    }

    fn extract_params(&self) -> Self::Params {
        self.params.clone()
    }

    fn from_params(params: Self::Params) -> Result<Self, PipelineError> {
        if params.mean.len() != params.std.len() {
            return Err(PipelineError::shape(
                "normalization params",
                format!("{} std entries", params.mean.len()),
                format!("{} std entries", params.std.len()),
            ));
        }
        if params.std.iter().any(|&s| s == 0.0 || !s.is_finite()) {
            return Err(PipelineError::InvalidConfig(
                "normalization params contain a zero or non-finite std".to_string(),
            ));
        }
        Ok(Self {
            mean: Array1::from(params.mean.clone()),
            std: Array1::from(params.std.clone()),
            params,
        })
    }

    fn n_features_in(&self) -> usize {
        self.params.n_features()
    }
}
