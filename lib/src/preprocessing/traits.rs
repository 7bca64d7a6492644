//! Fit/transform traits shared by the encoders and the normalizer.
//!
//! - [`Transformer`]: learns state from a full dataset.
//! - [`FittedTransformer`]: applies that state and exposes it as plain params.
//!
//! Fitting happens once per uploaded dataset. The fitted state is then reused
//! unchanged for every later transform, including single-sample prediction
//! inputs, so a sample is always encoded exactly like the training data was.

use crate::error::PipelineError;
use crate::serialization::SerializableParams;
use std::path::Path;

/// A preprocessing stage before it has seen data.
///
/// # Example
/// ```rust
/// use ndarray::array;
/// use tabular_nn::preprocessing::{FittedTransformer, StandardScaler, Transformer};
///
/// let data = array![[0.0, 1.0], [2.0, 3.0]];
/// let fitted = StandardScaler::new().fit(&data).unwrap();
/// let scaled = fitted.transform(&data).unwrap();
/// assert!((scaled[[0, 0]] + 1.0).abs() < 1e-12);
/// ```
pub trait Transformer: Clone {
    /// Input data type for fitting and transformation.
    type Input: ?Sized;
    /// Output data type after transformation.
    type Output;
    /// The fitted transformer type ready for inference.
    type Fitted: FittedTransformer<Input = Self::Input, Output = Self::Output>;

    /// Learn parameters from the data.
    ///
    /// # Errors
    /// Returns [`PipelineError`] if the data is empty or has an unusable shape.
    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PipelineError>;

    /// Fit the transformer and transform the same data in one step.
    fn fit_transform(&self, data: &Self::Input) -> Result<Self::Output, PipelineError> {
        let fitted = self.fit(data)?;
        fitted.transform(data)
    }
}

/// A preprocessing stage with learned state.
///
/// # Guarantees
/// - `extract_params()` + `from_params()` is a round-trip.
/// - `save_to_file` / `load_from_file` use the same byte format as
///   [`SerializableParams`].
pub trait FittedTransformer: Clone {
    /// Input data type for transformation.
    type Input: ?Sized;
    /// Output data type after transformation.
    type Output;
    /// Plain-data copy of the learned state.
    type Params: SerializableParams;

    /// Apply the learned state to `data`.
    ///
    /// # Errors
    /// Returns [`PipelineError`] if the input does not have the shape seen
    /// during fit or contains values the fitted state cannot map.
    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PipelineError>;

    fn extract_params(&self) -> Self::Params;

    /// Rebuild from params, validating their shape.
    fn from_params(params: Self::Params) -> Result<Self, PipelineError>
    where
        Self: Sized;

    /// Number of input columns seen during fit.
    fn n_features_in(&self) -> usize;

    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PipelineError> {
        self.extract_params().save_to_file(path)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError>
    where
        Self: Sized,
    {
        let params = Self::Params::load_from_file(path)?;
        Self::from_params(params)
    }
}
