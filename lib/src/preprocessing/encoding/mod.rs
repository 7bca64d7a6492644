//! Encoders that turn raw cells into numeric matrices.
//!
//! - [`FeatureEncoder`]: feature columns → `(n_samples, n_features)` matrix
//! - [`TargetEncoder`]: target column → `(n_samples, output_width)` matrix

pub mod feature;
pub mod target;

pub use feature::{CategoricalPolicy, FeatureEncoder, FeatureEncoderParams, FittedFeatureEncoder};
pub use target::{
    argmax, nearest_index, FittedTargetEncoder, Prediction, TargetEncoder, TargetEncoderParams,
    TargetEncoding, RANGE_EPSILON,
};
