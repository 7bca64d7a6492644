//! Data preprocessing: encoding, normalization and splitting.
//!
//! Fitted state is kept apart from the data it was fitted on, following the
//! same fit/transform split used throughout this crate.
//!
//! # Core Traits
//!
//! - [`Transformer`]: Unfitted transformer with hyperparameters
//! - [`FittedTransformer`]: Fitted transformer ready for inference
//!
//! # Stages
//!
//! ## Encoding
//! - [`FeatureEncoder`]: feature columns to a numeric matrix under a [`CategoricalPolicy`]
//! - [`TargetEncoder`]: target column to one-hot, scalar or min-max encoded targets
//!
//! ## Scaling
//! - [`StandardScaler`]: Z-score normalization with a zero-variance guard
//!
//! ## Splitting
//! - [`train_test_split`]: seeded or entropy-driven row permutation
//!
//! ## Combined state
//! - [`Preprocessor`]: every fitted stage for one dataset, persistable as a
//!   [`PreprocessingState`]
//!
//! # Example
//!
//! ```rust
//! use tabular_nn::dataset::{analyze, parse_csv};
//! use tabular_nn::preprocessing::{CategoricalPolicy, Preprocessor};
//!
//! let table = parse_csv("x,y\n1,0.5\n2,1.5\n3,2.5\n").unwrap();
//! let descriptor = analyze(&table, "y").unwrap();
//! let (preprocessor, data) =
//!     Preprocessor::fit(&table, descriptor, CategoricalPolicy::Zero).unwrap();
//!
//! assert_eq!(data.features.dim(), (3, 1));
//! assert_eq!(preprocessor.target_encoder().output_width(), 1);
//! ```

pub mod encoding;
pub mod preprocessor;
pub mod scaling;
pub mod split;
pub mod traits;

pub use encoding::{
    CategoricalPolicy, FeatureEncoder, FittedFeatureEncoder, FittedTargetEncoder, Prediction,
    TargetEncoder, TargetEncoding,
};
pub use preprocessor::{EncodedDataset, PreprocessingState, Preprocessor};
pub use scaling::{FittedStandardScaler, NormalizationParams, StandardScaler};
pub use split::{train_test_split, train_test_split_with_rng, SplitIndices, TrainTestSplit};
pub use traits::{FittedTransformer, Transformer};
