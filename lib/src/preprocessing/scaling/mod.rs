//! Scaling transformers for feature normalization.
//!
//! | Transformer | Description |
//! |-------------|-------------|
//! | [`StandardScaler`] | Z-score normalization (mean=0, std=1) with zero-variance guard |

pub mod standard;

pub use standard::{FittedStandardScaler, NormalizationParams, StandardScaler};
