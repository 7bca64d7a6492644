//! Pipeline configuration.
//!
//! Every knob the preprocessing pipeline exposes lives in [`PipelineConfig`].
//! Configurations are plain serde types so they can be loaded from JSON:
//!
//! ```rust
//! use tabular_nn::config::PipelineConfig;
//!
//! let config = PipelineConfig::from_json_str(r#"{ "test_fraction": 0.25, "seed": 7 }"#).unwrap();
//! assert_eq!(config.seed, Some(7));
//! assert_eq!(config.classification_threshold, 10);
//! ```

use crate::error::PipelineError;
use crate::preprocessing::encoding::CategoricalPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default maximum number of distinct target values treated as classes.
pub const DEFAULT_CLASSIFICATION_THRESHOLD: usize = 10;

/// Default share of samples held out for evaluation.
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Configuration for a preprocessing [`Session`](crate::session::Session).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Field delimiter of the uploaded text.
    pub delimiter: u8,
    /// A target with at most this many distinct values is a classification target.
    pub classification_threshold: usize,
    /// Share of samples placed in the test set.
    pub test_fraction: f64,
    /// Seed for the train/test permutation. `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// How non-numeric feature cells are turned into numbers.
    pub categorical_policy: CategoricalPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            classification_threshold: DEFAULT_CLASSIFICATION_THRESHOLD,
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: None,
            categorical_policy: CategoricalPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_classification_threshold(mut self, threshold: usize) -> Self {
        self.classification_threshold = threshold;
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    /// Fix the train/test permutation so splits are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_categorical_policy(mut self, policy: CategoricalPolicy) -> Self {
        self.categorical_policy = policy;
        self
    }

    /// Check value ranges.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidConfig`] if the test fraction is not in
    /// `[0, 1]` or the classification threshold is zero.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(0.0..=1.0).contains(&self.test_fraction) {
            return Err(PipelineError::InvalidConfig(format!(
                "test_fraction must be in [0, 1], got {}",
                self.test_fraction
            )));
        }
        if self.classification_threshold == 0 {
            return Err(PipelineError::InvalidConfig(
                "classification_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, PipelineError> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.delimiter, b',');
        assert_eq!(config.classification_threshold, 10);
        assert!((config.test_fraction - 0.2).abs() < 1e-12);
        assert_eq!(config.seed, None);
        assert_eq!(config.categorical_policy, CategoricalPolicy::Zero);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder_chaining() {
        let config = PipelineConfig::new()
            .with_delimiter(b';')
            .with_test_fraction(0.3)
            .with_seed(42)
            .with_categorical_policy(CategoricalPolicy::Ordinal);

        assert_eq!(config.delimiter, b';');
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.categorical_policy, CategoricalPolicy::Ordinal);
    }

    #[test]
    fn test_config_rejects_bad_fraction() {
        let config = PipelineConfig::new().with_test_fraction(1.5);
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_rejects_zero_threshold() {
        let config = PipelineConfig::new().with_classification_threshold(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_json_partial() {
        let config =
            PipelineConfig::from_json_str(r#"{ "categorical_policy": "ordinal", "seed": 3 }"#)
                .unwrap();
        assert_eq!(config.categorical_policy, CategoricalPolicy::Ordinal);
        assert_eq!(config.seed, Some(3));
        assert!((config.test_fraction - DEFAULT_TEST_FRACTION).abs() < 1e-12);
    }

    #[test]
    fn test_config_from_json_invalid() {
        let result = PipelineConfig::from_json_str(r#"{ "test_fraction": -0.1 }"#);
        assert!(result.is_err());
        let result = PipelineConfig::from_json_str("not json");
        assert!(matches!(result, Err(PipelineError::Serialization(_))));
    }
}
