//! Fitted preprocessing state shared by training and prediction.
//!
//! A [`Preprocessor`] bundles everything learned from one uploaded table:
//! the dataset descriptor, the fitted feature and target encoders and the
//! normalization parameters. Fitting it also yields the encoded, normalized
//! matrices for that table. The same state later turns a single raw sample
//! into a normalized model input and a model output back into a label or
//! value.

use crate::dataset::{DatasetDescriptor, RawTable, RawValue};
use crate::error::PipelineError;
use crate::preprocessing::encoding::{
    CategoricalPolicy, FeatureEncoder, FeatureEncoderParams, FittedFeatureEncoder,
    FittedTargetEncoder, Prediction, TargetEncoder, TargetEncoderParams,
};
use crate::preprocessing::scaling::{FittedStandardScaler, NormalizationParams, StandardScaler};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use crate::serialization::SerializableParams;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Normalized features and encoded targets, row `i` of both describing sample `i`.
#[derive(Clone, Debug)]
pub struct EncodedDataset {
    pub features: Array2<f64>,
    pub targets: Array2<f64>,
}

impl EncodedDataset {
    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn output_width(&self) -> usize {
        self.targets.ncols()
    }
}

/// Serializable form of a [`Preprocessor`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingState {
    pub descriptor: DatasetDescriptor,
    pub features: FeatureEncoderParams,
    pub targets: TargetEncoderParams,
    pub normalization: NormalizationParams,
}

/// Fitted encoders and normalizer for one dataset.
#[derive(Clone, Debug)]
pub struct Preprocessor {
    descriptor: DatasetDescriptor,
    features: FittedFeatureEncoder,
    targets: FittedTargetEncoder,
    scaler: FittedStandardScaler,
}

impl Preprocessor {
    /// Fit every stage on `table` and return the encoded matrices alongside.
    ///
    /// Normalization parameters are computed from the full feature matrix,
    /// before any train/test split.
    pub fn fit(
        table: &RawTable,
        descriptor: DatasetDescriptor,
        policy: CategoricalPolicy,
    ) -> Result<(Self, EncodedDataset), PipelineError> {
        let features = FeatureEncoder::new(descriptor.feature_names.clone())
            .with_policy(policy)
            .fit(table)?;
        let raw_features = features.transform(table)?;

        let scaler = StandardScaler::new().fit(&raw_features)?;
        let normalized = scaler.transform(&raw_features)?;
        drop(raw_features);

        let targets = TargetEncoder::new(&descriptor).fit(table)?;
        let encoded_targets = targets.transform(table)?;

        debug!(
            features = ?normalized.dim(),
            targets = ?encoded_targets.dim(),
            "fitted preprocessor"
        );

        Ok((
            Self {
                descriptor,
                features,
                targets,
                scaler,
            },
            EncodedDataset {
                features: normalized,
                targets: encoded_targets,
            },
        ))
    }

    pub fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    pub fn feature_encoder(&self) -> &FittedFeatureEncoder {
        &self.features
    }

    pub fn target_encoder(&self) -> &FittedTargetEncoder {
        &self.targets
    }

    pub fn scaler(&self) -> &FittedStandardScaler {
        &self.scaler
    }

    /// Encode and normalize one sample given in feature order.
    pub fn prepare_row(&self, raw: &[RawValue]) -> Result<Vec<f64>, PipelineError> {
        let encoded = self.features.transform_row(raw)?;
        self.scaler.transform_row(&encoded)
    }

    /// Map a model output vector back to a label or regression value.
    pub fn decode(&self, output: &[f64]) -> Result<Prediction, PipelineError> {
        self.targets.decode(output)
    }

    pub fn state(&self) -> PreprocessingState {
        PreprocessingState {
            descriptor: self.descriptor.clone(),
            features: self.features.extract_params(),
            targets: self.targets.extract_params(),
            normalization: self.scaler.extract_params(),
        }
    }

    /// Rebuild a preprocessor, checking that the parts describe the same features.
    pub fn from_state(state: PreprocessingState) -> Result<Self, PipelineError> {
        if state.features.feature_names != state.descriptor.feature_names {
            return Err(PipelineError::Schema(
                "feature encoder columns differ from the dataset descriptor".to_string(),
            ));
        }
        if state.normalization.n_features() != state.descriptor.n_features() {
            return Err(PipelineError::shape(
                "preprocessing state",
                format!("{} normalization entries", state.descriptor.n_features()),
                format!("{} normalization entries", state.normalization.n_features()),
            ));
        }

        Ok(Self {
            descriptor: state.descriptor,
            features: FittedFeatureEncoder::from_params(state.features)?,
            targets: FittedTargetEncoder::from_params(state.targets)?,
            scaler: FittedStandardScaler::from_params(state.normalization)?,
        })
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PipelineError> {
        self.state().save_to_file(path)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        Self::from_state(PreprocessingState::load_from_file(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{analyze, parse_csv, Label};

    const CSV: &str = "x1,x2,label\n1,10,A\n2,20,B\n3,30,A\n4,40,C\n5,50,B\n";

    fn fitted() -> (Preprocessor, EncodedDataset) {
        let table = parse_csv(CSV).unwrap();
        let descriptor = analyze(&table, "label").unwrap();
        Preprocessor::fit(&table, descriptor, CategoricalPolicy::Zero).unwrap()
    }

    #[test]
    fn test_fit_produces_aligned_matrices() {
        let (pre, data) = fitted();
        assert_eq!(data.features.dim(), (5, 2));
        assert_eq!(data.targets.dim(), (5, 3));
        assert_eq!(pre.descriptor().n_labels(), 3);

        for col in data.features.columns() {
            let mean = col.sum() / col.len() as f64;
            assert!(mean.abs() < 1e-9);
        }
    }

    #[test]
    fn test_prepare_row_matches_training_encoding() {
        let (pre, data) = fitted();
        let row = pre
            .prepare_row(&[RawValue::Number(2.0), RawValue::Number(20.0)])
            .unwrap();
        assert!((row[0] - data.features[[1, 0]]).abs() < 1e-12);
        assert!((row[1] - data.features[[1, 1]]).abs() < 1e-12);
    }

    #[test]
    fn test_decode_uses_label_order() {
        let (pre, _) = fitted();
        match pre.decode(&[0.1, 0.2, 0.7]).unwrap() {
            Prediction::Class { label, index, .. } => {
                assert_eq!(label, Label::Text("C".into()));
                assert_eq!(index, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_state_round_trip_bytes() {
        let (pre, _) = fitted();
        let bytes = pre.state().to_bytes().unwrap();
        let restored = Preprocessor::from_state(PreprocessingState::from_bytes(&bytes).unwrap())
            .unwrap();

        let input = [RawValue::Number(3.5), RawValue::Number(12.0)];
        assert_eq!(
            restored.prepare_row(&input).unwrap(),
            pre.prepare_row(&input).unwrap()
        );
        assert_eq!(restored.state(), pre.state());
    }

    #[test]
    fn test_from_state_rejects_mismatched_parts() {
        let (pre, _) = fitted();
        let mut state = pre.state();
        state.normalization.mean.pop();
        state.normalization.std.pop();
        assert!(matches!(
            Preprocessor::from_state(state),
            Err(PipelineError::Shape { .. })
        ));
    }

    #[test]
    fn test_save_load_file() {
        let (pre, _) = fitted();
        let path = std::env::temp_dir().join("tabular_nn_test_preprocessor.bin");
        pre.save_to_file(&path).unwrap();
        let loaded = Preprocessor::load_from_file(&path).unwrap();
        assert_eq!(loaded.state(), pre.state());
        std::fs::remove_file(&path).ok();
    }
}
