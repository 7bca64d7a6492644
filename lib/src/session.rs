//! Single-user pipeline session.
//!
//! A [`Session`] owns everything derived from the most recent upload: the
//! fitted preprocessing state, the train/test split, the architecture
//! recommendation and, after training, the model. Loading a new file replaces
//! all of it.
//!
//! ```rust
//! use tabular_nn::config::PipelineConfig;
//! use tabular_nn::dataset::RawValue;
//! use tabular_nn::model::LinearModelBuilder;
//! use tabular_nn::session::Session;
//!
//! let mut csv = String::from("x1,x2,label\n");
//! for i in 0..30 {
//!     let label = if i % 2 == 0 { "even" } else { "odd" };
//!     csv.push_str(&format!("{},{},{}\n", i, i % 2, label));
//! }
//!
//! let mut session = Session::new(PipelineConfig::new().with_seed(1)).unwrap();
//! session.load_csv(&csv, "label").unwrap();
//! session.train(&LinearModelBuilder::new(), &mut |_| {}).unwrap();
//!
//! let prediction = session
//!     .predict(&[RawValue::Number(4.0), RawValue::Number(0.0)])
//!     .unwrap();
//! println!("{:?}", prediction);
//! ```

use crate::architecture::{recommend_for, ArchitectureRecommendation, ModelSpec};
use crate::config::PipelineConfig;
use crate::dataset::{analyze_with_threshold, CsvIngestor, DatasetDescriptor, RawValue};
use crate::error::PipelineError;
use crate::model::{EpochLog, Model, ModelBuilder};
use crate::preprocessing::encoding::Prediction;
use crate::preprocessing::split::{train_test_split, TrainTestSplit};
use crate::preprocessing::Preprocessor;
use crate::trainer::{Trainer, TrainingReport, TrainingStatus};
use tracing::info;

/// State derived from one uploaded table.
struct LoadedDataset {
    preprocessor: Preprocessor,
    split: TrainTestSplit,
    recommendation: ArchitectureRecommendation,
}

/// Explicit pipeline context: one dataset, at most one model.
pub struct Session {
    config: PipelineConfig,
    dataset: Option<LoadedDataset>,
    model: Option<Box<dyn Model>>,
    status: TrainingStatus,
    last_report: Option<TrainingReport>,
}

impl Session {
    /// # Errors
    /// [`PipelineError::InvalidConfig`] if `config` does not validate.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            dataset: None,
            model: None,
            status: TrainingStatus::Idle,
            last_report: None,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Ingest, analyze, encode, normalize and split `text`.
    ///
    /// On success the previous dataset, model and normalization parameters
    /// are discarded. On failure the session is left unchanged.
    pub fn load_csv(
        &mut self,
        text: &str,
        target: &str,
    ) -> Result<&DatasetDescriptor, PipelineError> {
        let table = CsvIngestor::new()
            .with_delimiter(self.config.delimiter)
            .parse_str(text)?;
        let descriptor =
            analyze_with_threshold(&table, target, self.config.classification_threshold)?;
        let (preprocessor, encoded) =
            Preprocessor::fit(&table, descriptor, self.config.categorical_policy)?;
        drop(table);

        let split = train_test_split(
            encoded.features,
            encoded.targets,
            self.config.test_fraction,
            self.config.seed,
        )?;
        let recommendation = recommend_for(preprocessor.descriptor());

        info!(
            samples = preprocessor.descriptor().n_samples,
            features = preprocessor.descriptor().n_features(),
            task = %preprocessor.descriptor().task,
            train = split.train_x.nrows(),
            test = split.test_x.nrows(),
            "dataset loaded"
        );

        self.model = None;
        self.last_report = None;
        self.status = TrainingStatus::Idle;
        let loaded = self.dataset.insert(LoadedDataset {
            preprocessor,
            split,
            recommendation,
        });
        Ok(loaded.preprocessor.descriptor())
    }

    pub fn descriptor(&self) -> Option<&DatasetDescriptor> {
        self.dataset.as_ref().map(|d| d.preprocessor.descriptor())
    }

    pub fn preprocessor(&self) -> Option<&Preprocessor> {
        self.dataset.as_ref().map(|d| &d.preprocessor)
    }

    pub fn split(&self) -> Option<&TrainTestSplit> {
        self.dataset.as_ref().map(|d| &d.split)
    }

    pub fn recommendation(&self) -> Result<&ArchitectureRecommendation, PipelineError> {
        Ok(&self.loaded()?.recommendation)
    }

    /// Model description for the loaded dataset under the recommendation.
    pub fn model_spec(&self) -> Result<ModelSpec, PipelineError> {
        let loaded = self.loaded()?;
        loaded
            .recommendation
            .model_spec(loaded.preprocessor.descriptor().n_features())
            .build()
    }

    /// Build and train a model with the recommended hyperparameters.
    pub fn train(
        &mut self,
        builder: &dyn ModelBuilder,
        on_epoch_end: &mut dyn FnMut(&EpochLog),
    ) -> Result<&TrainingReport, PipelineError> {
        let trainer = Trainer::from_recommendation(self.recommendation()?);
        self.train_with(builder, &trainer, on_epoch_end)
    }

    /// Build and train a model with an explicit [`Trainer`].
    ///
    /// A failed run leaves the session without a model and with status
    /// [`TrainingStatus::Failed`], ready for another attempt.
    pub fn train_with(
        &mut self,
        builder: &dyn ModelBuilder,
        trainer: &Trainer,
        on_epoch_end: &mut dyn FnMut(&EpochLog),
    ) -> Result<&TrainingReport, PipelineError> {
        if !self.status.is_ready() {
            return Err(PipelineError::Training(
                "a training run is already in progress".to_string(),
            ));
        }
        let spec = self.model_spec()?;
        let loaded = self
            .dataset
            .as_ref()
            .ok_or_else(|| PipelineError::Schema("no dataset loaded".to_string()))?;
        let split = &loaded.split;
        let class_values = loaded.preprocessor.target_encoder().encoding().class_values();
        let trainer = if trainer.class_values().is_empty() {
            trainer.clone().with_class_values(class_values)
        } else {
            trainer.clone()
        };

        self.model = None;
        self.last_report = None;
        self.status = TrainingStatus::Training;

        let result = builder
            .build(&spec)
            .map_err(|e| PipelineError::training("build", e))
            .and_then(|mut model| {
                trainer
                    .fit(model.as_mut(), split, on_epoch_end)
                    .map(|report| (model, report))
            });

        match result {
            Ok((model, report)) => {
                self.status = TrainingStatus::Completed;
                self.model = Some(model);
                Ok(self.last_report.insert(report))
            }
            Err(e) => {
                self.status = TrainingStatus::Failed;
                Err(e)
            }
        }
    }

    /// Predict one raw sample given in feature order.
    ///
    /// The sample is encoded and normalized with the stored parameters of
    /// the loaded dataset, never refitted.
    pub fn predict(&self, raw: &[RawValue]) -> Result<Prediction, PipelineError> {
        let preprocessor = &self.loaded()?.preprocessor;
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| PipelineError::Training("no trained model".to_string()))?;

        let input = preprocessor.prepare_row(raw)?;
        let output = model
            .predict(&input)
            .map_err(|e| PipelineError::training("predict", e))?;
        preprocessor.decode(&output)
    }

    pub fn status(&self) -> TrainingStatus {
        self.status
    }

    pub fn last_report(&self) -> Option<&TrainingReport> {
        self.last_report.as_ref()
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    fn loaded(&self) -> Result<&LoadedDataset, PipelineError> {
        self.dataset
            .as_ref()
            .ok_or_else(|| PipelineError::Schema("no dataset loaded".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Label, TaskType};
    use crate::model::{LinearModelBuilder, ModelError};

    fn three_class_csv() -> String {
        let mut csv = String::from("x1,x2,label\n");
        let labels = ["A", "B", "C"];
        for i in 0..20 {
            csv.push_str(&format!("{},{},{}\n", i, (i * 3) % 7, labels[i % 3]));
        }
        csv
    }

    fn session() -> Session {
        Session::new(PipelineConfig::new().with_seed(42)).unwrap()
    }

    struct FailingBuilder;

    impl ModelBuilder for FailingBuilder {
        fn build(&self, _spec: &ModelSpec) -> Result<Box<dyn Model>, ModelError> {
            Err("no device".into())
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(Session::new(PipelineConfig::new().with_test_fraction(1.5)).is_err());
    }

    #[test]
    fn test_requires_dataset() {
        let s = session();
        assert!(matches!(s.recommendation(), Err(PipelineError::Schema(_))));
        assert!(s.model_spec().is_err());
        assert!(s.predict(&[RawValue::Number(1.0)]).is_err());
    }

    #[test]
    fn test_load_csv_builds_split_and_recommendation() {
        let mut s = session();
        let descriptor = s.load_csv(&three_class_csv(), "label").unwrap();
        assert_eq!(descriptor.task, TaskType::Classification);
        assert_eq!(descriptor.label_names(), vec!["A", "B", "C"]);

        let split = s.split().unwrap();
        assert_eq!(split.train_x.dim(), (16, 2));
        assert_eq!(split.test_x.dim(), (4, 2));
        assert_eq!(split.train_y.ncols(), 3);

        let spec = s.model_spec().unwrap();
        assert_eq!(spec.input_width(), 2);
        assert_eq!(spec.output_width(), 3);
    }

    #[test]
    fn test_train_then_predict() {
        let mut s = session();
        s.load_csv(&three_class_csv(), "label").unwrap();

        let mut epochs = 0;
        let report = s
            .train(&LinearModelBuilder::new(), &mut |_| epochs += 1)
            .unwrap();
        assert_eq!(report.summary.epochs_run, 200);
        assert!(report.evaluation.is_some());
        assert_eq!(epochs, 200);
        assert_eq!(s.status(), TrainingStatus::Completed);

        match s
            .predict(&[RawValue::Number(3.0), RawValue::Number(2.0)])
            .unwrap()
        {
            Prediction::Class { label, index, .. } => {
                assert!(index < 3);
                assert!(matches!(label, Label::Text(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_failed_run_is_ready_again() {
        let mut s = session();
        s.load_csv(&three_class_csv(), "label").unwrap();

        let err = s.train(&FailingBuilder, &mut |_| {}).unwrap_err();
        assert!(matches!(err, PipelineError::Training(_)));
        assert_eq!(s.status(), TrainingStatus::Failed);
        assert!(!s.has_model());

        s.train(&LinearModelBuilder::new(), &mut |_| {}).unwrap();
        assert_eq!(s.status(), TrainingStatus::Completed);
    }

    #[test]
    fn test_reload_discards_previous_state() {
        let mut s = session();
        s.load_csv(&three_class_csv(), "label").unwrap();
        s.train(&LinearModelBuilder::new(), &mut |_| {}).unwrap();
        assert!(s.has_model());

        let mut csv = String::from("a,b,c,y\n");
        for i in 0..50 {
            csv.push_str(&format!("{},{},{},{}\n", i, i * 2, 1, i as f64 * 0.37));
        }
        s.load_csv(&csv, "y").unwrap();
        assert!(!s.has_model());
        assert!(s.last_report().is_none());
        assert_eq!(s.status(), TrainingStatus::Idle);
        assert_eq!(s.descriptor().unwrap().task, TaskType::Regression);
        assert_eq!(s.preprocessor().unwrap().scaler().params().n_features(), 3);
    }

    #[test]
    fn test_failed_load_keeps_previous_dataset() {
        let mut s = session();
        s.load_csv(&three_class_csv(), "label").unwrap();
        assert!(s.load_csv("x,label\n1,A\n", "missing").is_err());
        assert_eq!(s.descriptor().unwrap().n_samples, 20);
    }
}
