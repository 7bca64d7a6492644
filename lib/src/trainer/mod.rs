//! Training orchestration around an external model.
//!
//! A [`Trainer`] reconciles the split targets with the model's declared
//! shape, hands the train set to the collaborator's own loop and scores the
//! test set afterwards. Numeric class labels given through
//! [`Trainer::with_class_values`] decide which one-hot column a scalar
//! target lands in when the model has one output unit per class.

use crate::architecture::{ArchitectureRecommendation, LossKind};
use crate::dataset::InMemoryDataset;
use crate::error::PipelineError;
use crate::model::{EpochLog, EvaluationMetrics, FitConfig, Model, TrainingSummary};
use crate::preprocessing::split::TrainTestSplit;
use crate::reconcile::{reconcile, ReconcileAction};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Lifecycle of the training run owned by a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingStatus {
    #[default]
    Idle,
    Training,
    Completed,
    Failed,
}

impl TrainingStatus {
    /// Whether a new run may start.
    pub fn is_ready(&self) -> bool {
        !matches!(self, TrainingStatus::Training)
    }
}

/// Everything a finished run produced.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingReport {
    pub summary: TrainingSummary,
    /// `None` when the test set is empty.
    pub evaluation: Option<EvaluationMetrics>,
    /// Target reshape applied before fitting.
    pub reconciliation: ReconcileAction,
}

/// Drives one model through reconcile, fit and evaluate.
///
/// Collaborator failures are wrapped as [`PipelineError::Training`] naming
/// the step that failed. There is no retry, timeout or cancellation.
#[derive(Clone, Debug, PartialEq)]
pub struct Trainer {
    pub(crate) epochs: usize,
    pub(crate) batch_size: usize,
    pub(crate) loss: LossKind,
    pub(crate) validate_on_test: bool,
    pub(crate) class_values: Vec<f64>,
}

/// Fluent builder for a [`Trainer`].
///
/// Defaults:
/// - `epochs`: 100
/// - `batch_size`: 32
/// - `validate_on_test`: false
#[derive(Clone, Debug)]
pub struct TrainerBuilder {
    epochs: usize,
    batch_size: usize,
    loss: LossKind,
    validate_on_test: bool,
    class_values: Vec<f64>,
}

impl TrainerBuilder {
    pub fn new(loss: LossKind) -> Self {
        Self {
            epochs: 100,
            batch_size: 32,
            loss,
            validate_on_test: false,
            class_values: Vec::new(),
        }
    }

    pub fn epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Score the test set after every epoch as validation data.
    pub fn validate_on_test(mut self, validate: bool) -> Self {
        self.validate_on_test = validate;
        self
    }

    /// Numeric labels, in label order, of a scalar classification target.
    pub fn class_values(mut self, values: Vec<f64>) -> Self {
        self.class_values = values;
        self
    }

    pub fn build(self) -> Result<Trainer, PipelineError> {
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(Trainer {
            epochs: self.epochs,
            batch_size: self.batch_size,
            loss: self.loss,
            validate_on_test: self.validate_on_test,
            class_values: self.class_values,
        })
    }
}

impl Trainer {
    pub fn builder(loss: LossKind) -> TrainerBuilder {
        TrainerBuilder::new(loss)
    }

    /// Trainer using the epochs, batch size and loss of a recommendation.
    pub fn from_recommendation(recommendation: &ArchitectureRecommendation) -> Self {
        Self {
            epochs: recommendation.epochs,
            batch_size: recommendation.batch_size.max(1),
            loss: recommendation.recommended_loss(),
            validate_on_test: false,
            class_values: Vec::new(),
        }
    }

    /// Same trainer, mapping scalar targets through `values` when they are
    /// expanded to one-hot.
    pub fn with_class_values(mut self, values: Vec<f64>) -> Self {
        self.class_values = values;
        self
    }

    pub fn epochs(&self) -> usize {
        self.epochs
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn loss(&self) -> LossKind {
        self.loss
    }

    pub fn class_values(&self) -> &[f64] {
        &self.class_values
    }

    /// Reconcile targets with `model`, fit it on the train set and evaluate
    /// it on the test set.
    ///
    /// The reconciled copies of the split matrices are released before this
    /// returns. Evaluation is skipped when the test set is empty.
    pub fn fit(
        &self,
        model: &mut dyn Model,
        split: &TrainTestSplit,
        on_epoch_end: &mut dyn FnMut(&EpochLog),
    ) -> Result<TrainingReport, PipelineError> {
        let reconciled = reconcile(
            model.shape(),
            split.n_features(),
            split.train_y.clone(),
            self.loss,
            &self.class_values,
        )?;
        let action = reconciled.action;
        let train = InMemoryDataset::new(split.train_x.clone(), reconciled.targets)?;
        let test_y = action.apply(split.test_y.clone(), &self.class_values);
        let test = InMemoryDataset::new(split.test_x.clone(), test_y)?;

        info!(
            train = train.len(),
            test = test.len(),
            epochs = self.epochs,
            batch_size = self.batch_size,
            loss = %self.loss,
            "training started"
        );

        let config = FitConfig {
            epochs: self.epochs,
            batch_size: self.batch_size,
            validation: (self.validate_on_test && !test.is_empty()).then_some(&test),
        };
        let summary = model
            .fit(&train, &config, on_epoch_end)
            .map_err(|e| PipelineError::training("fit", e))?;
        drop(train);

        let evaluation = if test.is_empty() {
            debug!("test set is empty, no evaluation metrics");
            None
        } else {
            Some(
                model
                    .evaluate(&test, self.batch_size)
                    .map_err(|e| PipelineError::training("evaluate", e))?,
            )
        };

        info!(
            epochs = summary.epochs_run,
            final_loss = summary.final_loss,
            test_loss = ?evaluation.map(|m| m.loss),
            test_accuracy = ?evaluation.and_then(|m| m.accuracy),
            "training finished"
        );

        Ok(TrainingReport {
            summary,
            evaluation,
            reconciliation: action,
        })
    }
}
