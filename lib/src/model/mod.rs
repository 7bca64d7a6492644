//! Collaborator interfaces for building, training and querying a network.
//!
//! The pipeline never runs the network math itself. It hands a
//! [`ModelSpec`] to a [`ModelBuilder`] and drives the returned [`Model`]
//! through `fit`, `evaluate` and `predict`, reading only the model's
//! declared input and output widths.
//!
//! Collaborators report failures as an opaque [`ModelError`]; the
//! [`Trainer`](crate::trainer::Trainer) wraps them with the pipeline step
//! that was running.

pub mod linear;
pub mod metrics;

pub use linear::{LinearModel, LinearModelBuilder};

use crate::architecture::ModelSpec;
use crate::dataset::InMemoryDataset;
use crate::reconcile::ModelShape;
use serde::{Deserialize, Serialize};

/// Opaque failure raised by an external model implementation.
pub type ModelError = Box<dyn std::error::Error + Send + Sync>;

/// Metrics reported at the end of one epoch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpochLog {
    /// Zero-based epoch number.
    pub epoch: usize,
    pub loss: f64,
    /// Present for classification losses.
    pub accuracy: Option<f64>,
    pub val_loss: Option<f64>,
    pub val_accuracy: Option<f64>,
}

/// Training loop settings passed to [`Model::fit`].
#[derive(Clone, Copy, Debug)]
pub struct FitConfig<'a> {
    pub epochs: usize,
    pub batch_size: usize,
    /// Held-out data scored after every epoch.
    pub validation: Option<&'a InMemoryDataset>,
}

/// Outcome of a completed [`Model::fit`] call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub epochs_run: usize,
    pub final_loss: f64,
    /// Present for classification losses.
    pub final_accuracy: Option<f64>,
    pub history: Vec<EpochLog>,
}

/// Loss and, for classification, accuracy on a dataset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub loss: f64,
    pub accuracy: Option<f64>,
}

/// A built network.
///
/// `fit` must call `on_epoch_end` once per epoch, in increasing epoch
/// order, from the calling thread.
pub trait Model {
    fn input_width(&self) -> usize;

    fn output_width(&self) -> usize;

    fn shape(&self) -> ModelShape {
        ModelShape {
            input_width: self.input_width(),
            output_width: self.output_width(),
        }
    }

    fn fit(
        &mut self,
        train: &InMemoryDataset,
        config: &FitConfig<'_>,
        on_epoch_end: &mut dyn FnMut(&EpochLog),
    ) -> Result<TrainingSummary, ModelError>;

    fn evaluate(
        &self,
        data: &InMemoryDataset,
        batch_size: usize,
    ) -> Result<EvaluationMetrics, ModelError>;

    /// Predict one normalized sample.
    fn predict(&self, input: &[f64]) -> Result<Vec<f64>, ModelError>;
}

/// Constructs a [`Model`] from a complete description.
pub trait ModelBuilder {
    fn build(&self, spec: &ModelSpec) -> Result<Box<dyn Model>, ModelError>;
}
