//! Baseline linear collaborator.
//!
//! [`LinearModel`] maps inputs straight to outputs, `act(X @ W + b)`, and
//! ignores the hidden layers of the [`ModelSpec`]. It exists so the pipeline
//! can be exercised end to end without an external network library.
//!
//! Training is plain mini-batch gradient descent. The gradient with respect
//! to the pre-activation is `p - y`, which is exact for linear outputs under
//! squared error, sigmoid under binary cross-entropy and softmax under
//! categorical cross-entropy. ReLU outputs additionally mask inactive units.
//!
//! Weights start at zero, so training is deterministic for a given batch
//! order.

use super::metrics;
use super::{
    EpochLog, EvaluationMetrics, FitConfig, Model, ModelBuilder, ModelError, TrainingSummary,
};
use crate::architecture::{Activation, LossKind, ModelSpec};
use crate::dataset::InMemoryDataset;
use crate::error::PipelineError;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Serializable parameters of a [`LinearModel`].
///
/// `weights` is row-major with shape `(input_width, output_width)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearParams {
    pub input_width: usize,
    pub output_width: usize,
    pub weights: Vec<f64>,
    pub bias: Vec<f64>,
    pub output_activation: Activation,
    pub loss: LossKind,
    pub learning_rate: f64,
}

/// Single-layer network trained with mini-batch gradient descent.
#[derive(Clone, Debug)]
pub struct LinearModel {
    weights: Array2<f64>,
    bias: Array1<f64>,
    output_activation: Activation,
    loss: LossKind,
    learning_rate: f64,
}

impl LinearModel {
    /// Zero-initialized model.
    pub fn new(
        input_width: usize,
        output_width: usize,
        output_activation: Activation,
        loss: LossKind,
        learning_rate: f64,
    ) -> Self {
        Self {
            weights: Array2::zeros((input_width, output_width)),
            bias: Array1::zeros(output_width),
            output_activation,
            loss,
            learning_rate,
        }
    }

    pub fn from_spec(spec: &ModelSpec) -> Self {
        Self::new(
            spec.input_width(),
            spec.output_width(),
            spec.output_activation(),
            spec.loss(),
            spec.learning_rate(),
        )
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn bias(&self) -> &Array1<f64> {
        &self.bias
    }

    fn is_classifier(&self) -> bool {
        !matches!(self.loss, LossKind::MeanSquaredError)
    }

    fn forward(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let z = x.dot(&self.weights) + &self.bias;
        activate(z, self.output_activation)
    }

    fn step(&mut self, x: ArrayView2<'_, f64>, y: ArrayView2<'_, f64>) {
        let n = x.nrows();
        if n == 0 {
            return;
        }
        let pred = self.forward(x);
        let mut grad = &pred - &y;
        if self.output_activation == Activation::Relu {
            grad.zip_mut_with(&pred, |g, &p| {
                if p <= 0.0 {
                    *g = 0.0;
                }
            });
        }

        let scale = self.learning_rate / n as f64;
        let grad_w = x.t().dot(&grad);
        let grad_b = grad.sum_axis(Axis(0));
        self.weights.scaled_add(-scale, &grad_w);
        self.bias.scaled_add(-scale, &grad_b);
    }

    fn score(&self, data: &InMemoryDataset) -> EvaluationMetrics {
        let pred = self.forward(data.features().view());
        EvaluationMetrics {
            loss: metrics::loss(self.loss, data.targets().view(), pred.view()),
            accuracy: self
                .is_classifier()
                .then(|| metrics::accuracy(data.targets().view(), pred.view())),
        }
    }

    fn check_data(&self, data: &InMemoryDataset, what: &str) -> Result<(), ModelError> {
        if data.n_features() != self.input_width() || data.output_width() != self.output_width() {
            return Err(format!(
                "{} has shape [{} -> {}], model is [{} -> {}]",
                what,
                data.n_features(),
                data.output_width(),
                self.input_width(),
                self.output_width()
            )
            .into());
        }
        Ok(())
    }

    pub fn extract_params(&self) -> LinearParams {
        LinearParams {
            input_width: self.weights.nrows(),
            output_width: self.weights.ncols(),
            weights: self.weights.iter().copied().collect(),
            bias: self.bias.to_vec(),
            output_activation: self.output_activation,
            loss: self.loss,
            learning_rate: self.learning_rate,
        }
    }

    pub fn from_params(params: LinearParams) -> Result<Self, PipelineError> {
        if params.bias.len() != params.output_width {
            return Err(PipelineError::shape(
                "linear model bias",
                format!("{} entries", params.output_width),
                format!("{} entries", params.bias.len()),
            ));
        }
        let weights =
            Array2::from_shape_vec((params.input_width, params.output_width), params.weights)
                .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        Ok(Self {
            weights,
            bias: Array1::from(params.bias),
            output_activation: params.output_activation,
            loss: params.loss,
            learning_rate: params.learning_rate,
        })
    }
}

impl Model for LinearModel {
    fn input_width(&self) -> usize {
        self.weights.nrows()
    }

    fn output_width(&self) -> usize {
        self.weights.ncols()
    }

    fn fit(
        &mut self,
        train: &InMemoryDataset,
        config: &FitConfig<'_>,
        on_epoch_end: &mut dyn FnMut(&EpochLog),
    ) -> Result<TrainingSummary, ModelError> {
        self.check_data(train, "training data")?;
        if train.is_empty() {
            return Err("training data is empty".into());
        }
        if config.batch_size == 0 {
            return Err("batch size must be at least 1".into());
        }
        let validation = match config.validation {
            Some(v) if !v.is_empty() => {
                self.check_data(v, "validation data")?;
                Some(v)
            }
            _ => None,
        };

        let mut history = Vec::with_capacity(config.epochs);
        for epoch in 0..config.epochs {
            for (batch_x, batch_y) in train.batches(config.batch_size) {
                self.step(batch_x, batch_y);
            }

            let train_metrics = self.score(train);
            let val_metrics = validation.map(|v| self.score(v));
            let log = EpochLog {
                epoch,
                loss: train_metrics.loss,
                accuracy: train_metrics.accuracy,
                val_loss: val_metrics.map(|m| m.loss),
                val_accuracy: val_metrics.and_then(|m| m.accuracy),
            };
            if !log.loss.is_finite() {
                return Err(format!("loss diverged at epoch {}", epoch).into());
            }
            debug!(epoch, loss = log.loss, "epoch finished");
            on_epoch_end(&log);
            history.push(log);
        }

        let last = history.last();
        Ok(TrainingSummary {
            epochs_run: history.len(),
            final_loss: last.map(|l| l.loss).unwrap_or(f64::NAN),
            final_accuracy: last.and_then(|l| l.accuracy),
            history,
        })
    }

    fn evaluate(
        &self,
        data: &InMemoryDataset,
        _batch_size: usize,
    ) -> Result<EvaluationMetrics, ModelError> {
        self.check_data(data, "evaluation data")?;
        if data.is_empty() {
            return Err("evaluation data is empty".into());
        }
        Ok(self.score(data))
    }

    fn predict(&self, input: &[f64]) -> Result<Vec<f64>, ModelError> {
        if input.len() != self.input_width() {
            return Err(format!(
                "expected {} inputs, got {}",
                self.input_width(),
                input.len()
            )
            .into());
        }
        let x = ArrayView2::from_shape((1, input.len()), input)?;
        Ok(self.forward(x).row(0).to_vec())
    }
}

/// Builds [`LinearModel`]s, optionally overriding the learning rate of the spec.
#[derive(Clone, Debug, Default)]
pub struct LinearModelBuilder {
    learning_rate: Option<f64>,
}

impl LinearModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = Some(lr);
        self
    }
}

impl ModelBuilder for LinearModelBuilder {
    fn build(&self, spec: &ModelSpec) -> Result<Box<dyn Model>, ModelError> {
        let mut model = LinearModel::from_spec(spec);
        if let Some(lr) = self.learning_rate {
            if !(lr.is_finite() && lr > 0.0) {
                return Err(format!("learning rate must be positive, got {}", lr).into());
            }
            model.learning_rate = lr;
        }
        Ok(Box::new(model))
    }
}

fn activate(mut z: Array2<f64>, activation: Activation) -> Array2<f64> {
    match activation {
        Activation::Linear => {}
        Activation::Relu => z.mapv_inplace(|v| v.max(0.0)),
        Activation::Sigmoid => z.mapv_inplace(|v| 1.0 / (1.0 + (-v).exp())),
        Activation::Softmax => {
            for mut row in z.rows_mut() {
                let max = row.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
                row.mapv_inplace(|v| (v - max).exp());
                let sum = row.sum();
                row.mapv_inplace(|v| v / sum);
            }
        }
    }
    z
}
