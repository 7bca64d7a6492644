//! Complete, immutable description of a network for the model builder.
//!
//! A [`ModelSpec`] is only obtainable from [`ModelSpecBuilder::build`], which
//! validates the whole description at once.

use super::{Activation, LossKind, OptimizerKind, DEFAULT_LEARNING_RATE};
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// Network description handed to a [`ModelBuilder`](crate::model::ModelBuilder).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    input_width: usize,
    layer_widths: Vec<usize>,
    activation: Activation,
    output_activation: Activation,
    learning_rate: f64,
    optimizer: OptimizerKind,
    loss: LossKind,
}

impl ModelSpec {
    pub fn builder(input_width: usize) -> ModelSpecBuilder {
        ModelSpecBuilder::new(input_width)
    }

    pub fn input_width(&self) -> usize {
        self.input_width
    }

    /// Hidden widths followed by the output width.
    pub fn layer_widths(&self) -> &[usize] {
        &self.layer_widths
    }

    pub fn hidden_widths(&self) -> &[usize] {
        &self.layer_widths[..self.layer_widths.len() - 1]
    }

    pub fn output_width(&self) -> usize {
        self.layer_widths[self.layer_widths.len() - 1]
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn output_activation(&self) -> Activation {
        self.output_activation
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn optimizer(&self) -> OptimizerKind {
        self.optimizer
    }

    pub fn loss(&self) -> LossKind {
        self.loss
    }
}

/// Fluent builder for [`ModelSpec`].
///
/// Defaults:
/// - `activations`: ReLU hidden, linear output
/// - `learning_rate`: 0.001
/// - `optimizer`: Adam
/// - `loss`: mean squared error
#[derive(Clone, Debug)]
pub struct ModelSpecBuilder {
    input_width: usize,
    layer_widths: Vec<usize>,
    activation: Activation,
    output_activation: Activation,
    learning_rate: f64,
    optimizer: OptimizerKind,
    loss: LossKind,
}

impl ModelSpecBuilder {
    pub fn new(input_width: usize) -> Self {
        Self {
            input_width,
            layer_widths: Vec::new(),
            activation: Activation::Relu,
            output_activation: Activation::Linear,
            learning_rate: DEFAULT_LEARNING_RATE,
            optimizer: OptimizerKind::Adam,
            loss: LossKind::MeanSquaredError,
        }
    }

    /// Full layer-width sequence; the last entry is the output width.
    pub fn layers(mut self, widths: impl Into<Vec<usize>>) -> Self {
        self.layer_widths = widths.into();
        self
    }

    pub fn activations(mut self, hidden: Activation, output: Activation) -> Self {
        self.activation = hidden;
        self.output_activation = output;
        self
    }

    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn loss(mut self, loss: LossKind) -> Self {
        self.loss = loss;
        self
    }

    /// Validate and freeze the description.
    ///
    /// # Errors
    /// [`PipelineError::InvalidConfig`] for a zero input width, an empty or
    /// zero-width layer list, or a non-positive learning rate.
    /// [`PipelineError::Shape`] when the loss cannot train the output width.
    pub fn build(self) -> Result<ModelSpec, PipelineError> {
        if self.input_width == 0 {
            return Err(PipelineError::InvalidConfig(
                "model input width must be at least 1".to_string(),
            ));
        }
        if self.layer_widths.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "model needs at least an output layer".to_string(),
            ));
        }
        if self.layer_widths.contains(&0) {
            return Err(PipelineError::InvalidConfig(format!(
                "layer widths must be positive, got {:?}",
                self.layer_widths
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }

        let output_width = self.layer_widths[self.layer_widths.len() - 1];
        if !self.loss.accepts_width(output_width) {
            return Err(PipelineError::shape(
                format!("{} output layer", self.loss),
                match self.loss {
                    LossKind::CategoricalCrossentropy => "more than 1 unit".to_string(),
                    _ => "1 unit".to_string(),
                },
                format!("{} units", output_width),
            ));
        }

        Ok(ModelSpec {
            input_width: self.input_width,
            layer_widths: self.layer_widths,
            activation: self.activation,
            output_activation: self.output_activation,
            learning_rate: self.learning_rate,
            optimizer: self.optimizer,
            loss: self.loss,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::architecture::recommend;
    use crate::dataset::TaskType;

    #[test]
    fn test_builder_from_recommendation() {
        let rec = recommend(2, 20, TaskType::Classification, 3);
        let spec = rec.model_spec(2).build().unwrap();
        assert_eq!(spec.input_width(), 2);
        assert_eq!(spec.layer_widths(), &[10, 3]);
        assert_eq!(spec.hidden_widths(), &[10]);
        assert_eq!(spec.output_width(), 3);
        assert_eq!(spec.output_activation(), Activation::Sigmoid);
        assert_eq!(spec.loss(), LossKind::CategoricalCrossentropy);
    }

    #[test]
    fn test_builder_defaults() {
        let spec = ModelSpec::builder(4).layers(vec![12, 1]).build().unwrap();
        assert_eq!(spec.activation(), Activation::Relu);
        assert_eq!(spec.output_activation(), Activation::Linear);
        assert_eq!(spec.optimizer(), OptimizerKind::Adam);
        assert_eq!(spec.loss(), LossKind::MeanSquaredError);
    }

    #[test]
    fn test_builder_rejects_incomplete_description() {
        assert!(ModelSpec::builder(0).layers(vec![1]).build().is_err());
        assert!(ModelSpec::builder(3).build().is_err());
        assert!(ModelSpec::builder(3).layers(vec![10, 0]).build().is_err());
        assert!(ModelSpec::builder(3)
            .layers(vec![1])
            .learning_rate(0.0)
            .build()
            .is_err());
    }

    #[test]
    fn test_builder_rejects_loss_width_mismatch() {
        let result = ModelSpec::builder(3)
            .layers(vec![10, 1])
            .loss(LossKind::CategoricalCrossentropy)
            .build();
        assert!(matches!(result, Err(PipelineError::Shape { .. })));
    }
}
