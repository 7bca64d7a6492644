//! Heuristic feed-forward architecture sizing.
//!
//! [`recommend`] is a pure function of the dataset shape: identical inputs
//! always give an identical [`ArchitectureRecommendation`].
//!
//! | Quantity | Rule |
//! |----------|------|
//! | hidden layers | `clamp(floor(log2(n_features)), 1, 3)` |
//! | first hidden width | `clamp(n_features * 2, 10, 128)` |
//! | next hidden widths | `max(10, floor(prev / 1.5))` |
//! | output width | 1 for regression or at most 2 labels, else label count |
//! | batch size | `clamp(floor(n_samples / 10), 8, 32)` |
//! | epochs | `clamp(floor(10000 / n_samples), 50, 200)` |
//!
//! Hidden layers use ReLU. Classification outputs use sigmoid even for more
//! than two classes; regression outputs are linear.
//!
//! # Example
//! ```rust
//! use tabular_nn::architecture::recommend;
//! use tabular_nn::dataset::TaskType;
//!
//! let rec = recommend(8, 1000, TaskType::Classification, 3);
//! assert_eq!(rec.neurons_per_layer, vec![16, 10, 10, 3]);
//! assert_eq!(rec.batch_size, 32);
//! assert_eq!(rec.epochs, 50);
//! ```

pub mod model_spec;

pub use model_spec::{ModelSpec, ModelSpecBuilder};

use crate::dataset::{DatasetDescriptor, TaskType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed learning rate of every recommendation.
pub const DEFAULT_LEARNING_RATE: f64 = 0.001;

const MIN_HIDDEN_LAYERS: usize = 1;
const MAX_HIDDEN_LAYERS: usize = 3;
const MIN_WIDTH: usize = 10;
const MAX_FIRST_WIDTH: usize = 128;
const MIN_BATCH: usize = 8;
const MAX_BATCH: usize = 32;
const EPOCH_BUDGET: usize = 10_000;
const MIN_EPOCHS: usize = 50;
const MAX_EPOCHS: usize = 200;

/// Layer activation function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    Linear,
    Softmax,
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Activation::Relu => "relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Linear => "linear",
            Activation::Softmax => "softmax",
        })
    }
}

/// Optimizer the collaborator should train with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizerKind::Adam => f.write_str("adam"),
        }
    }
}

/// Training loss and the target shape it expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    MeanSquaredError,
    /// Expects a single 0/1 target column.
    BinaryCrossentropy,
    /// Expects one-hot targets with more than one column.
    CategoricalCrossentropy,
}

impl LossKind {
    /// Whether the loss accepts a target matrix with `width` columns.
    pub fn accepts_width(&self, width: usize) -> bool {
        match self {
            LossKind::MeanSquaredError => width >= 1,
            LossKind::BinaryCrossentropy => width == 1,
            LossKind::CategoricalCrossentropy => width > 1,
        }
    }
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LossKind::MeanSquaredError => "meanSquaredError",
            LossKind::BinaryCrossentropy => "binaryCrossentropy",
            LossKind::CategoricalCrossentropy => "categoricalCrossentropy",
        })
    }
}

/// Proposed network shape and training hyperparameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureRecommendation {
    pub hidden_layer_count: usize,
    /// Hidden widths followed by the output width.
    pub neurons_per_layer: Vec<usize>,
    pub activation: Activation,
    pub output_activation: Activation,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub epochs: usize,
    pub optimizer: OptimizerKind,
    pub task: TaskType,
}

impl ArchitectureRecommendation {
    pub fn hidden_widths(&self) -> &[usize] {
        let n = self.neurons_per_layer.len().saturating_sub(1);
        &self.neurons_per_layer[..n]
    }

    pub fn output_width(&self) -> usize {
        self.neurons_per_layer.last().copied().unwrap_or(1)
    }

    /// Loss matching the task and output width.
    pub fn recommended_loss(&self) -> LossKind {
        match self.task {
            TaskType::Regression => LossKind::MeanSquaredError,
            TaskType::Classification if self.output_width() > 1 => {
                LossKind::CategoricalCrossentropy
            }
            TaskType::Classification => LossKind::BinaryCrossentropy,
        }
    }

    /// Builder preloaded with this recommendation for a model reading `input_width` features.
    pub fn model_spec(&self, input_width: usize) -> ModelSpecBuilder {
        ModelSpec::builder(input_width)
            .layers(self.neurons_per_layer.clone())
            .activations(self.activation, self.output_activation)
            .learning_rate(self.learning_rate)
            .optimizer(self.optimizer)
            .loss(self.recommended_loss())
    }
}

/// Recommend an architecture for a dataset of the given shape.
///
/// `label_count` is ignored for regression.
pub fn recommend(
    n_features: usize,
    n_samples: usize,
    task: TaskType,
    label_count: usize,
) -> ArchitectureRecommendation {
    let hidden_layer_count = hidden_layer_count(n_features);

    let mut neurons_per_layer = Vec::with_capacity(hidden_layer_count + 1);
    let mut width = (n_features * 2).clamp(MIN_WIDTH, MAX_FIRST_WIDTH);
    for _ in 0..hidden_layer_count {
        neurons_per_layer.push(width);
        // floor(width / 1.5)
        width = ((width * 2) / 3).max(MIN_WIDTH);
    }
    neurons_per_layer.push(output_width(task, label_count));

    let output_activation = match task {
        TaskType::Classification => Activation::Sigmoid,
        TaskType::Regression => Activation::Linear,
    };

    ArchitectureRecommendation {
        hidden_layer_count,
        neurons_per_layer,
        activation: Activation::Relu,
        output_activation,
        learning_rate: DEFAULT_LEARNING_RATE,
        batch_size: (n_samples / 10).clamp(MIN_BATCH, MAX_BATCH),
        epochs: epoch_count(n_samples),
        optimizer: OptimizerKind::Adam,
        task,
    }
}

/// [`recommend`] for an analyzed dataset.
pub fn recommend_for(descriptor: &DatasetDescriptor) -> ArchitectureRecommendation {
    recommend(
        descriptor.n_features(),
        descriptor.n_samples,
        descriptor.task,
        descriptor.n_labels(),
    )
}

fn hidden_layer_count(n_features: usize) -> usize {
    if n_features < 2 {
        return MIN_HIDDEN_LAYERS;
    }
    (n_features.ilog2() as usize).clamp(MIN_HIDDEN_LAYERS, MAX_HIDDEN_LAYERS)
}

fn output_width(task: TaskType, label_count: usize) -> usize {
    match task {
        TaskType::Classification if label_count > 2 => label_count,
        _ => 1,
    }
}

fn epoch_count(n_samples: usize) -> usize {
    if n_samples == 0 {
        return MAX_EPOCHS;
    }
    (EPOCH_BUDGET / n_samples).clamp(MIN_EPOCHS, MAX_EPOCHS)
}
