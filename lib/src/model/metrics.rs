//! Losses and accuracy over target/prediction matrices.
//!
//! Both matrices must have the same shape. Empty inputs score 0.

use crate::architecture::LossKind;
use crate::preprocessing::encoding::argmax;
use ndarray::ArrayView2;

/// Clamp for probabilities inside logarithms.
const PROB_EPSILON: f64 = 1e-7;

/// Mean loss per sample.
pub fn loss(kind: LossKind, y_true: ArrayView2<'_, f64>, y_pred: ArrayView2<'_, f64>) -> f64 {
    match kind {
        LossKind::MeanSquaredError => mse(y_true, y_pred),
        LossKind::BinaryCrossentropy => binary_crossentropy(y_true, y_pred),
        LossKind::CategoricalCrossentropy => categorical_crossentropy(y_true, y_pred),
    }
}

/// MSE = mean((y_true - y_pred)^2) over every entry.
pub fn mse(y_true: ArrayView2<'_, f64>, y_pred: ArrayView2<'_, f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&t, &p)| (t - p).powi(2))
        .sum();
    sum_sq / y_true.len() as f64
}

/// Mean of `-(y ln p + (1 - y) ln(1 - p))` over every entry.
pub fn binary_crossentropy(y_true: ArrayView2<'_, f64>, y_pred: ArrayView2<'_, f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let sum: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&t, &p)| {
            let p = p.clamp(PROB_EPSILON, 1.0 - PROB_EPSILON);
            -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
        })
        .sum();
    sum / y_true.len() as f64
}

/// Mean over rows of `-sum(y ln p)`.
pub fn categorical_crossentropy(y_true: ArrayView2<'_, f64>, y_pred: ArrayView2<'_, f64>) -> f64 {
    if y_true.nrows() == 0 {
        return 0.0;
    }
    let sum: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(&t, &p)| -t * p.clamp(PROB_EPSILON, 1.0).ln())
        .sum();
    sum / y_true.nrows() as f64
}

/// Share of rows whose predicted class matches the target class.
///
/// Multi-column rows compare arg-max indices; single-column rows compare
/// rounded values.
pub fn accuracy(y_true: ArrayView2<'_, f64>, y_pred: ArrayView2<'_, f64>) -> f64 {
    if y_true.nrows() == 0 {
        return 0.0;
    }
    let correct = y_true
        .rows()
        .into_iter()
        .zip(y_pred.rows())
        .filter(|(t, p)| {
            if t.len() > 1 {
                argmax(&t.to_vec()) == argmax(&p.to_vec())
            } else {
                t[0].round() == p[0].round()
            }
        })
        .count();
    correct as f64 / y_true.nrows() as f64
}
