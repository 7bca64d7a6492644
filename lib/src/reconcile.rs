//! Shape reconciliation between a built model and the encoded dataset.
//!
//! This is the only place targets are reshaped after encoding. The policy:
//!
//! | Model output | Target width | Action |
//! |--------------|--------------|--------|
//! | `w` | `w` | none |
//! | 1 | N > 1 | collapse each one-hot row to its arg-max class index |
//! | N > 1 | 1 | map each scalar to its class index, expand to one-hot |
//! | anything else | | [`PipelineError::Shape`] |
//!
//! Scalar targets of a numeric-label dataset carry the label value, not its
//! index. When the label values are supplied, a scalar maps to the position
//! of the nearest label in label order, so labels `[1, 2, 3]` fill columns
//! `0, 1, 2`. Without label values the scalar is taken as an index, rounded
//! and clamped into `0..N`.
//!
//! A model whose input width differs from the feature count is always
//! rejected. After reshaping, the loss must accept the resulting width.
//! Every corrective reshape is logged at `warn` level and reported in the
//! returned [`Reconciliation`].

use crate::architecture::LossKind;
use crate::error::PipelineError;
use crate::preprocessing::encoding::{argmax, nearest_index};
use ndarray::{Array2, Axis};
use std::fmt;
use tracing::warn;

/// Declared tensor widths of a built model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelShape {
    pub input_width: usize,
    pub output_width: usize,
}

impl fmt::Display for ModelShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} -> {}]", self.input_width, self.output_width)
    }
}

/// Corrective reshape applied to a target matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Shapes already agree.
    None,
    /// One-hot rows of `from_width` columns became a single class-index column.
    CollapseToIndex { from_width: usize },
    /// A scalar column became one-hot rows of `to_width` columns.
    ExpandToOneHot { to_width: usize },
}

impl ReconcileAction {
    pub fn is_corrective(&self) -> bool {
        !matches!(self, ReconcileAction::None)
    }

    /// Apply this reshape to a target matrix of the original width.
    ///
    /// `class_values` are the numeric labels in label order, or empty when
    /// scalar targets already hold class indices.
    pub fn apply(&self, targets: Array2<f64>, class_values: &[f64]) -> Array2<f64> {
        match *self {
            ReconcileAction::None => targets,
            ReconcileAction::CollapseToIndex { .. } => collapse_to_index(&targets),
            ReconcileAction::ExpandToOneHot { to_width } => {
                expand_to_one_hot(&targets, to_width, class_values)
            }
        }
    }
}

impl fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileAction::None => f.write_str("none"),
            ReconcileAction::CollapseToIndex { from_width } => {
                write!(f, "collapsed {}-column one-hot targets to class indices", from_width)
            }
            ReconcileAction::ExpandToOneHot { to_width } => {
                write!(f, "expanded scalar targets to {}-column one-hot", to_width)
            }
        }
    }
}

/// Targets ready for training and the reshape that produced them.
#[derive(Clone, Debug)]
pub struct Reconciliation {
    pub targets: Array2<f64>,
    pub action: ReconcileAction,
}

/// Decide how targets of `target_width` columns must change for `model`.
///
/// # Errors
/// [`PipelineError::Shape`] when the input widths differ or the output
/// widths cannot be converted into each other.
pub fn plan(
    model: ModelShape,
    n_features: usize,
    target_width: usize,
) -> Result<ReconcileAction, PipelineError> {
    if model.input_width != n_features {
        return Err(PipelineError::shape(
            format!("model input, model shape {}", model),
            format!("{} features", model.input_width),
            format!("{} features in the dataset", n_features),
        ));
    }

    match (model.output_width, target_width) {
        (m, d) if m == d => Ok(ReconcileAction::None),
        (1, d) if d > 1 => Ok(ReconcileAction::CollapseToIndex { from_width: d }),
        (m, 1) if m > 1 => Ok(ReconcileAction::ExpandToOneHot { to_width: m }),
        (m, d) => Err(PipelineError::shape(
            format!("model output, model shape {}", model),
            format!("{} output units", m),
            format!("{} target columns", d),
        )),
    }
}

/// Reshape `targets` to fit `model` and check them against `loss`.
///
/// See [`ReconcileAction::apply`] for `class_values`.
pub fn reconcile(
    model: ModelShape,
    n_features: usize,
    targets: Array2<f64>,
    loss: LossKind,
    class_values: &[f64],
) -> Result<Reconciliation, PipelineError> {
    let original_width = targets.ncols();
    let action = plan(model, n_features, original_width)?;

    let targets = action.apply(targets, class_values);
    check_loss(loss, targets.ncols())?;

    if action.is_corrective() {
        warn!(
            model = %model,
            original_width,
            reconciled_width = targets.ncols(),
            "{}",
            action
        );
    }

    Ok(Reconciliation { targets, action })
}

/// Check that `loss` can train on targets of `width` columns.
pub fn check_loss(loss: LossKind, width: usize) -> Result<(), PipelineError> {
    if loss.accepts_width(width) {
        return Ok(());
    }
    let expected = match loss {
        LossKind::CategoricalCrossentropy => "one-hot targets with more than 1 column",
        LossKind::BinaryCrossentropy => "a single target column",
        LossKind::MeanSquaredError => "at least 1 target column",
    };
    Err(PipelineError::shape(
        format!("{} loss", loss),
        expected,
        format!("{} target columns", width),
    ))
}

fn collapse_to_index(targets: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::zeros((targets.nrows(), 1));
    for (i, row) in targets.axis_iter(Axis(0)).enumerate() {
        let values: Vec<f64> = row.to_vec();
        out[[i, 0]] = argmax(&values) as f64;
    }
    out
}

fn expand_to_one_hot(targets: &Array2<f64>, width: usize, class_values: &[f64]) -> Array2<f64> {
    let mut out = Array2::zeros((targets.nrows(), width));
    for (i, value) in targets.column(0).iter().enumerate() {
        out[[i, class_index(*value, class_values, width)]] = 1.0;
    }
    out
}

/// Column of `value` in a one-hot row of `width` columns.
fn class_index(value: f64, class_values: &[f64], width: usize) -> usize {
    if class_values.is_empty() {
        return nearest_index(value, width);
    }
    let position = class_values
        .iter()
        .enumerate()
        .min_by(|a, b| (a.1 - value).abs().total_cmp(&(b.1 - value).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0);
    position.min(width.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn shape(input_width: usize, output_width: usize) -> ModelShape {
        ModelShape {
            input_width,
            output_width,
        }
    }

    #[test]
    fn test_matching_shapes_untouched() {
        let y = array![[0.0, 1.0], [1.0, 0.0]];
        let r = reconcile(shape(2, 2), 2, y.clone(), LossKind::CategoricalCrossentropy, &[]).unwrap();
        assert_eq!(r.action, ReconcileAction::None);
        assert_eq!(r.targets, y);
    }

    #[test]
    fn test_collapse_one_hot_to_index() {
        let y = array![
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0]
        ];
        let r = reconcile(shape(2, 1), 2, y.clone(), LossKind::BinaryCrossentropy, &[]).unwrap();
        assert_eq!(r.action, ReconcileAction::CollapseToIndex { from_width: 3 });
        assert_eq!(r.targets.ncols(), 1);
        for (i, row) in y.rows().into_iter().enumerate() {
            let v = r.targets[[i, 0]];
            assert!([0.0, 1.0, 2.0].contains(&v));
            assert_eq!(v as usize, argmax(row.as_slice().unwrap()));
        }
    }

    #[test]
    fn test_expand_scalar_to_one_hot() {
        let y = array![[0.0], [2.0], [1.2], [7.0], [-1.0]];
        let r = reconcile(shape(3, 3), 3, y, LossKind::CategoricalCrossentropy, &[]).unwrap();
        assert_eq!(r.action, ReconcileAction::ExpandToOneHot { to_width: 3 });
        assert_eq!(r.targets.dim(), (5, 3));
        assert_eq!(r.targets.row(0).to_vec(), vec![1.0, 0.0, 0.0]);
        assert_eq!(r.targets.row(1).to_vec(), vec![0.0, 0.0, 1.0]);
        assert_eq!(r.targets.row(2).to_vec(), vec![0.0, 1.0, 0.0]);
        assert_eq!(r.targets.row(3).to_vec(), vec![0.0, 0.0, 1.0]);
        assert_eq!(r.targets.row(4).to_vec(), vec![1.0, 0.0, 0.0]);
        assert!(r.targets.rows().into_iter().all(|row| row.sum() == 1.0));
    }

    #[test]
    fn test_expand_numeric_labels_by_label_position() {
        // 1-based grades: label 1 -> column 0, label 3 -> column 2
        let y = array![[1.0], [2.0], [3.0], [3.0]];
        let r = reconcile(
            shape(2, 3),
            2,
            y,
            LossKind::CategoricalCrossentropy,
            &[1.0, 2.0, 3.0],
        )
        .unwrap();
        assert_eq!(r.targets.row(0).to_vec(), vec![1.0, 0.0, 0.0]);
        assert_eq!(r.targets.row(1).to_vec(), vec![0.0, 1.0, 0.0]);
        assert_eq!(r.targets.row(2).to_vec(), vec![0.0, 0.0, 1.0]);
        assert_eq!(r.targets.row(3).to_vec(), vec![0.0, 0.0, 1.0]);
        for j in 0..3 {
            assert!(r.targets.column(j).sum() > 0.0);
        }
    }

    #[test]
    fn test_expand_follows_label_order_not_value_order() {
        let y = array![[10.0], [-5.0], [7.0]];
        let r = reconcile(
            shape(1, 3),
            1,
            y,
            LossKind::CategoricalCrossentropy,
            &[10.0, -5.0, 7.0],
        )
        .unwrap();
        assert_eq!(r.targets, array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert_eq!(
            r.action.apply(array![[7.0]], &[10.0, -5.0, 7.0]),
            array![[0.0, 0.0, 1.0]]
        );
    }

    #[test]
    fn test_input_mismatch_is_fatal() {
        let y = array![[1.0], [0.0]];
        let err = reconcile(shape(4, 1), 2, y, LossKind::BinaryCrossentropy, &[]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("4 features"));
        assert!(msg.contains("2 features"));
    }

    #[test]
    fn test_incompatible_output_widths() {
        let y = Array2::<f64>::zeros((2, 3));
        let err = reconcile(shape(2, 2), 2, y, LossKind::CategoricalCrossentropy, &[]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("2 output units"));
        assert!(msg.contains("3 target columns"));
    }

    #[test]
    fn test_loss_target_mismatch() {
        let y = array![[0.0, 1.0], [1.0, 0.0]];
        assert!(matches!(
            reconcile(shape(1, 2), 1, y, LossKind::BinaryCrossentropy, &[]),
            Err(PipelineError::Shape { .. })
        ));

        let y = array![[0.0], [1.0]];
        assert!(matches!(
            reconcile(shape(1, 1), 1, y, LossKind::CategoricalCrossentropy, &[]),
            Err(PipelineError::Shape { .. })
        ));
    }

    #[test]
    fn test_apply_matches_reconcile() {
        let train = array![[0.0, 1.0, 0.0], [1.0, 0.0, 0.0]];
        let test = array![[0.0, 0.0, 1.0]];
        let r = reconcile(shape(2, 1), 2, train, LossKind::BinaryCrossentropy, &[]).unwrap();
        let test = r.action.apply(test, &[]);
        assert_eq!(test, array![[2.0]]);
    }

    #[test]
    fn test_empty_targets() {
        let y = Array2::<f64>::zeros((0, 3));
        let r = reconcile(shape(2, 1), 2, y, LossKind::MeanSquaredError, &[]).unwrap();
        assert_eq!(r.targets.dim(), (0, 1));
    }
}
