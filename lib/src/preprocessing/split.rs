//! Randomized train/test splitting.
//!
//! A single permutation of `0..n` is cut into a train prefix and a test
//! suffix of `round(n * test_fraction)` indices. The permutation source is
//! injected, so a seeded generator reproduces the exact partition.
//!
//! ```rust
//! use ndarray::Array2;
//! use tabular_nn::preprocessing::split::train_test_split;
//!
//! let x = Array2::<f64>::zeros((20, 2));
//! let y = Array2::<f64>::zeros((20, 3));
//! let split = train_test_split(x, y, 0.2, Some(42)).unwrap();
//! assert_eq!(split.train_x.dim(), (16, 2));
//! assert_eq!(split.test_y.dim(), (4, 3));
//! ```

use crate::dataset::InMemoryDataset;
use crate::error::PipelineError;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Disjoint train/test index sets covering `0..n`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Gathered train/test matrices.
#[derive(Clone, Debug)]
pub struct TrainTestSplit {
    pub train_x: Array2<f64>,
    pub train_y: Array2<f64>,
    pub test_x: Array2<f64>,
    pub test_y: Array2<f64>,
    pub indices: SplitIndices,
}

impl TrainTestSplit {
    pub fn n_features(&self) -> usize {
        self.train_x.ncols()
    }

    pub fn output_width(&self) -> usize {
        self.train_y.ncols()
    }

    /// True when no samples were held out, so no evaluation metrics exist.
    pub fn has_test_set(&self) -> bool {
        self.test_x.nrows() > 0
    }

    /// Hand the matrices over as `(train, test)` datasets.
    pub fn into_datasets(self) -> Result<(InMemoryDataset, InMemoryDataset), PipelineError> {
        Ok((
            InMemoryDataset::new(self.train_x, self.train_y)?,
            InMemoryDataset::new(self.test_x, self.test_y)?,
        ))
    }
}

/// Number of test samples for `n` samples.
pub fn test_count(n: usize, test_fraction: f64) -> usize {
    ((n as f64 * test_fraction).round() as usize).min(n)
}

/// Permute `0..n` with `rng` and cut it into train and test indices.
///
/// # Errors
/// [`PipelineError::InvalidConfig`] if `test_fraction` is outside `[0, 1]`.
pub fn split_indices<R: Rng + ?Sized>(
    n: usize,
    test_fraction: f64,
    rng: &mut R,
) -> Result<SplitIndices, PipelineError> {
    if !(0.0..=1.0).contains(&test_fraction) {
        return Err(PipelineError::InvalidConfig(format!(
            "test_fraction must be in [0, 1], got {}",
            test_fraction
        )));
    }

    let mut permutation: Vec<usize> = (0..n).collect();
    permutation.shuffle(rng);

    let train_count = n - test_count(n, test_fraction);
    let test = permutation.split_off(train_count);

    Ok(SplitIndices {
        train: permutation,
        test,
    })
}

/// Split encoded matrices into train and test sets.
///
/// The input matrices are consumed; only the gathered copies survive.
/// `seed = None` draws the permutation from OS entropy.
pub fn train_test_split(
    features: Array2<f64>,
    targets: Array2<f64>,
    test_fraction: f64,
    seed: Option<u64>,
) -> Result<TrainTestSplit, PipelineError> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    train_test_split_with_rng(features, targets, test_fraction, &mut rng)
}

/// [`train_test_split`] with a caller-provided random source.
pub fn train_test_split_with_rng<R: Rng + ?Sized>(
    features: Array2<f64>,
    targets: Array2<f64>,
    test_fraction: f64,
    rng: &mut R,
) -> Result<TrainTestSplit, PipelineError> {
    if features.nrows() != targets.nrows() {
        return Err(PipelineError::shape(
            "train/test split",
            format!("{} target rows", features.nrows()),
            format!("{} target rows", targets.nrows()),
        ));
    }

    let indices = split_indices(features.nrows(), test_fraction, rng)?;

    let split = TrainTestSplit {
        train_x: gather_rows(&features, &indices.train),
        train_y: gather_rows(&targets, &indices.train),
        test_x: gather_rows(&features, &indices.test),
        test_y: gather_rows(&targets, &indices.test),
        indices,
    };

    debug!(
        train = split.train_x.nrows(),
        test = split.test_x.nrows(),
        "split dataset"
    );
    Ok(split)
}

/// Copy the rows at `indices`, in that order.
pub fn gather_rows(matrix: &Array2<f64>, indices: &[usize]) -> Array2<f64> {
    Array2::from_shape_fn((indices.len(), matrix.ncols()), |(i, j)| {
        matrix[[indices[i], j]]
    })
}
