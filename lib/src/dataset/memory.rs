//! Encoded `(X, Y)` matrices with mini-batch access.

use crate::error::PipelineError;
use ndarray::{s, Array2, ArrayView2};

/// Encoded features and targets held in memory.
///
/// - `x`: feature matrix with shape `(n_samples, n_features)`
/// - `y`: target matrix with shape `(n_samples, output_width)`
///
/// Row `i` of both matrices always refers to the same sample.
#[derive(Clone, Debug, PartialEq)]
pub struct InMemoryDataset {
    x: Array2<f64>,
    y: Array2<f64>,
}

impl InMemoryDataset {
    /// # Errors
    /// [`PipelineError::Shape`] if `x` and `y` have different row counts.
    pub fn new(x: Array2<f64>, y: Array2<f64>) -> Result<Self, PipelineError> {
        if x.nrows() != y.nrows() {
            return Err(PipelineError::shape(
                "dataset rows",
                format!("{} target rows", x.nrows()),
                format!("{} target rows", y.nrows()),
            ));
        }
        Ok(Self { x, y })
    }

    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn output_width(&self) -> usize {
        self.y.ncols()
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn targets(&self) -> &Array2<f64> {
        &self.y
    }

    /// Give the matrices back.
    pub fn into_parts(self) -> (Array2<f64>, Array2<f64>) {
        (self.x, self.y)
    }

    /// Iterate over consecutive batches; the last batch may be smaller.
    ///
    /// A `batch_size` of zero yields no batches.
    pub fn batches(&self, batch_size: usize) -> DatasetBatchIter<'_> {
        DatasetBatchIter {
            dataset: self,
            batch_size,
            current: 0,
        }
    }
}

/// Iterator over dataset batches, created by [`InMemoryDataset::batches`].
pub struct DatasetBatchIter<'a> {
    dataset: &'a InMemoryDataset,
    batch_size: usize,
    current: usize,
}

impl<'a> Iterator for DatasetBatchIter<'a> {
    type Item = (ArrayView2<'a, f64>, ArrayView2<'a, f64>);

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.dataset.len();
        if self.batch_size == 0 || self.current >= total {
            return None;
        }

        let end = (self.current + self.batch_size).min(total);
        let range = self.current..end;
        self.current = end;

        Some((
            self.dataset.x.slice(s![range.clone(), ..]),
            self.dataset.y.slice(s![range, ..]),
        ))
    }
}
