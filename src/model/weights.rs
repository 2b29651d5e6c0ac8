//! Weight matrix of a linear classifier.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::data::FeatureNode;
use crate::error::{LinearError, Result};

/// Learned weights, one row per effective feature and one column per weight
/// vector:
///
/// ```text
/// weights[[index - 1, k]] → coefficient of feature `index` in weight vector k
/// weights[[nr_feature, k]] → bias coefficient (when the model has a bias)
/// ```
///
/// Flattened in row-major order this is the liblinear layout,
/// `w[(index - 1) * nr_w + k]`.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use sparselin::model::LinearWeights;
///
/// let weights = LinearWeights::from_array(array![[0.5], [-1.0], [0.25]]);
/// assert_eq!(weights.n_rows(), 3);
/// assert_eq!(weights.weight(1, 0), -1.0);
/// assert_eq!(weights.to_flat(), vec![0.5, -1.0, 0.25]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LinearWeights {
    weights: Array2<f64>,
}

impl LinearWeights {
    pub fn zeros(n_rows: usize, nr_w: usize) -> Self {
        Self {
            weights: Array2::zeros((n_rows, nr_w)),
        }
    }

    pub fn from_array(weights: Array2<f64>) -> Self {
        Self { weights }
    }

    /// Build from a flat row-major buffer of `n_rows * nr_w` values.
    pub fn from_flat(values: Vec<f64>, n_rows: usize, nr_w: usize) -> Result<Self> {
        let len = values.len();
        Array2::from_shape_vec((n_rows, nr_w), values)
            .map(Self::from_array)
            .map_err(|_| {
                LinearError::InvalidParameter(format!(
                    "expected {} weights ({n_rows} x {nr_w}), got {len}",
                    n_rows * nr_w
                ))
            })
    }

    /// Number of effective features (bias row included).
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.weights.nrows()
    }

    /// Number of weight vectors.
    #[inline]
    pub fn nr_w(&self) -> usize {
        self.weights.ncols()
    }

    #[inline]
    pub fn weight(&self, row: usize, column: usize) -> f64 {
        self.weights[[row, column]]
    }

    pub(crate) fn column_mut(&mut self, column: usize) -> ndarray::ArrayViewMut1<'_, f64> {
        self.weights.column_mut(column)
    }

    #[inline]
    pub fn row(&self, row: usize) -> ArrayView1<'_, f64> {
        self.weights.row(row)
    }

    #[inline]
    pub fn as_array(&self) -> ArrayView2<'_, f64> {
        self.weights.view()
    }

    /// Row-major copy of every weight.
    pub fn to_flat(&self) -> Vec<f64> {
        self.weights.iter().copied().collect()
    }

    /// One decision value per weight vector.
    ///
    /// Nodes with an index outside `1..=n_rows` contribute nothing.
    pub fn decision_values(&self, nodes: &[FeatureNode]) -> Array1<f64> {
        let mut scores = Array1::zeros(self.nr_w());
        for node in nodes {
            let idx = node.index as usize;
            if node.index > 0 && idx <= self.n_rows() {
                scores.scaled_add(node.value, &self.weights.row(idx - 1));
            }
        }
        scores
    }
}
