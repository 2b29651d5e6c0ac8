//! Sparse feature node.

/// Index value that terminates every sample's node run.
pub const SENTINEL_INDEX: i32 = -1;

/// One `(index, value)` pair of a sparse feature vector.
///
/// Real feature indices are 1-based and strictly positive. A node whose index
/// is [`SENTINEL_INDEX`] marks the end of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureNode {
    /// 1-based feature index, or `-1` for the end-of-sample sentinel.
    pub index: i32,
    /// Feature value.
    pub value: f64,
}

impl FeatureNode {
    /// The end-of-sample sentinel, `(-1, -1.0)`.
    pub const SENTINEL: FeatureNode = FeatureNode {
        index: SENTINEL_INDEX,
        value: -1.0,
    };

    /// Create a new node.
    #[inline]
    pub const fn new(index: i32, value: f64) -> Self {
        Self { index, value }
    }

    /// Returns true if this node terminates a sample.
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.index == SENTINEL_INDEX
    }

    /// The node as an `(index, value)` tuple.
    #[inline]
    pub fn pair(&self) -> (i32, f64) {
        (self.index, self.value)
    }
}

impl From<(i32, f64)> for FeatureNode {
    fn from((index, value): (i32, f64)) -> Self {
        Self::new(index, value)
    }
}

/// Dot product of a sparse run against a dense, 0-based weight column.
///
/// `weights[(index - 1) * stride + offset]` is the coefficient for `index`.
/// Nodes with an index above `n_features` contribute nothing, which lets a
/// model trained on fewer features score wider inputs.
#[inline]
pub(crate) fn sparse_dot(
    nodes: &[FeatureNode],
    weights: &[f64],
    n_features: usize,
    stride: usize,
    offset: usize,
) -> f64 {
    let mut sum = 0.0;
    for node in nodes {
        let idx = node.index as usize;
        if node.index > 0 && idx <= n_features {
            sum += weights[(idx - 1) * stride + offset] * node.value;
        }
    }
    sum
}

/// `weights[(index - 1) * stride + offset] += scale * value` for every node.
#[inline]
pub(crate) fn sparse_axpy(
    nodes: &[FeatureNode],
    scale: f64,
    weights: &mut [f64],
    n_features: usize,
    stride: usize,
    offset: usize,
) {
    for node in nodes {
        let idx = node.index as usize;
        if node.index > 0 && idx <= n_features {
            weights[(idx - 1) * stride + offset] += scale * node.value;
        }
    }
}

/// Squared L2 norm of a sparse run.
#[inline]
pub(crate) fn squared_norm(nodes: &[FeatureNode]) -> f64 {
    nodes.iter().map(|node| node.value * node.value).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_minus_one() {
        assert!(FeatureNode::SENTINEL.is_sentinel());
        assert_eq!(FeatureNode::SENTINEL.pair(), (-1, -1.0));
        assert!(!FeatureNode::new(3, 1.0).is_sentinel());
    }

    #[test]
    fn sparse_dot_skips_out_of_range() {
        let nodes = [
            FeatureNode::new(1, 2.0),
            FeatureNode::new(3, 1.0),
            FeatureNode::new(9, 100.0),
        ];
        // 3 features, single column
        let weights = [0.5, 7.0, -1.0];
        let dot = sparse_dot(&nodes, &weights, 3, 1, 0);
        assert!((dot - 0.0).abs() < 1e-12);
    }

    #[test]
    fn sparse_dot_strided() {
        let nodes = [FeatureNode::new(2, 1.0)];
        // feature-major, two columns
        let weights = [0.1, 0.2, 0.3, 0.4];
        assert!((sparse_dot(&nodes, &weights, 2, 2, 1) - 0.4).abs() < 1e-12);
        assert!((squared_norm(&[FeatureNode::new(1, 3.0), FeatureNode::new(2, 4.0)]) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn axpy_updates_one_column() {
        let nodes = [FeatureNode::new(1, 2.0), FeatureNode::new(2, -1.0)];
        let mut weights = [0.0; 4];
        sparse_axpy(&nodes, 0.5, &mut weights, 2, 2, 1);
        assert_eq!(weights, [0.0, 1.0, 0.0, -0.5]);
    }
}
