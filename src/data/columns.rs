//! Column-major index over a problem's features.
//!
//! Primal coordinate descent visits one feature at a time and needs every
//! sample that carries it. [`FeatureColumns`] stores the arena transposed in
//! compressed sparse column form:
//!
//! - `values`: node values, feature after feature
//! - `rows`: sample index for each value
//! - `col_ptrs`: `col_ptrs[j]..col_ptrs[j + 1]` is the range of column `j`
//!
//! Column `j` holds feature index `j + 1`.

use super::node::FeatureNode;

/// Compressed sparse column view of a problem's samples.
#[derive(Debug, Clone)]
pub struct FeatureColumns {
    values: Box<[f64]>,
    rows: Box<[u32]>,
    col_ptrs: Box<[usize]>,
    n_rows: usize,
}

impl FeatureColumns {
    /// Transpose sample node runs into `n_cols` columns.
    ///
    /// Nodes whose index lies outside `1..=n_cols` are not indexed.
    pub fn from_samples(samples: &[&[FeatureNode]], n_cols: usize) -> Self {
        let n_rows = samples.len();
        let column_of = |index: i32| -> Option<usize> {
            let col = usize::try_from(index).ok()?.checked_sub(1)?;
            (col < n_cols).then_some(col)
        };

        // First pass: count entries per column
        let mut counts = vec![0usize; n_cols];
        for nodes in samples {
            for node in nodes.iter() {
                if let Some(col) = column_of(node.index) {
                    counts[col] += 1;
                }
            }
        }

        let mut col_ptrs = Vec::with_capacity(n_cols + 1);
        col_ptrs.push(0usize);
        let mut cumsum = 0usize;
        for &count in &counts {
            cumsum += count;
            col_ptrs.push(cumsum);
        }

        // Second pass: fill. Rows are visited in order, so each column's rows
        // come out sorted.
        let mut values = vec![0.0; cumsum];
        let mut rows = vec![0u32; cumsum];
        let mut cursors = col_ptrs[..n_cols].to_vec();
        for (row, nodes) in samples.iter().enumerate() {
            for node in nodes.iter() {
                if let Some(col) = column_of(node.index) {
                    let at = cursors[col];
                    values[at] = node.value;
                    rows[at] = row as u32;
                    cursors[col] += 1;
                }
            }
        }

        Self {
            values: values.into_boxed_slice(),
            rows: rows.into_boxed_slice(),
            col_ptrs: col_ptrs.into_boxed_slice(),
            n_rows,
        }
    }

    /// Number of samples.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of features.
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.col_ptrs.len() - 1
    }

    /// Number of stored values.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate over `(row, value)` pairs of a column.
    #[inline]
    pub fn column(&self, col: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.col_ptrs[col]..self.col_ptrs[col + 1];
        self.rows[range.clone()]
            .iter()
            .zip(&self.values[range])
            .map(|(&row, &value)| (row as usize, value))
    }

    /// Number of stored values in a column.
    #[inline]
    pub fn column_nnz(&self, col: usize) -> usize {
        self.col_ptrs[col + 1] - self.col_ptrs[col]
    }
}
