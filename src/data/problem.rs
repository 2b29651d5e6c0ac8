//! Training problems built from per-sample associative data.
//!
//! A [`Problem`] is a label vector plus a [`FeatureArena`] holding one
//! sentinel-terminated node run per sample. It can be built from host data
//! through [`ProblemBuilder`] or parsed from sparse text through
//! [`TextFormatParser`](super::TextFormatParser); both paths produce the same
//! layout:
//!
//! ```text
//! [features in input order] [bias node (n, bias) if bias > 0] [sentinel (-1, -1)]
//! ```
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use sparselin::data::ProblemBuilder;
//!
//! let samples = vec![
//!     BTreeMap::from([(1, 0.5), (3, 1.0)]),
//!     BTreeMap::from([(2, -1.0)]),
//! ];
//! let problem = ProblemBuilder::new(3)
//!     .bias(1.0)
//!     .build(&[1, -1], &samples)
//!     .unwrap();
//!
//! assert_eq!(problem.n(), 4);
//! assert_eq!(problem.feature_vector(1).unwrap(), vec![(2, -1.0), (4, 1.0)]);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::io::Write;
use std::path::Path;

use crate::error::{LinearError, Resource, Result};

use super::arena::FeatureArena;
use super::node::FeatureNode;
use super::text::{write_problem, TextFormatParser};

/// Whether a bias value enables the synthetic bias feature.
///
/// Only strictly positive values enable it; `0.0` and negative values disable it.
#[inline]
pub fn bias_enabled(bias: f64) -> bool {
    bias > 0.0
}

// =============================================================================
// SparseSample
// =============================================================================

/// A single sample's sparse features, as supplied by the host.
///
/// Entries are written to the arena in the order [`entries`](Self::entries)
/// yields them. The builder does not sort; callers that need solver-grade
/// ordering must supply entries in ascending index order (e.g. `BTreeMap`).
pub trait SparseSample {
    /// Number of entries [`entries`](Self::entries) will yield.
    fn n_entries(&self) -> usize;

    /// The `(index, value)` pairs of this sample.
    fn entries(&self) -> impl Iterator<Item = (i32, f64)> + '_;
}

impl<S: BuildHasher> SparseSample for HashMap<i32, f64, S> {
    fn n_entries(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.iter().map(|(&k, &v)| (k, v))
    }
}

impl SparseSample for BTreeMap<i32, f64> {
    fn n_entries(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.iter().map(|(&k, &v)| (k, v))
    }
}

impl SparseSample for [(i32, f64)] {
    fn n_entries(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.iter().copied()
    }
}

impl SparseSample for Vec<(i32, f64)> {
    fn n_entries(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.iter().copied()
    }
}

impl SparseSample for [FeatureNode] {
    fn n_entries(&self) -> usize {
        self.len()
    }

    fn entries(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.iter().map(FeatureNode::pair)
    }
}

impl<T: SparseSample + ?Sized> SparseSample for &T {
    fn n_entries(&self) -> usize {
        (**self).n_entries()
    }

    fn entries(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        (**self).entries()
    }
}

// =============================================================================
// ProblemBuilder
// =============================================================================

/// Builds a [`Problem`] from labels and per-sample feature mappings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProblemBuilder {
    /// Largest real feature index samples may use.
    attribute_count: i32,
    /// Bias value; enabled iff `> 0`.
    bias: f64,
}

impl ProblemBuilder {
    /// Create a builder for samples whose indices lie in `1..=attribute_count`.
    ///
    /// The bias is disabled (`-1.0`) until set with [`bias`](Self::bias).
    pub fn new(attribute_count: i32) -> Self {
        Self {
            attribute_count,
            bias: -1.0,
        }
    }

    /// Set the bias value. Values `> 0` append a bias node to every sample.
    pub fn bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    /// Attribute count of the resulting problem, including the bias feature.
    ///
    /// Saturates at `i32::MAX`; [`build`](Self::build) rejects attribute
    /// counts that leave no index for the bias feature.
    pub fn n(&self) -> i32 {
        self.attribute_count
            .saturating_add(i32::from(bias_enabled(self.bias)))
    }

    /// Exact number of arena nodes `samples` need.
    pub fn required_nodes<S: SparseSample>(&self, samples: &[S]) -> usize {
        // sentinel, plus the bias node when enabled
        let extra = if bias_enabled(self.bias) { 2 } else { 1 };
        samples.iter().map(|s| s.n_entries() + extra).sum()
    }

    /// Build the problem.
    ///
    /// # Errors
    ///
    /// - [`LinearError::LengthMismatch`] if `labels` and `samples` differ in
    ///   length (checked before anything is allocated)
    /// - [`LinearError::InvalidParameter`] if the attribute count is negative,
    ///   or is `i32::MAX` with the bias enabled
    /// - [`LinearError::FeatureIndexInvalid`] if a sample uses an index
    ///   outside `1..=attribute_count`
    /// - [`LinearError::InternalConsistency`] if the arena was not filled to
    ///   exactly its pre-computed size
    pub fn build<S: SparseSample>(&self, labels: &[i32], samples: &[S]) -> Result<Problem> {
        if labels.len() != samples.len() {
            return Err(LinearError::LengthMismatch {
                labels: labels.len(),
                samples: samples.len(),
            });
        }
        if self.attribute_count < 0 {
            return Err(LinearError::InvalidParameter(format!(
                "attribute count must be non-negative, got {}",
                self.attribute_count
            )));
        }
        if bias_enabled(self.bias) && self.attribute_count == i32::MAX {
            return Err(LinearError::InvalidParameter(format!(
                "attribute count {} leaves no index for the bias feature",
                self.attribute_count
            )));
        }

        let n = self.n();
        let with_bias = bias_enabled(self.bias);
        let required = self.required_nodes(samples);
        tracing::debug!(
            samples = samples.len(),
            required_nodes = required,
            n,
            "allocating feature arena"
        );

        let mut writer = FeatureArena::allocate(required).with_index_limit(self.attribute_count);
        for sample in samples {
            writer.begin_sample();
            for (index, value) in sample.entries() {
                writer.append(index, value)?;
            }
            if with_bias {
                writer.append_bias(n, self.bias)?;
            }
            writer.append_sentinel()?;
        }
        let arena = writer.finish()?;

        Ok(Problem::from_parts(labels.to_vec(), arena, n, self.bias))
    }
}

// =============================================================================
// Problem
// =============================================================================

/// Labels plus sparse features, ready for training.
///
/// The feature arena can be released early with [`destroy`](Self::destroy);
/// labels and shape stay readable, but any feature access afterwards fails
/// with [`LinearError::ResourceDestroyed`].
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    labels: Vec<i32>,
    arena: Option<FeatureArena>,
    /// Attribute count, including the bias feature when enabled.
    n: i32,
    bias: f64,
}

impl Problem {
    /// Build a problem from host data. Shorthand for [`ProblemBuilder`].
    pub fn new<S: SparseSample>(
        labels: &[i32],
        samples: &[S],
        bias: f64,
        attribute_count: i32,
    ) -> Result<Self> {
        ProblemBuilder::new(attribute_count)
            .bias(bias)
            .build(labels, samples)
    }

    /// Parse a problem from sparse text held in memory.
    pub fn from_text(text: &str, bias: f64) -> Result<Self> {
        TextFormatParser::new().bias(bias).parse_str(text)
    }

    /// Parse a problem from a sparse text file.
    pub fn load_file<P: AsRef<Path>>(path: P, bias: f64) -> Result<Self> {
        TextFormatParser::new().bias(bias).parse_file(path)
    }

    pub(crate) fn from_parts(labels: Vec<i32>, arena: FeatureArena, n: i32, bias: f64) -> Self {
        debug_assert_eq!(labels.len(), arena.n_samples());
        Self {
            labels,
            arena: Some(arena),
            n,
            bias,
        }
    }

    /// Number of samples.
    #[inline]
    pub fn l(&self) -> usize {
        self.labels.len()
    }

    /// Attribute count, including the bias feature when enabled.
    #[inline]
    pub fn n(&self) -> i32 {
        self.n
    }

    /// Bias value the problem was built with.
    #[inline]
    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Whether every sample carries a bias node.
    #[inline]
    pub fn has_bias(&self) -> bool {
        bias_enabled(self.bias)
    }

    /// Labels, one per sample.
    #[inline]
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// The feature arena.
    pub fn arena(&self) -> Result<&FeatureArena> {
        self.arena
            .as_ref()
            .ok_or(LinearError::ResourceDestroyed(Resource::Problem))
    }

    /// Nodes of one sample, bias included, sentinel excluded.
    pub fn sample(&self, sample: usize) -> Result<&[FeatureNode]> {
        let arena = self.arena()?;
        arena.sample(sample).ok_or(LinearError::SampleOutOfRange {
            sample,
            l: self.l(),
        })
    }

    /// One sample's `(index, value)` pairs, bias included, sentinel excluded.
    pub fn feature_vector(&self, sample: usize) -> Result<Vec<(i32, f64)>> {
        Ok(self.sample(sample)?.iter().map(FeatureNode::pair).collect())
    }

    /// Iterate over every sample's nodes.
    pub fn samples(&self) -> Result<impl ExactSizeIterator<Item = &[FeatureNode]> + '_> {
        Ok(self.arena()?.samples())
    }

    /// Release the feature arena. Calling this twice is a no-op.
    pub fn destroy(&mut self) {
        if self.arena.take().is_some() {
            tracing::debug!(samples = self.l(), "released problem feature arena");
        }
    }

    /// Whether [`destroy`](Self::destroy) has been called.
    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.arena.is_none()
    }

    /// Write the problem in the sparse text format (bias nodes omitted).
    pub fn write_text<W: Write>(&self, writer: W) -> Result<()> {
        write_problem(self, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn samples() -> Vec<BTreeMap<i32, f64>> {
        vec![
            BTreeMap::from([(2, 0.1), (3, 0.3), (4, -1.2)]),
            BTreeMap::from([(1, 0.4)]),
            BTreeMap::from([(2, 0.1), (4, 1.4), (5, 0.5)]),
            BTreeMap::from([(1, -0.1), (2, -0.2), (3, 0.1), (4, 1.1), (5, 0.1)]),
        ]
    }

    #[test]
    fn without_bias() {
        let problem = Problem::new(&[2, 1, 2, 3], &samples(), -1.0, 5).unwrap();
        assert_eq!(problem.l(), 4);
        assert_eq!(problem.n(), 5);
        assert_eq!(problem.bias(), -1.0);
        assert_eq!(problem.labels(), &[2, 1, 2, 3]);
        assert_eq!(
            problem.feature_vector(0).unwrap(),
            vec![(2, 0.1), (3, 0.3), (4, -1.2)]
        );
        // 12 entries + 4 sentinels
        assert_eq!(problem.arena().unwrap().total_nodes(), 16);
    }

    #[test]
    fn with_bias() {
        let problem = Problem::new(&[2, 1, 2, 3], &samples(), 1.0, 5).unwrap();
        assert_eq!(problem.n(), 6);
        assert!(problem.has_bias());
        assert_eq!(
            problem.feature_vector(0).unwrap(),
            vec![(2, 0.1), (3, 0.3), (4, -1.2), (6, 1.0)]
        );
        assert_eq!(problem.feature_vector(1).unwrap(), vec![(1, 0.4), (6, 1.0)]);
        assert_eq!(problem.arena().unwrap().total_nodes(), 20);
    }

    #[test]
    fn zero_bias_is_disabled() {
        let problem = Problem::new(&[2, 1, 2, 3], &samples(), 0.0, 5).unwrap();
        assert_eq!(problem.n(), 5);
        assert_eq!(problem.feature_vector(1).unwrap(), vec![(1, 0.4)]);
    }

    #[test]
    fn length_mismatch() {
        let err = Problem::new(&[1, 2, 3], &samples(), -1.0, 5).unwrap_err();
        assert!(matches!(
            err,
            LinearError::LengthMismatch {
                labels: 3,
                samples: 4
            }
        ));
    }

    #[test]
    fn index_above_attribute_count() {
        let err = Problem::new(&[2, 1, 2, 3], &samples(), 1.0, 4).unwrap_err();
        assert!(matches!(
            err,
            LinearError::FeatureIndexInvalid {
                sample: 2,
                index: 5,
                max: 4
            }
        ));
    }

    #[test]
    fn max_attribute_count_needs_room_for_bias() {
        let samples = vec![BTreeMap::from([(1, 1.0)])];
        let err = Problem::new(&[1], &samples, 1.0, i32::MAX).unwrap_err();
        assert!(matches!(err, LinearError::InvalidParameter(_)));

        let problem = Problem::new(&[1], &samples, -1.0, i32::MAX).unwrap();
        assert_eq!(problem.n(), i32::MAX);
    }

    #[test]
    fn empty_sample_gets_bias_and_sentinel() {
        let samples: Vec<Vec<(i32, f64)>> = vec![vec![], vec![(1, 2.0)]];
        let problem = Problem::new(&[1, 2], &samples, 0.5, 1).unwrap();
        assert_eq!(problem.feature_vector(0).unwrap(), vec![(2, 0.5)]);
        let arena = problem.arena().unwrap();
        assert_eq!(arena.sample_with_sentinel(0).unwrap().len(), 2);
    }

    #[test]
    fn hashmap_samples() {
        let samples = vec![HashMap::from([(1, 1.0)]), HashMap::new()];
        let problem = Problem::new(&[1, -1], &samples, -1.0, 1).unwrap();
        assert_eq!(problem.feature_vector(0).unwrap(), vec![(1, 1.0)]);
        assert!(problem.feature_vector(1).unwrap().is_empty());
    }

    #[test]
    fn destroy_releases_features() {
        let mut problem = Problem::new(&[2, 1, 2, 3], &samples(), 1.0, 5).unwrap();
        assert!(!problem.is_destroyed());
        problem.destroy();
        assert!(problem.is_destroyed());
        assert_eq!(problem.labels(), &[2, 1, 2, 3]);
        let err = problem.feature_vector(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceDestroyed);
        // second destroy is a no-op
        problem.destroy();
        assert!(problem.is_destroyed());
    }

    #[test]
    fn sample_out_of_range() {
        let problem = Problem::new(&[2, 1, 2, 3], &samples(), 1.0, 5).unwrap();
        assert!(matches!(
            problem.feature_vector(4),
            Err(LinearError::SampleOutOfRange { sample: 4, l: 4 })
        ));
    }
}
