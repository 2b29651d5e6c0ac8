//! Class grouping and per-class regularization.

use super::logger::TrainingLogger;
use super::params::Parameter;

/// Distinct labels of a training set, in order of first appearance.
///
/// This order is authoritative: weight row `k` of a trained model belongs to
/// `labels[k]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassGroups {
    labels: Vec<i32>,
    counts: Vec<usize>,
    /// Class index of every sample.
    class_of: Vec<usize>,
}

impl ClassGroups {
    pub fn new(y: &[i32]) -> Self {
        let mut labels: Vec<i32> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();
        let mut class_of = Vec::with_capacity(y.len());
        for &label in y {
            let class = match labels.iter().position(|&l| l == label) {
                Some(class) => class,
                None => {
                    labels.push(label);
                    counts.push(0);
                    labels.len() - 1
                }
            };
            counts[class] += 1;
            class_of.push(class);
        }
        Self {
            labels,
            counts,
            class_of,
        }
    }

    #[inline]
    pub fn nr_class(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    #[inline]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    #[inline]
    pub fn class_of(&self) -> &[usize] {
        &self.class_of
    }

    /// `+1` for samples of `class`, `-1` for the rest.
    pub fn one_vs_rest(&self, class: usize) -> Vec<f64> {
        self.class_of
            .iter()
            .map(|&c| if c == class { 1.0 } else { -1.0 })
            .collect()
    }

    /// `C` for every class, scaled by any configured class weight.
    ///
    /// Weight labels that match no class are reported and ignored.
    pub fn weighted_c(&self, param: &Parameter, logger: &TrainingLogger) -> Vec<f64> {
        let mut weighted = vec![param.c; self.nr_class()];
        for &(label, weight) in &param.weights {
            match self.labels.iter().position(|&l| l == label) {
                Some(class) => weighted[class] *= weight,
                None => logger.log_unknown_weight_label(label),
            }
        }
        weighted
    }
}
