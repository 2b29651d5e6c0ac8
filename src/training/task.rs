//! Inputs and bookkeeping shared by the built-in solvers.

use rand::seq::SliceRandom;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::FeatureNode;

use super::logger::TrainingLogger;

/// A two-class subproblem: samples labelled `+1`/`-1` with per-side cost.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BinaryTask<'a> {
    pub samples: &'a [&'a [FeatureNode]],
    /// `+1.0` or `-1.0` per sample.
    pub y: &'a [f64],
    /// Cost for positive samples.
    pub cp: f64,
    /// Cost for negative samples.
    pub cn: f64,
    /// Number of weights (features, bias included).
    pub w_size: usize,
}

impl BinaryTask<'_> {
    #[inline]
    pub fn l(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn cost(&self, i: usize) -> f64 {
        if self.y[i] > 0.0 {
            self.cp
        } else {
            self.cn
        }
    }
}

/// Stopping rule, permutation source and progress sink for one solver run.
pub(crate) struct SolveControl<'a> {
    pub eps: f64,
    pub max_iter: usize,
    pub rng: &'a mut Xoshiro256PlusPlus,
    pub logger: &'a TrainingLogger,
}

impl SolveControl<'_> {
    #[inline]
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut *self.rng);
    }
}

/// Outcome of one solver run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SolveStats {
    pub iterations: usize,
    pub converged: bool,
    /// Final objective value, for solvers that track it.
    pub objective: Option<f64>,
}

impl SolveStats {
    pub fn report(&self, row: usize, ctl: &SolveControl<'_>) {
        if !self.converged {
            ctl.logger.log_max_iter_reached(ctl.max_iter);
        }
        ctl.logger
            .log_solver_finished(row, self.iterations, self.objective);
    }
}
