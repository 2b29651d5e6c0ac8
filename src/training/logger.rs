//! Per-call training progress logging.
//!
//! Each training call owns a [`TrainingLogger`] built from the
//! [`Verbosity`] carried in its [`Parameter`](super::Parameter). Messages
//! below the configured level are dropped before they reach `tracing`.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// How much a training call reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Nothing.
    #[default]
    Silent,
    /// Non-convergence and ignored class weights.
    Warning,
    /// Start, finish and per-class solver summaries.
    Info,
    /// Per-iteration progress.
    Debug,
}

impl From<bool> for Verbosity {
    fn from(verbose: bool) -> Self {
        if verbose {
            Verbosity::Info
        } else {
            Verbosity::Silent
        }
    }
}

/// Training progress reporter scoped to one call.
#[derive(Debug)]
pub struct TrainingLogger {
    verbosity: Verbosity,
    started: Option<Instant>,
}

impl TrainingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            started: None,
        }
    }

    #[inline]
    fn enabled(&self, level: Verbosity) -> bool {
        level != Verbosity::Silent && self.verbosity >= level
    }

    pub fn start_training(&mut self, solver: &str, l: usize, n: i32, nr_class: usize) {
        self.started = Some(Instant::now());
        if self.enabled(Verbosity::Info) {
            tracing::info!(solver, l, n, nr_class, "training started");
        }
    }

    /// Summary of one solver run (one weight row, or the whole multiclass problem).
    pub fn log_solver_finished(&self, row: usize, iterations: usize, objective: Option<f64>) {
        if self.enabled(Verbosity::Info) {
            match objective {
                Some(objective) => tracing::info!(row, iterations, objective, "solver finished"),
                None => tracing::info!(row, iterations, "solver finished"),
            }
        }
    }

    pub fn log_iteration(&self, iteration: usize, violation: f64) {
        if self.enabled(Verbosity::Debug) {
            tracing::debug!(iteration, violation, "solver iteration");
        }
    }

    pub fn log_max_iter_reached(&self, max_iter: usize) {
        if self.enabled(Verbosity::Warning) {
            tracing::warn!(
                max_iter,
                "reached max number of iterations; consider a larger eps or scaled data"
            );
        }
    }

    pub fn log_unknown_weight_label(&self, label: i32) {
        if self.enabled(Verbosity::Warning) {
            tracing::warn!(label, "class weight label not found in training data");
        }
    }

    pub fn finish_training(&self) {
        if self.enabled(Verbosity::Info) {
            let elapsed = self.started.map(|t| t.elapsed().as_secs_f64()).unwrap_or(0.0);
            tracing::info!(elapsed_secs = elapsed, "training finished");
        }
    }
}
