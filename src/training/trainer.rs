//! Solver seam and the built-in linear solver.
//!
//! Training goes through the [`Solver`] trait so a caller can plug in a
//! different optimizer. [`train_with`] validates the parameter block with
//! the solver's own check and only then hands over the problem.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::{FeatureColumns, FeatureNode, Problem};
use crate::error::{LinearError, Result};
use crate::model::{LinearWeights, Model};

use super::classes::ClassGroups;
use super::dual::{self, SvcLoss};
use super::logger::TrainingLogger;
use super::multiclass::{self, MulticlassTask};
use super::params::{check_parameter, Parameter, SolverType};
use super::primal::{self, Penalty, PrimalLoss};
use super::task::{BinaryTask, SolveControl};

/// A training algorithm.
pub trait Solver {
    /// Reject a parameter block before training.
    ///
    /// Returns the rejection message, surfaced verbatim as
    /// [`LinearError::InvalidParameter`].
    fn check_parameter(&self, param: &Parameter) -> Option<String> {
        check_parameter(param).map(String::from)
    }

    /// Train a model on a validated parameter block.
    fn train(&self, problem: &Problem, param: &Parameter) -> Result<Model>;
}

/// Validate `param` with `solver`, then train.
pub fn train_with<S: Solver + ?Sized>(
    solver: &S,
    problem: &Problem,
    param: &Parameter,
) -> Result<Model> {
    if let Some(message) = solver.check_parameter(param) {
        return Err(LinearError::InvalidParameter(message));
    }
    solver.train(problem, param)
}

/// Train with the built-in solvers.
pub fn train(problem: &Problem, param: &Parameter) -> Result<Model> {
    train_with(&LinearSolver, problem, param)
}

/// Coordinate-descent solvers for every [`SolverType`].
///
/// Two classes train one weight vector (`+1` is the first label seen);
/// more classes train one-vs-rest, except [`SolverType::McsvmCs`] which
/// trains all classes jointly.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearSolver;

impl Solver for LinearSolver {
    fn train(&self, problem: &Problem, param: &Parameter) -> Result<Model> {
        let arena = problem.arena()?;
        if problem.l() == 0 {
            return Err(LinearError::InvalidParameter(
                "problem has no samples".to_string(),
            ));
        }
        let samples: Vec<&[FeatureNode]> = arena.samples().collect();
        let w_size = problem.n().max(0) as usize;

        let groups = ClassGroups::new(problem.labels());
        let nr_class = groups.nr_class();
        let nr_w = param.solver.weight_rows(nr_class);
        tracing::debug!(labels = ?groups.labels(), counts = ?groups.counts(), "grouped classes");

        let mut logger = TrainingLogger::new(param.verbosity);
        logger.start_training(param.solver.name(), problem.l(), problem.n(), nr_class);

        let weighted_c = groups.weighted_c(param, &logger);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(param.seed);
        let mut ctl = SolveControl {
            eps: param.eps,
            max_iter: param.max_iter,
            rng: &mut rng,
            logger: &logger,
        };

        let weights = if param.solver.is_crammer_singer() {
            let task = MulticlassTask {
                samples: &samples,
                class_of: groups.class_of(),
                cost: &weighted_c,
                w_size,
            };
            let mut w = vec![0.0; w_size * nr_class];
            let stats = multiclass::solve(&task, nr_class, &mut w, &mut ctl);
            stats.report(0, &ctl);
            LinearWeights::from_flat(w, w_size, nr_class)?
        } else {
            let mut columns = None;
            let mut weights = LinearWeights::zeros(w_size, nr_w);

            // (positive class, cost of positives, cost of the rest)
            let runs: Vec<(usize, f64, f64)> = if nr_class == 2 {
                vec![(0, weighted_c[0], weighted_c[1])]
            } else {
                (0..nr_class).map(|k| (k, weighted_c[k], param.c)).collect()
            };
            for (row, &(class, cp, cn)) in runs.iter().enumerate() {
                let y = groups.one_vs_rest(class);
                let task = BinaryTask {
                    samples: &samples,
                    y: &y,
                    cp,
                    cn,
                    w_size,
                };
                let w = train_one(param.solver, &task, &mut columns, row, &mut ctl);
                weights
                    .column_mut(row)
                    .iter_mut()
                    .zip(w)
                    .for_each(|(dst, v)| *dst = v);
            }
            weights
        };

        logger.finish_training();

        let (nr_feature, bias) = if problem.has_bias() {
            (w_size - 1, problem.bias())
        } else {
            (w_size, -1.0)
        };
        Model::new(param.solver, groups.labels().to_vec(), nr_feature, bias, weights)
    }
}

/// Train one weight vector for a two-class task.
///
/// The column index is built on first use and shared across rows.
fn train_one(
    solver: SolverType,
    task: &BinaryTask<'_>,
    columns: &mut Option<FeatureColumns>,
    row: usize,
    ctl: &mut SolveControl<'_>,
) -> Vec<f64> {
    let mut w = vec![0.0; task.w_size];
    let (loss, penalty) = match solver {
        SolverType::L2rL2LossSvcDual | SolverType::L2rL1LossSvcDual => {
            let loss = if solver == SolverType::L2rL2LossSvcDual {
                SvcLoss::L2
            } else {
                SvcLoss::L1
            };
            let stats = dual::solve_svc(task, loss, &mut w, ctl);
            stats.report(row, ctl);
            return w;
        }
        SolverType::L2rLrDual => {
            let stats = dual::solve_lr(task, &mut w, ctl);
            stats.report(row, ctl);
            return w;
        }
        SolverType::L2rLr => (PrimalLoss::Logistic, Penalty::L2),
        SolverType::L2rL2LossSvc => (PrimalLoss::SquaredHinge, Penalty::L2),
        SolverType::L1rLr => (PrimalLoss::Logistic, Penalty::L1),
        SolverType::L1rL2LossSvc => (PrimalLoss::SquaredHinge, Penalty::L1),
        SolverType::McsvmCs => unreachable!("Crammer-Singer trains all classes jointly"),
    };
    let columns = columns.get_or_insert_with(|| FeatureColumns::from_samples(task.samples, task.w_size));
    let stats = primal::solve(task, columns, loss, penalty, &mut w, ctl);
    stats.report(row, ctl);
    w
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::BTreeMap;

    struct Rejecting;

    impl Solver for Rejecting {
        fn check_parameter(&self, _param: &Parameter) -> Option<String> {
            Some("solver refuses".to_string())
        }

        fn train(&self, _problem: &Problem, _param: &Parameter) -> Result<Model> {
            unreachable!("train must not run after a rejected parameter")
        }
    }

    fn problem() -> Problem {
        let samples = vec![
            BTreeMap::from([(1, 1.0)]),
            BTreeMap::from([(1, -1.0)]),
            BTreeMap::from([(2, 1.0)]),
        ];
        Problem::new(&[3, 1, 2], &samples, 1.0, 2).unwrap()
    }

    #[test]
    fn rejection_message_is_verbatim() {
        let err = train_with(&Rejecting, &problem(), &Parameter::new(SolverType::L2rLr)).unwrap_err();
        match err {
            LinearError::InvalidParameter(message) => assert_eq!(message, "solver refuses"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn default_check_runs_before_training() {
        let param = Parameter {
            eps: -1.0,
            ..Parameter::new(SolverType::L2rLr)
        };
        let err = train(&problem(), &param).unwrap_err();
        assert_eq!(err.to_string(), "invalid parameter: eps <= 0");
    }

    #[test]
    fn destroyed_problem_cannot_train() {
        let mut problem = problem();
        problem.destroy();
        let err = train(&problem, &Parameter::new(SolverType::L2rLr)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceDestroyed);
    }

    #[test]
    fn one_vs_rest_shape_and_label_order() {
        let model = train(&problem(), &Parameter::new(SolverType::L2rL2LossSvcDual)).unwrap();
        assert_eq!(model.labels(), &[3, 1, 2]);
        assert_eq!(model.nr_w(), 3);
        assert_eq!(model.nr_feature(), 2);
        assert_eq!(model.bias(), 1.0);
        assert_eq!(model.weights().n_rows(), 3);
    }

    #[test]
    fn crammer_singer_trains_every_class_row() {
        let samples = vec![vec![(1, 1.0)], vec![(1, -1.0)]];
        let problem = Problem::new(&[1, -1], &samples, 1.0, 1).unwrap();
        let model = train(&problem, &Parameter::new(SolverType::McsvmCs)).unwrap();
        assert_eq!(model.nr_w(), 2);
        assert_eq!(model.solver_type(), SolverType::McsvmCs);
        assert_eq!(model.predict(&model.feature_nodes(&vec![(1, 2.0)])), 1);
    }

    #[test]
    fn no_bias_model_stores_minus_one() {
        let samples = vec![vec![(1, 1.0)], vec![(1, -1.0)]];
        let problem = Problem::new(&[1, -1], &samples, 0.0, 1).unwrap();
        let model = train(&problem, &Parameter::new(SolverType::L1rLr)).unwrap();
        assert_eq!(model.bias(), -1.0);
        assert_eq!(model.weights().n_rows(), 1);
        assert_eq!(model.nr_w(), 1);
    }
}
