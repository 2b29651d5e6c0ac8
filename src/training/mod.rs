//! Training: parameters, logging and the built-in solvers.
//!
//! # Overview
//!
//! - [`Parameter`], [`SolverType`]: what to train and how
//! - [`TrainingLogger`], [`Verbosity`]: per-call progress reporting
//! - [`Solver`]: the training seam; [`LinearSolver`] is the built-in one
//! - [`ClassGroups`]: label order and per-class cost
//!
//! ## Solvers
//!
//! | Solver | Method |
//! |---|---|
//! | `L2R_L2LOSS_SVC_DUAL`, `L2R_L1LOSS_SVC_DUAL` | dual coordinate descent with shrinking |
//! | `L2R_LR_DUAL` | dual coordinate descent, inner Newton |
//! | `L2R_LR`, `L2R_L2LOSS_SVC` | primal coordinate descent |
//! | `L1R_LR`, `L1R_L2LOSS_SVC` | primal coordinate descent, soft thresholding |
//! | `MCSVM_CS` | Crammer–Singer dual block coordinate descent |

mod classes;
mod dual;
mod logger;
mod multiclass;
mod params;
mod primal;
mod task;
mod trainer;

pub use classes::ClassGroups;
pub use logger::{TrainingLogger, Verbosity};
pub use params::{check_parameter, Parameter, ParameterBuilder, SolverType};
pub use trainer::{train, train_with, LinearSolver, Solver};
