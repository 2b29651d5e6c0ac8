//! Solver selection and training parameters.
//!
//! [`Parameter`] uses the `bon` builder with a validating finishing function,
//! so an invalid parameter block never reaches a solver.
//!
//! # Example
//!
//! ```
//! use sparselin::training::{Parameter, SolverType};
//!
//! let param = Parameter::builder()
//!     .solver(SolverType::L2rLr)
//!     .c(10.0)
//!     .weights(vec![(1, 2.0)])
//!     .build()
//!     .unwrap();
//! assert_eq!(param.eps, 0.01);
//!
//! let err = Parameter::builder()
//!     .solver(SolverType::L2rLr)
//!     .eps(0.0)
//!     .build()
//!     .unwrap_err();
//! assert_eq!(err.to_string(), "invalid parameter: eps <= 0");
//! ```

use std::fmt;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{LinearError, Result};

use super::logger::Verbosity;

// =============================================================================
// SolverType
// =============================================================================

/// Training algorithm.
///
/// Names and numeric ids follow the liblinear convention and are used by both
/// model file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolverType {
    /// L2-regularized logistic regression (primal).
    #[serde(rename = "L2R_LR")]
    L2rLr,
    /// L2-regularized L2-loss support vector classification (dual).
    #[serde(rename = "L2R_L2LOSS_SVC_DUAL")]
    L2rL2LossSvcDual,
    /// L2-regularized L2-loss support vector classification (primal).
    #[serde(rename = "L2R_L2LOSS_SVC")]
    L2rL2LossSvc,
    /// L2-regularized L1-loss support vector classification (dual).
    #[serde(rename = "L2R_L1LOSS_SVC_DUAL")]
    L2rL1LossSvcDual,
    /// Multiclass support vector classification by Crammer and Singer.
    #[serde(rename = "MCSVM_CS")]
    McsvmCs,
    /// L1-regularized L2-loss support vector classification.
    #[serde(rename = "L1R_L2LOSS_SVC")]
    L1rL2LossSvc,
    /// L1-regularized logistic regression.
    #[serde(rename = "L1R_LR")]
    L1rLr,
    /// L2-regularized logistic regression (dual).
    #[serde(rename = "L2R_LR_DUAL")]
    L2rLrDual,
}

impl SolverType {
    pub const ALL: [SolverType; 8] = [
        SolverType::L2rLr,
        SolverType::L2rL2LossSvcDual,
        SolverType::L2rL2LossSvc,
        SolverType::L2rL1LossSvcDual,
        SolverType::McsvmCs,
        SolverType::L1rL2LossSvc,
        SolverType::L1rLr,
        SolverType::L2rLrDual,
    ];

    /// Numeric solver id.
    pub fn id(self) -> i32 {
        match self {
            SolverType::L2rLr => 0,
            SolverType::L2rL2LossSvcDual => 1,
            SolverType::L2rL2LossSvc => 2,
            SolverType::L2rL1LossSvcDual => 3,
            SolverType::McsvmCs => 4,
            SolverType::L1rL2LossSvc => 5,
            SolverType::L1rLr => 6,
            SolverType::L2rLrDual => 7,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// liblinear name, e.g. `"L2R_LR"`.
    pub fn name(self) -> &'static str {
        match self {
            SolverType::L2rLr => "L2R_LR",
            SolverType::L2rL2LossSvcDual => "L2R_L2LOSS_SVC_DUAL",
            SolverType::L2rL2LossSvc => "L2R_L2LOSS_SVC",
            SolverType::L2rL1LossSvcDual => "L2R_L1LOSS_SVC_DUAL",
            SolverType::McsvmCs => "MCSVM_CS",
            SolverType::L1rL2LossSvc => "L1R_L2LOSS_SVC",
            SolverType::L1rLr => "L1R_LR",
            SolverType::L2rLrDual => "L2R_LR_DUAL",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Whether the solver yields calibrated probabilities.
    pub fn is_logistic(self) -> bool {
        matches!(
            self,
            SolverType::L2rLr | SolverType::L1rLr | SolverType::L2rLrDual
        )
    }

    /// Whether the solver trains all classes jointly.
    pub fn is_crammer_singer(self) -> bool {
        self == SolverType::McsvmCs
    }

    /// Number of weight rows for a model with `nr_class` classes.
    ///
    /// Binary problems collapse to one row, except for Crammer–Singer.
    pub fn weight_rows(self, nr_class: usize) -> usize {
        if nr_class == 2 && !self.is_crammer_singer() {
            1
        } else {
            nr_class
        }
    }
}

impl fmt::Display for SolverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Parameter
// =============================================================================

/// Parameters for one training call.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct Parameter {
    /// Training algorithm.
    pub solver: SolverType,

    /// Stopping tolerance. Default: 0.01.
    #[builder(default = 0.01)]
    pub eps: f64,

    /// Regularization strength (cost of constraint violation). Default: 1.0.
    #[builder(default = 1.0)]
    pub c: f64,

    /// Per-class multipliers of `c`, as `(label, weight)` pairs.
    ///
    /// Labels absent from the training data are ignored with a warning.
    #[builder(default)]
    pub weights: Vec<(i32, f64)>,

    /// Outer iteration cap for every solver. Default: 1000.
    #[builder(default = 1000)]
    pub max_iter: usize,

    /// Seed for the coordinate permutation. Default: 1.
    #[builder(default = 1)]
    pub seed: u64,

    /// Progress reporting for this call. Default: `Silent`.
    #[builder(default)]
    pub verbosity: Verbosity,
}

impl<S: parameter_builder::IsComplete> ParameterBuilder<S> {
    /// Build and validate the parameter block.
    ///
    /// # Errors
    ///
    /// [`LinearError::InvalidParameter`] carrying the
    /// [`check_parameter`] message.
    pub fn build(self) -> Result<Parameter> {
        let param = self.__build_internal();
        match check_parameter(&param) {
            Some(message) => Err(LinearError::InvalidParameter(message.to_string())),
            None => Ok(param),
        }
    }
}

impl Parameter {
    /// Default parameters for `solver`.
    pub fn new(solver: SolverType) -> Self {
        Self {
            solver,
            eps: 0.01,
            c: 1.0,
            weights: Vec::new(),
            max_iter: 1000,
            seed: 1,
            verbosity: Verbosity::Silent,
        }
    }

    /// Boolean shorthand for [`verbosity`](Self::verbosity).
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbosity = Verbosity::from(verbose);
        self
    }

    /// Weight multiplier configured for `label`, if any.
    ///
    /// When a label is listed more than once the last entry wins.
    pub fn class_weight(&self, label: i32) -> Option<f64> {
        self.weights
            .iter()
            .rev()
            .find(|(l, _)| *l == label)
            .map(|&(_, w)| w)
    }
}

/// Validate a parameter block.
///
/// Returns the first problem found, or `None` if the block is usable.
pub fn check_parameter(param: &Parameter) -> Option<&'static str> {
    if !(param.eps > 0.0) {
        return Some("eps <= 0");
    }
    if !(param.c > 0.0) {
        return Some("C <= 0");
    }
    if param.weights.iter().any(|&(_, w)| !(w > 0.0)) {
        return Some("class weight <= 0");
    }
    if param.max_iter == 0 {
        return Some("max_iter == 0");
    }
    None
}
