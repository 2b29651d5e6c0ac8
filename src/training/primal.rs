//! Primal coordinate descent over feature columns.
//!
//! One outer iteration visits every weight in shuffled order. For weight `j`
//! the loss is replaced by a quadratic upper bound built from its gradient
//! and a global bound on its curvature, then minimized exactly:
//!
//! - L2 regularization: a Newton step on `½w² + bound`.
//! - L1 regularization: a soft-thresholded step on `|w| + bound`.
//!
//! Margins `sᵢ = w·xᵢ` are cached and patched after every update, so each
//! step costs one pass over a single column.

use crate::data::FeatureColumns;

use super::task::{BinaryTask, SolveControl, SolveStats};

/// Loss minimized by [`solve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PrimalLoss {
    /// `log(1 + exp(−y s))`
    Logistic,
    /// `max(0, 1 − y s)²`
    SquaredHinge,
}

impl PrimalLoss {
    /// `∂loss/∂s` for one sample.
    #[inline]
    fn derivative(self, y: f64, s: f64) -> f64 {
        match self {
            PrimalLoss::Logistic => -y / (1.0 + (y * s).exp()),
            PrimalLoss::SquaredHinge => -2.0 * y * (1.0 - y * s).max(0.0),
        }
    }

    /// Upper bound of `∂²loss/∂s²`.
    #[inline]
    fn curvature_bound(self) -> f64 {
        match self {
            PrimalLoss::Logistic => 0.25,
            PrimalLoss::SquaredHinge => 2.0,
        }
    }
}

/// Regularizer minimized by [`solve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Penalty {
    /// `½‖w‖²`
    L2,
    /// `‖w‖₁`
    L1,
}

/// Soft-thresholding operator.
///
/// S(x, λ) = sign(x) × max(|x| − λ, 0)
#[inline]
fn soft_threshold(x: f64, threshold: f64) -> f64 {
    if x > threshold {
        x - threshold
    } else if x < -threshold {
        x + threshold
    } else {
        0.0
    }
}

/// Primal coordinate descent.
///
/// `w` must be zeroed and have length `task.w_size`. Stops once the largest
/// optimality violation of an iteration falls below `eps` times the one
/// measured in the first iteration.
pub(crate) fn solve(
    task: &BinaryTask<'_>,
    columns: &FeatureColumns,
    loss: PrimalLoss,
    penalty: Penalty,
    w: &mut [f64],
    ctl: &mut SolveControl<'_>,
) -> SolveStats {
    let l = task.l();
    let cost: Vec<f64> = (0..l).map(|i| task.cost(i)).collect();

    // Curvature bound of every column is fixed; compute it once.
    let bound: Vec<f64> = (0..task.w_size)
        .map(|j| {
            columns
                .column(j)
                .map(|(i, x)| cost[i] * x * x)
                .sum::<f64>()
                * loss.curvature_bound()
        })
        .collect();

    let mut margins = vec![0.0; l];
    let mut order: Vec<usize> = (0..task.w_size).collect();
    let mut initial_violation = None;
    let mut iter = 0;
    let mut converged = false;

    while iter < ctl.max_iter {
        ctl.shuffle(&mut order);
        let mut max_violation: f64 = 0.0;

        for &j in &order {
            let grad: f64 = columns
                .column(j)
                .map(|(i, x)| cost[i] * loss.derivative(task.y[i], margins[i]) * x)
                .sum();
            let wj = w[j];

            let (violation, next) = match penalty {
                Penalty::L2 => {
                    let g = wj + grad;
                    (g.abs(), wj - g / (1.0 + bound[j]))
                }
                Penalty::L1 => {
                    let violation = if wj > 0.0 {
                        (grad + 1.0).abs()
                    } else if wj < 0.0 {
                        (grad - 1.0).abs()
                    } else {
                        (grad.abs() - 1.0).max(0.0)
                    };
                    let next = if bound[j] > 0.0 {
                        soft_threshold(wj - grad / bound[j], 1.0 / bound[j])
                    } else {
                        0.0
                    };
                    (violation, next)
                }
            };
            max_violation = max_violation.max(violation);

            let delta = next - wj;
            if delta != 0.0 {
                w[j] = next;
                for (i, x) in columns.column(j) {
                    margins[i] += delta * x;
                }
            }
        }

        iter += 1;
        ctl.logger.log_iteration(iter, max_violation);

        let initial = *initial_violation.get_or_insert(max_violation);
        if max_violation <= ctl.eps * initial {
            converged = true;
            break;
        }
    }

    let regularizer = match penalty {
        Penalty::L2 => 0.5 * w.iter().map(|v| v * v).sum::<f64>(),
        Penalty::L1 => w.iter().map(|v| v.abs()).sum::<f64>(),
    };
    let data_loss: f64 = (0..l)
        .map(|i| {
            let z = task.y[i] * margins[i];
            cost[i]
                * match loss {
                    PrimalLoss::Logistic => (-z).exp().ln_1p(),
                    PrimalLoss::SquaredHinge => (1.0 - z).max(0.0).powi(2),
                }
        })
        .sum();

    SolveStats {
        iterations: iter,
        converged,
        objective: Some(regularizer + data_loss),
    }
}
