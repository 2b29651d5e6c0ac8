//! Crammer–Singer multiclass SVM, solved in the dual.
//!
//! Every sample owns one dual variable per class. A coordinate step updates a
//! whole sample's block at once by solving a small simplex-constrained
//! quadratic subproblem in closed form.

use crate::data::{sparse_axpy, sparse_dot, squared_norm, FeatureNode};

use super::task::{SolveControl, SolveStats};

/// Inputs for [`solve`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct MulticlassTask<'a> {
    pub samples: &'a [&'a [FeatureNode]],
    /// Class index of every sample.
    pub class_of: &'a [usize],
    /// Cost per class.
    pub cost: &'a [f64],
    pub w_size: usize,
}

/// Closed-form solution of one sample's block subproblem.
///
/// Minimizes `½ A ‖α‖² + Bᵀα` subject to `Σα = 0`, `α_m ≤ 0` for `m ≠ y` and
/// `α_y ≤ C_y`.
fn solve_sub_problem(a: f64, y: usize, c_y: f64, b: &[f64], alpha_new: &mut [f64]) {
    let mut d = b.to_vec();
    d[y] += a * c_y;
    d.sort_by(|p, q| q.total_cmp(p));

    let mut beta = d[0] - a * c_y;
    let mut r = 1;
    while r < d.len() && beta < r as f64 * d[r] {
        beta += d[r];
        r += 1;
    }
    beta /= r as f64;

    for (m, (alpha, &bm)) in alpha_new.iter_mut().zip(b).enumerate() {
        let bound = if m == y { c_y } else { 0.0 };
        *alpha = ((beta - bm) / a).min(bound);
    }
}

/// Dual block coordinate descent.
///
/// `w` is feature-major, `w[(index - 1) * nr_class + m]`, zeroed on entry.
/// Stops when the largest gradient spread of an iteration drops below `eps`.
pub(crate) fn solve(
    task: &MulticlassTask<'_>,
    nr_class: usize,
    w: &mut [f64],
    ctl: &mut SolveControl<'_>,
) -> SolveStats {
    let l = task.samples.len();
    let w_size = task.w_size;
    let qd: Vec<f64> = task.samples.iter().map(|x| squared_norm(x)).collect();

    let mut alpha = vec![0.0; l * nr_class];
    let mut g = vec![0.0; nr_class];
    let mut b = vec![0.0; nr_class];
    let mut alpha_new = vec![0.0; nr_class];
    let mut index: Vec<usize> = (0..l).collect();
    let mut iter = 0;
    let mut converged = false;

    while iter < ctl.max_iter {
        ctl.shuffle(&mut index);
        let mut stopping = f64::NEG_INFINITY;

        for &i in &index {
            let a = qd[i];
            if a <= 0.0 {
                continue;
            }
            let xi = task.samples[i];
            let yi = task.class_of[i];
            let c_y = task.cost[yi];
            let alpha_i = &mut alpha[i * nr_class..(i + 1) * nr_class];

            for (m, gm) in g.iter_mut().enumerate() {
                let margin = if m == yi { 0.0 } else { 1.0 };
                *gm = margin + sparse_dot(xi, w, w_size, nr_class, m);
            }

            let mut min_g = f64::INFINITY;
            let mut max_g = f64::NEG_INFINITY;
            for m in 0..nr_class {
                let below_bound = if m == yi { alpha_i[m] < c_y } else { alpha_i[m] < 0.0 };
                if below_bound {
                    min_g = min_g.min(g[m]);
                }
                max_g = max_g.max(g[m]);
            }
            stopping = stopping.max(max_g - min_g);
            if max_g - min_g <= 1.0e-12 {
                continue;
            }

            for m in 0..nr_class {
                b[m] = g[m] - a * alpha_i[m];
            }
            solve_sub_problem(a, yi, c_y, &b, &mut alpha_new);

            for m in 0..nr_class {
                let d = alpha_new[m] - alpha_i[m];
                alpha_i[m] = alpha_new[m];
                if d.abs() > 1.0e-12 {
                    sparse_axpy(xi, d, w, w_size, nr_class, m);
                }
            }
        }

        iter += 1;
        ctl.logger.log_iteration(iter, stopping);
        if stopping < ctl.eps {
            converged = true;
            break;
        }
    }

    SolveStats {
        iterations: iter,
        converged,
        objective: None,
    }
}
