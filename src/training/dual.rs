//! Dual coordinate descent for L2-regularized binary classifiers.
//!
//! Both solvers keep `w = Σ αᵢ yᵢ xᵢ` up to date while visiting one dual
//! variable at a time in a freshly shuffled order each outer iteration.
//!
//! - [`solve_svc`]: L1-loss and L2-loss SVC, with shrinking of variables
//!   stuck at a bound.
//! - [`solve_lr`]: logistic regression, each coordinate solved by a
//!   safeguarded inner Newton iteration.

use crate::data::{sparse_axpy, sparse_dot, squared_norm};

use super::task::{BinaryTask, SolveControl, SolveStats};

/// Hinge loss variant for [`solve_svc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SvcLoss {
    L1,
    L2,
}

/// Dual coordinate descent for L2-regularized L1/L2-loss SVC.
///
/// Minimizes `½ αᵀQ̄α − eᵀα` subject to `0 ≤ αᵢ ≤ Uᵢ`, where
/// `Q̄ = Q + D` with `D = 0, U = C` for the L1 loss and `D = 1/(2C), U = ∞`
/// for the L2 loss. `w` must be zeroed and have length `task.w_size`.
pub(crate) fn solve_svc(
    task: &BinaryTask<'_>,
    loss: SvcLoss,
    w: &mut [f64],
    ctl: &mut SolveControl<'_>,
) -> SolveStats {
    let l = task.l();
    let w_size = task.w_size;

    let (diag, upper): (Vec<f64>, Vec<f64>) = (0..l)
        .map(|i| match loss {
            SvcLoss::L2 => (0.5 / task.cost(i), f64::INFINITY),
            SvcLoss::L1 => (0.0, task.cost(i)),
        })
        .unzip();
    let qd: Vec<f64> = (0..l)
        .map(|i| diag[i] + squared_norm(task.samples[i]))
        .collect();

    let mut alpha = vec![0.0; l];
    let mut index: Vec<usize> = (0..l).collect();
    let mut active_size = l;
    let mut pg_max_old = f64::INFINITY;
    let mut pg_min_old = f64::NEG_INFINITY;
    let mut iter = 0;
    let mut converged = false;

    while iter < ctl.max_iter {
        let mut pg_max_new = f64::NEG_INFINITY;
        let mut pg_min_new = f64::INFINITY;

        ctl.shuffle(&mut index[..active_size]);

        let mut s = 0;
        while s < active_size {
            let i = index[s];
            let yi = task.y[i];
            let xi = task.samples[i];

            let mut g = yi * sparse_dot(xi, w, w_size, 1, 0) - 1.0;
            g += alpha[i] * diag[i];
            let c = upper[i];

            let mut pg = 0.0;
            if alpha[i] == 0.0 {
                if g > pg_max_old {
                    active_size -= 1;
                    index.swap(s, active_size);
                    continue;
                } else if g < 0.0 {
                    pg = g;
                }
            } else if alpha[i] == c {
                if g < pg_min_old {
                    active_size -= 1;
                    index.swap(s, active_size);
                    continue;
                } else if g > 0.0 {
                    pg = g;
                }
            } else {
                pg = g;
            }

            pg_max_new = pg_max_new.max(pg);
            pg_min_new = pg_min_new.min(pg);

            if pg.abs() > 1.0e-12 {
                let alpha_old = alpha[i];
                alpha[i] = (alpha[i] - g / qd[i]).max(0.0).min(c);
                let d = (alpha[i] - alpha_old) * yi;
                sparse_axpy(xi, d, w, w_size, 1, 0);
            }
            s += 1;
        }

        iter += 1;
        ctl.logger.log_iteration(iter, pg_max_new - pg_min_new);

        if pg_max_new - pg_min_new <= ctl.eps {
            if active_size == l {
                converged = true;
                break;
            }
            // Shrunk problem converged: re-check on the full set.
            active_size = l;
            pg_max_old = f64::INFINITY;
            pg_min_old = f64::NEG_INFINITY;
            continue;
        }
        pg_max_old = pg_max_new;
        pg_min_old = pg_min_new;
        if pg_max_old <= 0.0 {
            pg_max_old = f64::INFINITY;
        }
        if pg_min_old >= 0.0 {
            pg_min_old = f64::NEG_INFINITY;
        }
    }

    let w_norm: f64 = w.iter().map(|v| v * v).sum();
    let dual: f64 = alpha
        .iter()
        .zip(&diag)
        .map(|(&a, &d)| a * (a * d - 2.0))
        .sum();

    SolveStats {
        iterations: iter,
        converged,
        objective: Some((w_norm + dual) / 2.0),
    }
}

const INNER_MAX_ITER: usize = 100;

/// Dual coordinate descent for L2-regularized logistic regression.
///
/// Each sample carries a pair `(αᵢ, Cᵢ − αᵢ)`; one coordinate step solves
/// the one-variable subproblem in `z` with Newton steps, falling back to
/// shrinking `z` towards zero when a step would leave the domain.
pub(crate) fn solve_lr(task: &BinaryTask<'_>, w: &mut [f64], ctl: &mut SolveControl<'_>) -> SolveStats {
    let l = task.l();
    let w_size = task.w_size;

    let mut inner_eps = 1.0e-2;
    let inner_eps_min = ctl.eps.min(1.0e-8);

    let mut alpha = vec![0.0; 2 * l];
    let mut xtx = vec![0.0; l];
    for i in 0..l {
        let c = task.cost(i);
        alpha[2 * i] = (0.001 * c).min(1.0e-8);
        alpha[2 * i + 1] = c - alpha[2 * i];
        xtx[i] = squared_norm(task.samples[i]);
        sparse_axpy(task.samples[i], task.y[i] * alpha[2 * i], w, w_size, 1, 0);
    }

    let mut index: Vec<usize> = (0..l).collect();
    let mut iter = 0;
    let mut converged = false;

    while iter < ctl.max_iter {
        ctl.shuffle(&mut index);
        let mut newton_iter = 0;
        let mut g_max: f64 = 0.0;

        for &i in &index {
            let yi = task.y[i];
            let xi = task.samples[i];
            let c = task.cost(i);
            let a = xtx[i];
            let b = yi * sparse_dot(xi, w, w_size, 1, 0);

            let (mut ind1, mut ind2, mut sign) = (2 * i, 2 * i + 1, 1.0);
            if 0.5 * a * (alpha[ind2] - alpha[ind1]) + b < 0.0 {
                ind1 = 2 * i + 1;
                ind2 = 2 * i;
                sign = -1.0;
            }

            let alpha_old = alpha[ind1];
            let mut z = alpha_old;
            if c - z < 0.5 * c {
                z *= 0.1;
            }
            let gradient = |z: f64| a * (z - alpha_old) + sign * b + (z / (c - z)).ln();
            let mut gp = gradient(z);
            g_max = g_max.max(gp.abs());

            let mut inner_iter = 0;
            while inner_iter <= INNER_MAX_ITER {
                if gp.abs() < inner_eps {
                    break;
                }
                let gpp = a + c / (c - z) / z;
                let next = z - gp / gpp;
                if next <= 0.0 {
                    z *= 0.1;
                } else {
                    z = next;
                }
                gp = gradient(z);
                newton_iter += 1;
                inner_iter += 1;
            }

            if inner_iter > 0 {
                alpha[ind1] = z;
                alpha[ind2] = c - z;
                sparse_axpy(xi, sign * (z - alpha_old) * yi, w, w_size, 1, 0);
            }
        }

        iter += 1;
        ctl.logger.log_iteration(iter, g_max);

        if g_max < ctl.eps {
            converged = true;
            break;
        }
        if newton_iter <= l / 10 {
            inner_eps = inner_eps_min.max(0.1 * inner_eps);
        }
    }

    // ½wᵀw + Σ (α log α + (C−α) log(C−α) − C log C)
    let mut objective: f64 = 0.5 * w.iter().map(|v| v * v).sum::<f64>();
    for i in 0..l {
        let c = task.cost(i);
        for &a in &alpha[2 * i..2 * i + 2] {
            if a > 0.0 {
                objective += a * a.ln();
            }
        }
        objective -= c * c.ln();
    }

    SolveStats {
        iterations: iter,
        converged,
        objective: Some(objective),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FeatureNode, ProblemBuilder};
    use crate::training::{TrainingLogger, Verbosity};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn separable() -> (Vec<Vec<(i32, f64)>>, Vec<f64>) {
        let samples = vec![
            vec![(1, 2.0), (2, 1.0)],
            vec![(1, 1.5), (2, 2.0)],
            vec![(1, 3.0), (2, 0.5)],
            vec![(1, -2.0), (2, -1.0)],
            vec![(1, -1.0), (2, -2.5)],
            vec![(1, -3.0), (2, -0.5)],
        ];
        let y = vec![1.0, 1.0, 1.0, -1.0, -1.0, -1.0];
        (samples, y)
    }

    fn run(solve: impl Fn(&BinaryTask<'_>, &mut [f64], &mut SolveControl<'_>) -> SolveStats) -> (Vec<f64>, SolveStats, Vec<Vec<FeatureNode>>) {
        let (samples, y) = separable();
        let labels: Vec<i32> = y.iter().map(|&v| v as i32).collect();
        let problem = ProblemBuilder::new(2).bias(1.0).build(&labels, &samples).unwrap();
        let owned: Vec<Vec<FeatureNode>> = problem.samples().unwrap().map(|s| s.to_vec()).collect();
        let rows: Vec<&[FeatureNode]> = owned.iter().map(Vec::as_slice).collect();
        let task = BinaryTask {
            samples: &rows,
            y: &y,
            cp: 1.0,
            cn: 1.0,
            w_size: 3,
        };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let logger = TrainingLogger::new(Verbosity::Silent);
        let mut ctl = SolveControl {
            eps: 0.001,
            max_iter: 1000,
            rng: &mut rng,
            logger: &logger,
        };
        let mut w = vec![0.0; 3];
        let stats = solve(&task, &mut w, &mut ctl);
        (w, stats, owned)
    }

    fn assert_separates(w: &[f64], samples: &[Vec<FeatureNode>]) {
        let y = separable().1;
        for (nodes, &yi) in samples.iter().zip(&y) {
            let margin = yi * sparse_dot(nodes, w, 3, 1, 0);
            assert!(margin > 0.0, "margin {margin} for {nodes:?}");
        }
    }

    #[test]
    fn l2_loss_svc_separates() {
        let (w, stats, samples) = run(|t, w, c| solve_svc(t, SvcLoss::L2, w, c));
        assert!(stats.converged);
        assert_separates(&w, &samples);
    }

    #[test]
    fn l1_loss_svc_separates() {
        let (w, stats, samples) = run(|t, w, c| solve_svc(t, SvcLoss::L1, w, c));
        assert!(stats.converged);
        assert_separates(&w, &samples);
    }

    #[test]
    fn lr_dual_separates() {
        let (w, stats, samples) = run(solve_lr);
        assert!(stats.converged);
        assert_separates(&w, &samples);
    }
}
