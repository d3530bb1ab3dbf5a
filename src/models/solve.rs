//! Dense linear solvers for normal equations

use crate::error::{Result, TabfitError};
use ndarray::{Array1, Array2};

/// Solve the symmetric system `A x = b` arising from normal equations.
///
/// Tries a Cholesky factorization first, retries once with a small ridge
/// added to the diagonal when `A` is not positive definite, and falls back
/// to Gauss-Jordan elimination before giving up.
pub(crate) fn solve_normal_equations(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return Err(TabfitError::ShapeMismatch {
            expected: format!("{n}x{n} system"),
            actual: format!("{}x{} matrix, {} rhs", a.nrows(), a.ncols(), b.len()),
        });
    }

    if let Some(l) = cholesky_factor(a) {
        return Ok(substitute(&l, b));
    }

    // Not positive definite: jitter the diagonal and retry.
    let jitter = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n.max(1) as f64;
    let mut regularized = a.clone();
    for i in 0..n {
        regularized[[i, i]] += jitter;
    }
    if let Some(l) = cholesky_factor(&regularized) {
        return Ok(substitute(&l, b));
    }

    gauss_jordan_solve(a, b).ok_or_else(|| {
        TabfitError::Computation("singular system in normal equations".to_string())
    })
}

/// Lower-triangular Cholesky factor of `a`, or `None` when `a` is not
/// positive definite.
fn cholesky_factor(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    Some(l)
}

/// Solve `L L^T x = b` by forward then backward substitution.
fn substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();

    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    x
}

/// Gauss-Jordan elimination with partial pivoting on the augmented system.
fn gauss_jordan_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut aug = Array2::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n]] = b[i];
    }

    for col in 0..n {
        let mut pivot = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[pivot, col]].abs() {
                pivot = row;
            }
        }
        if aug[[pivot, col]].abs() < 1e-12 {
            return None;
        }
        if pivot != col {
            for j in 0..=n {
                let tmp = aug[[col, j]];
                aug[[col, j]] = aug[[pivot, j]];
                aug[[pivot, j]] = tmp;
            }
        }

        let pivot_val = aug[[col, col]];
        for j in 0..=n {
            aug[[col, j]] /= pivot_val;
        }
        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                if factor != 0.0 {
                    for j in 0..=n {
                        aug[[row, j]] -= factor * aug[[col, j]];
                    }
                }
            }
        }
    }

    Some(Array1::from_shape_fn(n, |i| aug[[i, n]]))
}
