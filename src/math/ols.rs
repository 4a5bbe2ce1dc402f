//! Weighted polynomial least squares.
//!
//! Used to summarize a baryon-fraction relation locally: we fit
//!
//! ```text
//! minimize Σ w_i (y_i - Σ_j c_j x_i^j)^2
//! ```
//!
//! over a handful of samples. Rows are scaled by `sqrt(w_i)` and the resulting
//! ordinary least squares problem is solved with SVD, which stays well behaved
//! when the design matrix is tall and nearly collinear.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit polynomial coefficients `[c_0, ..., c_degree]` (lowest order first).
///
/// `weights` defaults to uniform when `None`. Returns `None` for mismatched
/// input lengths, too few samples, non-positive weights or a singular system.
pub fn fit_polynomial(x: &[f64], y: &[f64], weights: Option<&[f64]>, degree: usize) -> Option<Vec<f64>> {
    let n = x.len();
    let cols = degree + 1;
    if y.len() != n || n < cols {
        return None;
    }
    if let Some(w) = weights {
        if w.len() != n || w.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return None;
        }
    }

    let mut design = DMatrix::<f64>::zeros(n, cols);
    let mut rhs = DVector::<f64>::zeros(n);
    for i in 0..n {
        let sw = weights.map(|w| w[i].sqrt()).unwrap_or(1.0);
        let mut pow = 1.0;
        for j in 0..cols {
            design[(i, j)] = sw * pow;
            pow *= x[i];
        }
        rhs[i] = sw * y[i];
    }

    solve_least_squares(&design, &rhs).map(|beta| beta.iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn polynomial_fit_recovers_line() {
        let x = [-0.5, -0.25, 0.0, 0.25, 0.5];
        let y: Vec<f64> = x.iter().map(|v| -0.3 + 0.275 * v).collect();
        let c = fit_polynomial(&x, &y, None, 1).unwrap();
        assert!((c[0] + 0.3).abs() < 1e-12);
        assert!((c[1] - 0.275).abs() < 1e-12);
    }

    #[test]
    fn weights_pull_fit_toward_heavy_points() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 1.0, 0.0];
        let flat = fit_polynomial(&x, &y, None, 0).unwrap();
        let heavy = fit_polynomial(&x, &y, Some(&[1.0, 100.0, 1.0]), 0).unwrap();
        assert!((flat[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!(heavy[0] > 0.9);
    }

    #[test]
    fn rejects_underdetermined_input() {
        assert!(fit_polynomial(&[1.0], &[1.0], None, 1).is_none());
        assert!(fit_polynomial(&[1.0, 2.0], &[1.0], None, 1).is_none());
        assert!(fit_polynomial(&[1.0, 2.0], &[1.0, 2.0], Some(&[1.0, 0.0]), 1).is_none());
    }
}
