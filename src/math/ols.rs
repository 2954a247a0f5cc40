//! Least squares solver.
//!
//! Every candidate breakpoint turns the change-point model into an ordinary
//! linear regression:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! with 1–3 columns (baseload plus hinge terms), so we solve β many times during
//! the breakpoint scan.
//!
//! Implementation choices:
//! - SVD handles the tall design matrix directly.
//! - A hinge column that is all zeros (no observations past the knot) makes the
//!   system rank deficient; that is reported, never papered over with a
//!   minimum-norm solution.

use nalgebra::{DMatrix, DVector};

use crate::error::DegenerateKind;

/// Singular values below `max_sv * RELATIVE_RANK_TOL` count as zero.
const RELATIVE_RANK_TOL: f64 = 1e-10;

/// Solve a least squares problem using SVD.
///
/// Fails with `RankDeficient` when the design does not have full column rank and
/// with `NonFinite` when the solution contains NaN or infinity.
pub fn solve_least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
) -> Result<DVector<f64>, DegenerateKind> {
    let ncols = x.ncols();
    if x.nrows() < ncols || ncols == 0 {
        return Err(DegenerateKind::RankDeficient);
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(DegenerateKind::NonFinite);
    }

    let svd = x.clone().svd(true, true);
    let max_sv = svd.singular_values.max();
    if !(max_sv > 0.0) {
        return Err(DegenerateKind::RankDeficient);
    }

    let tol = max_sv * RELATIVE_RANK_TOL;
    if svd.rank(tol) < ncols {
        return Err(DegenerateKind::RankDeficient);
    }

    let beta = svd
        .solve(y, tol)
        .map_err(|_| DegenerateKind::RankDeficient)?;
    if beta.iter().all(|v| v.is_finite()) {
        Ok(beta)
    } else {
        Err(DegenerateKind::NonFinite)
    }
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
    fn zero_hinge_column_is_rank_deficient() {
        // Cooling hinge with no observation above the knot.
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(
            solve_least_squares(&x, &y),
            Err(DegenerateKind::RankDeficient)
        );
    }

    #[test]
    fn underdetermined_system_is_rejected() {
        let x = DMatrix::from_row_slice(1, 2, &[1.0, -3.0]);
        let y = DVector::from_row_slice(&[4.0]);
        assert!(solve_least_squares(&x, &y).is_err());
    }
}
