use faer::{
    Conj, Mat,
    linalg::solvers::SolveLstsqCore,
    sparse::SparseColMat,
    sparse::linalg::solvers::{Qr, SymbolicQr},
};

use std::ops::Mul;

use crate::linalg::{LinAlgError, LinAlgResult, SparseLinearSolver, all_finite};

/// Largest relative error allowed when the factorization reproduces a known solution.
const RANK_TOLERANCE: f64 = 1e-6;

/// Least squares through an orthogonal factorization of the rectangular system,
/// `A = QR`, followed by back-substitution on `R x = Qᵀb`.
///
/// Works on `A` directly and never forms `AᵀA`, so it is the numerically safer choice.
/// Requires at least as many rows as columns.
///
/// Rank is checked a posteriori: the same factorization also solves `A x = A z` for a
/// fixed reference `z`. A zero or roundoff-sized pivot in `R` either breaks the solve
/// or lets `x` drift along the null space away from `z`, and both are reported as
/// [`LinAlgError::RankDeficient`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SparseQRSolver;

impl SparseQRSolver {
    pub fn new() -> Self {
        SparseQRSolver
    }
}

/// Reference solution with distinct entries in [1, 2).
fn reference_solution(n: usize) -> Mat<f64> {
    const GOLDEN: f64 = 0.618_033_988_749_894_9;
    Mat::from_fn(n, 1, |i, _| 1.0 + ((i + 1) as f64 * GOLDEN).fract())
}

impl SparseLinearSolver for SparseQRSolver {
    fn solve_least_squares(
        &self,
        jacobian: &SparseColMat<usize, f64>,
        rhs: &Mat<f64>,
    ) -> LinAlgResult<Mat<f64>> {
        let (m, n) = (jacobian.nrows(), jacobian.ncols());
        if rhs.nrows() != m {
            return Err(LinAlgError::DimensionMismatch(format!(
                "rhs has {} rows, matrix has {m}",
                rhs.nrows()
            ))
            .log());
        }
        if n == 0 {
            return Ok(Mat::zeros(0, 1));
        }
        if m < n {
            return Err(LinAlgError::RankDeficient(format!(
                "system has {m} rows for {n} unknowns"
            ))
            .log());
        }

        let sym = SymbolicQr::try_new(jacobian.symbolic()).map_err(|e| {
            LinAlgError::FactorizationFailed("Symbolic QR decomposition failed".to_string())
                .log_with_source(e)
        })?;

        let qr = Qr::try_new_with_symbolic(sym, jacobian.as_ref()).map_err(|e| {
            LinAlgError::FactorizationFailed("Numeric QR decomposition failed".to_string())
                .log_with_source(e)
        })?;

        // Caller columns first, then the reference column.
        let k = rhs.ncols();
        let reference = reference_solution(n);
        let reference_rhs = jacobian.as_ref().mul(&reference);
        let mut solution = Mat::from_fn(m, k + 1, |i, j| {
            if j < k {
                rhs[(i, j)]
            } else {
                reference_rhs[(i, 0)]
            }
        });

        // The solution lands in the top n rows.
        qr.solve_lstsq_in_place_with_conj(Conj::No, solution.as_mut());
        let top = solution.as_ref().submatrix(0, 0, n, k + 1).to_owned();

        if !all_finite(&top) {
            return Err(LinAlgError::RankDeficient(
                "zero pivot in triangular factor".to_string(),
            )
            .log());
        }

        let deviation = (0..n)
            .map(|i| (top[(i, k)] - reference[(i, 0)]).abs())
            .fold(0.0, f64::max);
        if deviation > RANK_TOLERANCE {
            return Err(LinAlgError::RankDeficient(format!(
                "reference solution recovered with error {deviation:.3e}"
            ))
            .log());
        }

        Ok(top.as_ref().submatrix(0, 0, n, k).to_owned())
    }
}
