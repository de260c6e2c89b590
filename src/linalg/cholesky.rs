use faer::{
    Mat, Side,
    linalg::solvers::Solve,
    sparse::SparseColMat,
    sparse::linalg::solvers::{Llt, SymbolicLlt},
};
use std::ops::Mul;

use crate::linalg::{LinAlgError, LinAlgResult, SparseLinearSolver, all_finite};

/// Least squares through the normal equations: `(AᵀA) x = Aᵀb` factored as `LLᵀ`.
///
/// Squares the condition number of `A`, so prefer [`crate::linalg::SparseQRSolver`] on
/// badly scaled systems. A semi-definite `AᵀA` is reported as
/// [`LinAlgError::NotPositiveDefinite`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SparseCholeskySolver;

impl SparseCholeskySolver {
    pub fn new() -> Self {
        SparseCholeskySolver
    }
}

impl SparseLinearSolver for SparseCholeskySolver {
    fn solve_least_squares(
        &self,
        jacobian: &SparseColMat<usize, f64>,
        rhs: &Mat<f64>,
    ) -> LinAlgResult<Mat<f64>> {
        if rhs.nrows() != jacobian.nrows() {
            return Err(LinAlgError::DimensionMismatch(format!(
                "rhs has {} rows, matrix has {}",
                rhs.nrows(),
                jacobian.nrows()
            ))
            .log());
        }
        if jacobian.ncols() == 0 {
            return Ok(Mat::zeros(0, 1));
        }

        // H = A^T * A
        let jt = jacobian.as_ref().transpose();
        let hessian = jt
            .to_col_major()
            .map_err(|e| {
                LinAlgError::MatrixConversion(
                    "Failed to convert transposed Jacobian to column-major format".to_string(),
                )
                .log_with_source(e)
            })?
            .mul(jacobian.as_ref());

        // g = A^T * b
        let gradient = jacobian.as_ref().transpose().mul(rhs);

        let sym = SymbolicLlt::try_new(hessian.symbolic(), Side::Lower).map_err(|e| {
            LinAlgError::FactorizationFailed("Symbolic Cholesky decomposition failed".to_string())
                .log_with_source(e)
        })?;

        let cholesky = Llt::try_new_with_symbolic(sym, hessian.as_ref(), Side::Lower)
            .map_err(|e| LinAlgError::NotPositiveDefinite.log_with_source(e))?;

        let dx = cholesky.solve(gradient);
        if !all_finite(&dx) {
            return Err(LinAlgError::NotPositiveDefinite.log());
        }

        Ok(dx)
    }
}
