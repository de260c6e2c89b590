//! Sparse linear least squares over a Gaussian factor graph.
//!
//! One call to [`solve`] takes a [`GaussianFactorGraph`] and returns the per-key
//! minimizer of `Σ_f ‖Σ_f^{-1/2}(A_f x − b_f)‖²` as [`VectorValues`]:
//!
//! 1. pick an elimination [`Ordering`] (supplied, or computed per [`OrderingType`]);
//! 2. stack the whitened factors into a sparse matrix with columns in that order;
//! 3. factor it with the strategy named by [`LinearSolverType`];
//! 4. scatter the stacked solution back to keys.
//!
//! The dispatcher keeps no state between calls and never switches strategy on failure.
//!
//! ```
//! use nalgebra::{DMatrix, DVector};
//! use planar_lsq::linalg::{
//!     GaussianFactorGraph, JacobianFactor, LinearSolverParams, LinearSolverType, NoiseModel,
//!     solve,
//! };
//!
//! let mut graph = GaussianFactorGraph::new();
//! graph.add(JacobianFactor::unary(
//!     0,
//!     DMatrix::identity(2, 2) * 2.0,
//!     DVector::from_vec(vec![1.0, -1.0]),
//!     NoiseModel::unit(2),
//! )?);
//!
//! let params = LinearSolverParams::new().with_linear_solver_type(LinearSolverType::SparseQR);
//! let solution = solve(&graph, &params)?;
//! assert!((solution.get(0).map_or(0.0, |v| v[0]) - 0.5).abs() < 1e-12);
//! # Ok::<(), planar_lsq::linalg::LinAlgError>(())
//! ```

pub mod cholesky;
pub mod factor_graph;
pub mod ordering;
pub mod qr;
pub mod values;

use faer::{Mat, sparse::SparseColMat};
use std::{
    fmt,
    fmt::{Display, Formatter},
    str::FromStr,
};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::error::ErrorKind;

pub use cholesky::SparseCholeskySolver;
pub use factor_graph::{GaussianFactorGraph, JacobianFactor, NoiseModel, SparseSystem};
pub use ordering::{Ordering, OrderingType};
pub use qr::SparseQRSolver;
pub use values::VectorValues;

/// Identifier of an unknown in a linear system.
pub type Key = u64;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LinearSolverType {
    #[default]
    SparseCholesky,
    SparseQR,
}

impl Display for LinearSolverType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LinearSolverType::SparseCholesky => write!(f, "Sparse Cholesky"),
            LinearSolverType::SparseQR => write!(f, "Sparse QR"),
        }
    }
}

impl FromStr for LinearSolverType {
    type Err = LinAlgError;

    /// Accepts the strategy names used in configuration, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match name.as_str() {
            "cholesky" | "sparse_cholesky" | "eigen_cholesky" => {
                Ok(LinearSolverType::SparseCholesky)
            }
            "qr" | "sparse_qr" | "eigen_qr" => Ok(LinearSolverType::SparseQR),
            _ => Err(LinAlgError::UnknownSolverType(s.to_string()).log()),
        }
    }
}

/// Linear algebra specific error types for planar-lsq
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinAlgError {
    /// Blocks, right-hand sides or values disagree on a dimension
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A noise model with a non-positive or non-finite sigma
    #[error("Invalid noise model: {0}")]
    InvalidNoiseModel(String),

    /// A supplied ordering that is not a permutation of the graph's keys
    #[error("Invalid ordering: {0}")]
    InvalidOrdering(String),

    /// Strategy name that does not map to any [`LinearSolverType`]
    #[error("Unknown linear solver type '{0}'")]
    UnknownSolverType(String),

    /// `AᵀA` could not be factored as `LLᵀ`
    #[error("Normal equations are not positive definite")]
    NotPositiveDefinite,

    /// The system does not determine every unknown
    #[error("System is rank deficient: {0}")]
    RankDeficient(String),

    /// Matrix factorization failed (Cholesky, QR, etc.)
    #[error("Matrix factorization failed: {0}")]
    FactorizationFailed(String),

    /// Failed to create sparse matrix from triplets
    #[error("Failed to create sparse matrix: {0}")]
    SparseMatrixCreation(String),

    /// Matrix format conversion failed
    #[error("Matrix conversion failed: {0}")]
    MatrixConversion(String),
}

impl LinAlgError {
    /// Log the error with tracing::error and return self for chaining
    ///
    /// # Example
    /// ```ignore
    /// operation()
    ///     .map_err(|e| LinAlgError::from(e).log())?;
    /// ```
    #[must_use]
    pub fn log(self) -> Self {
        error!("{}", self);
        self
    }

    /// Log the error together with the underlying error from a third-party library
    /// (e.g. faer's `FaerError`, `LltError`, `CreationError`).
    ///
    /// # Example
    /// ```ignore
    /// SymbolicLlt::try_new(matrix.symbolic(), Side::Lower)
    ///     .map_err(|e| {
    ///         LinAlgError::FactorizationFailed(
    ///             "Symbolic Cholesky decomposition failed".to_string()
    ///         )
    ///         .log_with_source(e)
    ///     })?;
    /// ```
    #[must_use]
    pub fn log_with_source<E: std::fmt::Debug>(self, source_error: E) -> Self {
        error!("{} | Source: {:?}", self, source_error);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LinAlgError::DimensionMismatch(_)
            | LinAlgError::InvalidNoiseModel(_)
            | LinAlgError::InvalidOrdering(_) => ErrorKind::Precondition,
            LinAlgError::UnknownSolverType(_) => ErrorKind::Configuration,
            LinAlgError::NotPositiveDefinite
            | LinAlgError::RankDeficient(_)
            | LinAlgError::FactorizationFailed(_)
            | LinAlgError::SparseMatrixCreation(_)
            | LinAlgError::MatrixConversion(_) => ErrorKind::Numerical,
        }
    }
}

/// Result type for linear algebra operations
pub type LinAlgResult<T> = Result<T, LinAlgError>;

/// A strategy for the sparse least-squares problem `min ‖A x − b‖²`
pub trait SparseLinearSolver {
    /// Solve for `x` given the (already whitened) `A` and `b`.
    ///
    /// # Errors
    /// Returns `LinAlgError` if:
    /// - `b` does not have as many rows as `A`
    /// - the factorization fails
    /// - the system does not determine every unknown
    fn solve_least_squares(
        &self,
        jacobian: &SparseColMat<usize, f64>,
        rhs: &Mat<f64>,
    ) -> LinAlgResult<Mat<f64>>;
}

/// Map a strategy to its solver.
pub fn create_linear_solver(linear_solver_type: LinearSolverType) -> Box<dyn SparseLinearSolver> {
    match linear_solver_type {
        LinearSolverType::SparseCholesky => Box::new(SparseCholeskySolver::new()),
        LinearSolverType::SparseQR => Box::new(SparseQRSolver::new()),
    }
}

/// Configuration for [`solve`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearSolverParams {
    /// Factorization strategy
    pub linear_solver_type: LinearSolverType,
    /// Heuristic used when no explicit ordering is given
    pub ordering_type: OrderingType,
    /// Explicit elimination ordering; must be a permutation of the graph's keys
    pub ordering: Option<Ordering>,
}

impl LinearSolverParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the linear solver type
    pub fn with_linear_solver_type(mut self, linear_solver_type: LinearSolverType) -> Self {
        self.linear_solver_type = linear_solver_type;
        self
    }

    /// Use this ordering instead of computing one
    pub fn with_ordering(mut self, ordering: Ordering) -> Self {
        self.ordering = Some(ordering);
        self
    }

    /// Set the heuristic for computed orderings
    pub fn with_ordering_type(mut self, ordering_type: OrderingType) -> Self {
        self.ordering_type = ordering_type;
        self
    }
}

/// Solve the least-squares problem described by `graph`.
///
/// # Errors
/// - [`LinAlgError::DimensionMismatch`] when factors disagree on a key's dimension
/// - [`LinAlgError::InvalidOrdering`] when the supplied ordering is not a permutation
///   of the graph's keys
/// - [`LinAlgError::NotPositiveDefinite`] / [`LinAlgError::RankDeficient`] when the
///   selected strategy cannot determine every unknown
pub fn solve(
    graph: &GaussianFactorGraph,
    params: &LinearSolverParams,
) -> LinAlgResult<VectorValues> {
    graph.key_dimensions().map_err(LinAlgError::log)?;

    if graph.is_empty() {
        debug!("Empty factor graph, returning empty solution");
        return Ok(VectorValues::new());
    }

    let computed;
    let ordering = match &params.ordering {
        Some(ordering) => {
            if let Err(e) = ordering.validate(&graph.keys()) {
                warn!("Rejecting supplied ordering: {}", e);
                return Err(e);
            }
            ordering
        }
        None => {
            computed = Ordering::compute(graph, params.ordering_type);
            &computed
        }
    };

    let system = graph.sparse_system(ordering)?;
    debug!(
        "Solving {}x{} system ({} factors, {} keys) with {}",
        system.jacobian.nrows(),
        system.jacobian.ncols(),
        graph.len(),
        ordering.len(),
        params.linear_solver_type
    );

    let solver = create_linear_solver(params.linear_solver_type);
    let solution = solver.solve_least_squares(&system.jacobian, &system.rhs)?;

    Ok(system.scatter(&solution))
}

pub(crate) fn all_finite(m: &Mat<f64>) -> bool {
    (0..m.ncols()).all(|j| (0..m.nrows()).all(|i| m[(i, j)].is_finite()))
}
