//! # Planar LSQ
//!
//! The mathematical core of a planar nonlinear least-squares engine, as used for
//! pose-graph SLAM and landmark-based localization.
//!
//! ## Features
//!
//! - **Planar Lie groups**: [`SO2`] rotations and [`SE2`] poses with composition,
//!   inversion, retraction (`expmap`/`logmap`), point transforms, bearing and range,
//!   each with exact analytic Jacobians
//! - **Gaussian factor graphs**: linearized measurements as [`JacobianFactor`]s with
//!   per-row noise, collected in a [`GaussianFactorGraph`]
//! - **Pluggable linear solvers**: sparse QR on the rectangular system or sparse
//!   Cholesky on the normal equations, selected through [`LinearSolverParams`]
//! - **Numerical differentiation**: central differences on manifolds for checking
//!   Jacobians ([`numerical`])
//!
//! ## One Gauss-Newton step
//!
//! The nonlinear loop is left to the caller. Each iteration linearizes the
//! measurements, solves the linear system, and retracts every pose:
//!
//! ```
//! use nalgebra::{DMatrix, DVector, Matrix3};
//! use planar_lsq::{
//!     GaussianFactorGraph, JacobianFactor, LieGroup, LinearSolverParams, NoiseModel, SE2,
//!     SE2Tangent, Tangent, linalg::solve,
//! };
//!
//! let estimate = SE2::from_xy_angle(0.1, -0.2, 0.05);
//! let measured = SE2::identity();
//!
//! // prior residual r(x) = x ⊖ measured, linearized as J δ ≈ -r
//! let mut jacobian = Matrix3::zeros();
//! let residual = estimate.right_minus(&measured, Some(&mut jacobian), None);
//!
//! let mut graph = GaussianFactorGraph::new();
//! graph.add(JacobianFactor::unary(
//!     0,
//!     DMatrix::from_column_slice(3, 3, jacobian.as_slice()),
//!     -residual.to_vector(),
//!     NoiseModel::unit(3),
//! )?);
//!
//! let delta = solve(&graph, &LinearSolverParams::default())?;
//! let step = SE2Tangent::from_vector(&delta.get(0).cloned().unwrap_or(DVector::zeros(3)))?;
//! let updated = estimate.expmap(&step);
//! assert!(updated.is_approx(&measured, 1e-9));
//! # Ok::<(), planar_lsq::PlanarLsqError>(())
//! ```
//!
//! ## Linear Algebra Backends
//!
//! - **Sparse Cholesky**: fastest on well-conditioned, positive definite systems
//! - **Sparse QR**: more robust for badly scaled systems; never forms `AᵀA`

pub mod error;
pub mod linalg;
#[cfg(feature = "logging")]
pub mod logger;
pub mod manifold;
pub mod numerical;

pub use error::{ErrorKind, PlanarLsqError, PlanarLsqResult};

pub use linalg::{
    GaussianFactorGraph, JacobianFactor, Key, LinAlgError, LinearSolverParams, LinearSolverType,
    NoiseModel, Ordering, OrderingType, SparseCholeskySolver, SparseLinearSolver, SparseQRSolver,
    VectorValues,
};
#[cfg(feature = "logging")]
pub use logger::{init_logger, init_logger_with_level, try_init_logger_with_level};
pub use manifold::{
    LieGroup, ManifoldError, Tangent,
    se2::{SE2, SE2Tangent},
    so2::{SO2, SO2Tangent},
};
