//! Error types for the planar-lsq library
//!
//! # Error Hierarchy
//!
//! - **`PlanarLsqError`** is the top-level error for callers that mix geometry and
//!   linear solves behind one `?`
//! - **Module errors** (`ManifoldError`, `LinAlgError`) are wrapped inside it
//!   transparently, so the original message is preserved
//! - **`ErrorKind`** classifies any of them as a bad input, a bad configuration or a
//!   numerical failure
//!
//! Example:
//! ```
//! use planar_lsq::error::{ErrorKind, PlanarLsqError};
//! use planar_lsq::linalg::LinearSolverType;
//!
//! let err: PlanarLsqError = "svd".parse::<LinearSolverType>().unwrap_err().into();
//! assert_eq!(err.kind(), ErrorKind::Configuration);
//! assert!(err.chain_compact().contains("svd"));
//! ```

use crate::{linalg::LinAlgError, manifold::ManifoldError};
use std::error::Error as StdError;
use thiserror::Error;

/// Main result type used throughout the planar-lsq library
pub type PlanarLsqResult<T> = Result<T, PlanarLsqError>;

/// Broad class of a failure, independent of the module that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller passed inconsistent data (dimensions, keys, orderings, noise)
    Precondition,
    /// An option or strategy name could not be resolved
    Configuration,
    /// The math could not be carried out on otherwise valid data
    Numerical,
}

/// Main error type for the planar-lsq library
#[derive(Debug, Error)]
pub enum PlanarLsqError {
    /// Linear algebra errors
    #[error(transparent)]
    LinearAlgebra(#[from] LinAlgError),

    /// Manifold operation errors
    #[error(transparent)]
    Manifold(#[from] ManifoldError),
}

impl PlanarLsqError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlanarLsqError::LinearAlgebra(e) => e.kind(),
            PlanarLsqError::Manifold(e) => e.kind(),
        }
    }

    /// Get the full error chain as a string for logging and debugging.
    ///
    /// ```rust,ignore
    /// if let Err(e) = solve(&graph, &params).map_err(PlanarLsqError::from) {
    ///     warn!("Error chain: {}", e.chain());
    /// }
    /// ```
    pub fn chain(&self) -> String {
        let mut chain = vec![self.to_string()];
        let mut source = self.source();

        while let Some(err) = source {
            chain.push(format!("  → {}", err));
            source = err.source();
        }

        chain.join("\n")
    }

    /// Get a compact single-line error chain for logging
    pub fn chain_compact(&self) -> String {
        let mut chain = vec![self.to_string()];
        let mut source = self.source();

        while let Some(err) = source {
            chain.push(err.to_string());
            source = err.source();
        }

        chain.join(" → ")
    }
}
