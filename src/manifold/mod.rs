//! Planar Lie groups for optimization on non-Euclidean spaces.
//!
//! This module provides the two groups needed for planar state estimation:
//! - **SO(2)**: rotations in 2D ([`so2::SO2`])
//! - **SE(2)**: rigid transformations in 2D ([`se2::SE2`])
//!
//! Lie group M,° | size   | dim | X ∈ M             | Constraint | T_X M         | Exp(T)             | Comp. | Action
//! ------------- | ------ | --- | ----------------- | ---------- | ------------- | ------------------ | ----- | ------
//! Rotation      | SO(2),.| 1   | R                 | RᵀR = I    | [θ] ∈ R       | R = exp([θ]x)      | R₁R₂  | Rx
//! Rigid motion  | SE(2),.| 3   | M = [R t; 0 1]    | RᵀR = I    | [x y θ] ∈ R³  | (exp(θ), [x y])    | M₁M₂  | Rx+t
//!
//! The API mirrors the [manif](https://github.com/artivis/manif) C++ library:
//! every operation takes optional Jacobian out-parameters, and derivatives are
//! taken with respect to right perturbations on the local tangent space.
//!
//! # Retraction convention
//!
//! SE(2) uses the decoupled chart `exp([x y θ]) = (R(θ), [x y])`. It agrees with
//! the group exponential to first order, so every adjoint-based Jacobian holds,
//! and its logarithm is an exact inverse for any rotation angle. Right
//! perturbations therefore update a pose as `(θ + δθ, t + R·δt)`.

use nalgebra::DVector;
use std::ops::{Mul, Neg};
use std::{
    error, fmt,
    fmt::{Display, Formatter},
};
use tracing::error;

use crate::error::ErrorKind;

pub mod se2;
pub mod so2;

/// Errors that can occur during manifold operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifoldError {
    /// Invalid tangent vector dimension
    InvalidTangentDimension { expected: usize, actual: usize },
    /// Input at a configuration where the requested quantity is undefined
    DegenerateGeometry(String),
    /// NaN or Inf detected in manifold element
    InvalidNumber,
}

impl Display for ManifoldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ManifoldError::InvalidTangentDimension { expected, actual } => {
                write!(
                    f,
                    "Invalid tangent dimension: expected {expected}, got {actual}"
                )
            }
            ManifoldError::DegenerateGeometry(msg) => {
                write!(f, "Degenerate geometry: {msg}")
            }
            ManifoldError::InvalidNumber => {
                write!(f, "Invalid number: NaN or Inf detected")
            }
        }
    }
}

impl error::Error for ManifoldError {}

impl ManifoldError {
    /// Log the error with tracing::error and return self for chaining
    #[must_use]
    pub fn log(self) -> Self {
        error!("{}", self);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ManifoldError::InvalidTangentDimension { .. }
            | ManifoldError::DegenerateGeometry(_)
            | ManifoldError::InvalidNumber => ErrorKind::Precondition,
        }
    }
}

/// Result type for manifold operations.
pub type ManifoldResult<T> = Result<T, ManifoldError>;

/// Core trait for Lie group operations.
///
/// Provides group composition and inversion, the exponential and logarithmic
/// maps, and the plus/minus operators with their Jacobians. All Jacobians are
/// expressed with respect to right perturbations `g ∘ exp(δ)`.
///
/// # Type Parameters
///
/// - `TangentVector`: the tangent space vector type (e.g. [`se2::SE2Tangent`])
/// - `JacobianMatrix`: the square Jacobian type, `DOF × DOF`
pub trait LieGroup: Clone + PartialEq {
    /// The tangent space vector type
    type TangentVector: Tangent<Self>;

    /// The Jacobian matrix type
    type JacobianMatrix: Clone
        + PartialEq
        + Neg<Output = Self::JacobianMatrix>
        + Mul<Output = Self::JacobianMatrix>
        + std::ops::Index<(usize, usize), Output = f64>;

    /// Compute the inverse of this manifold element.
    ///
    /// For a group element g, returns g⁻¹ such that g ∘ g⁻¹ = e.
    ///
    /// # Arguments
    /// * `jacobian` - Optional mutable reference to store the Jacobian ∂(g⁻¹)/∂g
    fn inverse(&self, jacobian: Option<&mut Self::JacobianMatrix>) -> Self;

    /// Compose this element with another (group multiplication).
    ///
    /// Computes g₁ ∘ g₂ where ∘ is the group operation.
    ///
    /// # Arguments
    /// * `other` - The right operand for composition
    /// * `jacobian_self` - Optional Jacobian ∂(g₁ ∘ g₂)/∂g₁
    /// * `jacobian_other` - Optional Jacobian ∂(g₁ ∘ g₂)/∂g₂
    fn compose(
        &self,
        other: &Self,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_other: Option<&mut Self::JacobianMatrix>,
    ) -> Self;

    /// Logarithmic map from manifold to tangent space.
    ///
    /// # Arguments
    /// * `jacobian` - Optional Jacobian ∂log(g)/∂g
    fn log(&self, jacobian: Option<&mut Self::JacobianMatrix>) -> Self::TangentVector;

    /// Adjoint matrix Ad(g), satisfying g ∘ exp(φ) = exp(Ad(g) φ) ∘ g to first order.
    fn adjoint(&self) -> Self::JacobianMatrix;

    /// Generate a random element (useful for testing and initialization).
    fn random() -> Self;

    /// Identity matrix in the Jacobian dimension.
    fn jacobian_identity() -> Self::JacobianMatrix;

    /// Check if the element is approximately equal to another element.
    fn is_approx(&self, other: &Self, tolerance: f64) -> bool;

    /// Right plus operation: g ⊞ φ = g ∘ exp(φ).
    ///
    /// # Arguments
    /// * `tangent` - Tangent vector perturbation
    /// * `jacobian_self` - Optional Jacobian ∂(g ⊞ φ)/∂g
    /// * `jacobian_tangent` - Optional Jacobian ∂(g ⊞ φ)/∂φ
    ///
    /// # Notes
    /// J_R⊕θ_R = Ad(exp(θ))⁻¹
    /// J_R⊕θ_θ = J_r(θ)
    fn right_plus(
        &self,
        tangent: &Self::TangentVector,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_tangent: Option<&mut Self::JacobianMatrix>,
    ) -> Self {
        let exp_tangent = tangent.exp(None);

        if let Some(jac_tangent) = jacobian_tangent {
            *jac_tangent = tangent.right_jacobian();
        }

        self.compose(&exp_tangent, jacobian_self, None)
    }

    /// Right minus operation: g₁ ⊟ g₂ = log(g₂⁻¹ ∘ g₁).
    ///
    /// # Notes
    /// J_Q⊖R_Q = J_r⁻¹(θ)
    /// J_Q⊖R_R = -J_l⁻¹(θ)
    fn right_minus(
        &self,
        other: &Self,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_other: Option<&mut Self::JacobianMatrix>,
    ) -> Self::TangentVector {
        let result = other.inverse(None).compose(self, None, None).log(None);

        if let Some(jac_self) = jacobian_self {
            *jac_self = result.right_jacobian_inv();
        }

        if let Some(jac_other) = jacobian_other {
            *jac_other = -result.left_jacobian_inv();
        }

        result
    }

    /// Left plus operation: φ ⊞ g = exp(φ) ∘ g.
    ///
    /// # Arguments
    /// * `tangent` - Tangent vector perturbation
    /// * `jacobian_tangent` - Optional Jacobian ∂(φ ⊞ g)/∂φ
    /// * `jacobian_self` - Optional Jacobian ∂(φ ⊞ g)/∂g
    fn left_plus(
        &self,
        tangent: &Self::TangentVector,
        jacobian_tangent: Option<&mut Self::JacobianMatrix>,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
    ) -> Self {
        let result = tangent.exp(None).compose(self, None, None);

        if let Some(jac_self) = jacobian_self {
            *jac_self = Self::jacobian_identity();
        }

        if let Some(jac_tangent) = jacobian_tangent {
            *jac_tangent = self.inverse(None).adjoint() * tangent.right_jacobian();
        }

        result
    }

    /// Left minus operation: g₁ ⊟ g₂ = log(g₁ ∘ g₂⁻¹).
    fn left_minus(
        &self,
        other: &Self,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_other: Option<&mut Self::JacobianMatrix>,
    ) -> Self::TangentVector {
        let result = self.compose(&other.inverse(None), None, None).log(None);

        if let Some(jac_self) = jacobian_self {
            *jac_self = result.right_jacobian_inv() * other.adjoint();
        }

        if let Some(jac_other) = jacobian_other {
            *jac_other = -(result.right_jacobian_inv() * other.adjoint());
        }

        result
    }

    /// Convenience method for right_plus. Equivalent to g ⊞ φ.
    fn plus(
        &self,
        tangent: &Self::TangentVector,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_tangent: Option<&mut Self::JacobianMatrix>,
    ) -> Self {
        self.right_plus(tangent, jacobian_self, jacobian_tangent)
    }

    /// Convenience method for right_minus. Equivalent to g₁ ⊟ g₂.
    fn minus(
        &self,
        other: &Self,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_other: Option<&mut Self::JacobianMatrix>,
    ) -> Self::TangentVector {
        self.right_minus(other, jacobian_self, jacobian_other)
    }

    /// Compute g₁⁻¹ ∘ g₂ (relative transformation).
    ///
    /// # Arguments
    /// * `other` - The target element g₂
    /// * `jacobian_self` - Optional Jacobian with respect to g₁
    /// * `jacobian_other` - Optional Jacobian with respect to g₂
    ///
    /// # Notes
    /// J_a = -Ad(a⁻¹ ∘ b)⁻¹
    /// J_b = I
    fn between(
        &self,
        other: &Self,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_other: Option<&mut Self::JacobianMatrix>,
    ) -> Self {
        let result = self.inverse(None).compose(other, None, None);

        if let Some(jac_self) = jacobian_self {
            *jac_self = -result.inverse(None).adjoint();
        }

        if let Some(jac_other) = jacobian_other {
            *jac_other = Self::jacobian_identity();
        }

        result
    }

    /// Dimension of the tangent space for this manifold element.
    fn tangent_dim(&self) -> usize {
        Self::TangentVector::DIM
    }
}

/// Trait for tangent-space (Lie algebra) vectors of a [`LieGroup`].
pub trait Tangent<Group: LieGroup>: Clone + PartialEq {
    /// Dimension of the tangent space
    const DIM: usize;

    /// Exponential map to the group.
    ///
    /// # Arguments
    /// * `jacobian` - Optional Jacobian ∂exp(φ)/∂φ
    fn exp(&self, jacobian: Option<&mut Group::JacobianMatrix>) -> Group;

    /// Right Jacobian Jr: exp(φ + δφ) ≈ exp(φ) ∘ exp(Jr δφ).
    fn right_jacobian(&self) -> Group::JacobianMatrix;

    /// Left Jacobian Jl: exp(φ + δφ) ≈ exp(Jl δφ) ∘ exp(φ).
    fn left_jacobian(&self) -> Group::JacobianMatrix;

    /// Inverse of right Jacobian Jr⁻¹.
    fn right_jacobian_inv(&self) -> Group::JacobianMatrix;

    /// Inverse of left Jacobian Jl⁻¹.
    fn left_jacobian_inv(&self) -> Group::JacobianMatrix;

    /// Components as a dynamic vector, in storage order.
    fn to_vector(&self) -> DVector<f64>;

    /// Build a tangent vector from components in storage order.
    ///
    /// # Errors
    /// Returns [`ManifoldError::InvalidTangentDimension`] when the length differs from `DIM`.
    fn from_vector(data: &DVector<f64>) -> ManifoldResult<Group::TangentVector>;

    /// Check if the tangent vector is approximately equal to another tangent vector.
    fn is_approx(&self, other: &Self, tolerance: f64) -> bool;

    /// Zero tangent vector.
    fn zero() -> Group::TangentVector;

    /// Random tangent vector (useful for testing).
    fn random() -> Group::TangentVector;

    /// Check if the tangent vector is approximately zero.
    fn is_zero(&self, tolerance: f64) -> bool;
}

/// Wrap an angle to the canonical range (−π, π].
pub fn wrap_angle(angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};

    let wrapped = angle.sin().atan2(angle.cos());
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}
