//! SE(2) - Special Euclidean Group in 2D
//!
//! This module implements the Special Euclidean group SE(2), which represents
//! rigid body transformations in 2D space (rotation + translation), i.e. a
//! planar robot pose.
//!
//! SE(2) elements are represented as an [`SO2`] rotation and a Vector2 translation.
//! SE(2) tangent elements are represented as [x, y, theta] = 3 components,
//! where x,y is the translational component and theta is the rotational component.
//!
//! # Retractions
//!
//! The tangent chart is decoupled: `exp([x y θ]) = (R(θ), [x y])`. Two named
//! entry points apply a tangent update to a pose:
//!
//! - [`SE2::expmap`] perturbs the pose in its local frame: `base ∘ exp(ξ)`,
//!   which is `(θ + δθ, t + R·δt)`.
//! - [`SE2::delta`] builds the update as a pose of its own, and
//!   [`SE2::applied_to`] composes it onto a base in pose-product order. The
//!   result is identical to [`SE2::expmap`]:
//!   `SE2::delta(&ξ).applied_to(&base) == base.expmap(&ξ)`.
//!
//! [`SE2::logmap`] inverts [`SE2::expmap`] exactly for every rotation angle:
//! the angle is the wrapped rotation difference and the translation is that of
//! [`LieGroup::between`].

use crate::manifold::{
    LieGroup, ManifoldError, ManifoldResult, Tangent,
    so2::{SO2, SO2Tangent},
};
use nalgebra::{
    DVector, Matrix1x2, Matrix1x3, Matrix2, Matrix2x3, Matrix3, Point2, Vector2, Vector3,
};
use rand::Rng;
use std::{
    f64::consts::PI,
    fmt,
    fmt::{Display, Formatter},
};

/// SE(2) group element representing a rigid body transformation in 2D.
///
/// Values are immutable: every operation returns a new pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SE2 {
    translation: Vector2<f64>,
    rotation: SO2,
}

impl Display for SE2 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SE2(translation: [{:.4}, {:.4}], rotation: {:.4})",
            self.x(),
            self.y(),
            self.angle()
        )
    }
}

impl Default for SE2 {
    fn default() -> Self {
        SE2::identity()
    }
}

impl SE2 {
    /// Degrees of freedom - dimension of the tangent space
    pub const DOF: usize = 3;

    /// Get the identity element of the group.
    pub fn identity() -> Self {
        SE2 {
            translation: Vector2::zeros(),
            rotation: SO2::identity(),
        }
    }

    /// Create a new SE2 element from translation and rotation.
    pub fn new(translation: Vector2<f64>, rotation: SO2) -> Self {
        SE2 {
            translation,
            rotation,
        }
    }

    /// Create SE2 from x, y and heading angle (radians).
    pub fn from_xy_angle(x: f64, y: f64, theta: f64) -> Self {
        SE2::new(Vector2::new(x, y), SO2::from_angle(theta))
    }

    /// Create SE2 from a heading angle and a position.
    pub fn from_angle_point(theta: f64, position: Point2<f64>) -> Self {
        SE2::new(position.coords, SO2::from_angle(theta))
    }

    pub fn translation(&self) -> Vector2<f64> {
        self.translation
    }

    pub fn rotation(&self) -> SO2 {
        self.rotation
    }

    pub fn rotation_matrix(&self) -> Matrix2<f64> {
        self.rotation.rotation_matrix()
    }

    /// Homogeneous 3x3 transformation matrix [R t; 0 1].
    pub fn matrix(&self) -> Matrix3<f64> {
        let mut m = Matrix3::identity();
        m.fixed_view_mut::<2, 2>(0, 0)
            .copy_from(&self.rotation_matrix());
        m.fixed_view_mut::<2, 1>(0, 2).copy_from(&self.translation);
        m
    }

    pub fn x(&self) -> f64 {
        self.translation.x
    }

    pub fn y(&self) -> f64 {
        self.translation.y
    }

    /// Heading angle in (−π, π].
    pub fn angle(&self) -> f64 {
        self.rotation.angle()
    }

    /// Local retraction: `self ∘ exp(ξ)`, i.e. `(θ + δθ, t + R·δt)`.
    pub fn expmap(&self, tangent: &SE2Tangent) -> SE2 {
        self.right_plus(tangent, None, None)
    }

    /// Local coordinates of `other` around `self`, the exact inverse of [`SE2::expmap`].
    ///
    /// The angle is `log(self.R⁻¹ ∘ other.R)` and the translation is
    /// `between(self, other).t`.
    pub fn logmap(&self, other: &SE2) -> SE2Tangent {
        other.right_minus(self, None, None)
    }

    /// Build the pose a tangent update represents on its own, taken from the origin.
    pub fn delta(tangent: &SE2Tangent) -> SE2 {
        tangent.exp(None)
    }

    /// Apply this pose as a delta onto `base` in pose-product order: `base ∘ self`.
    ///
    /// With `self = SE2::delta(&ξ)` the result equals `base.expmap(&ξ)`.
    pub fn applied_to(&self, base: &SE2) -> SE2 {
        base.compose(self, None, None)
    }

    /// Express a world point in this pose's local frame: `Rᵀ·(p − t)`.
    ///
    /// # Arguments
    /// * `point` - Point in the world frame
    /// * `jacobian_self` - Optional Jacobian (2×3) with respect to the pose
    /// * `jacobian_point` - Optional Jacobian (2×2) with respect to the point
    pub fn transform_to(
        &self,
        point: &Point2<f64>,
        jacobian_self: Option<&mut Matrix2x3<f64>>,
        jacobian_point: Option<&mut Matrix2<f64>>,
    ) -> Point2<f64> {
        let local = self
            .rotation
            .unrotate(&(point.coords - self.translation), None, jacobian_point);

        if let Some(jac) = jacobian_self {
            *jac = Matrix2x3::new(-1.0, 0.0, local.y, 0.0, -1.0, -local.x);
        }

        Point2::from(local)
    }

    /// Map a point from this pose's local frame to the world frame: `R·p + t`.
    ///
    /// # Arguments
    /// * `point` - Point in the local frame
    /// * `jacobian_self` - Optional Jacobian (2×3) with respect to the pose
    /// * `jacobian_point` - Optional Jacobian (2×2) with respect to the point
    pub fn transform_from(
        &self,
        point: &Point2<f64>,
        jacobian_self: Option<&mut Matrix2x3<f64>>,
        jacobian_point: Option<&mut Matrix2<f64>>,
    ) -> Point2<f64> {
        let mut jac_rotation = Vector2::zeros();
        let rotated = self
            .rotation
            .rotate(&point.coords, Some(&mut jac_rotation), jacobian_point);

        if let Some(jac) = jacobian_self {
            jac.fixed_view_mut::<2, 2>(0, 0)
                .copy_from(&self.rotation_matrix());
            jac.fixed_view_mut::<2, 1>(0, 2).copy_from(&jac_rotation);
        }

        Point2::from(rotated + self.translation)
    }

    /// Rotation the pose must turn by to face `point`.
    ///
    /// # Arguments
    /// * `point` - Landmark in the world frame
    /// * `jacobian_self` - Optional Jacobian (1×3) with respect to the pose
    /// * `jacobian_point` - Optional Jacobian (1×2) with respect to the point
    ///
    /// # Errors
    /// Returns [`ManifoldError::DegenerateGeometry`] when `point` coincides with
    /// the pose translation. Callers must keep the landmark separated from the pose.
    pub fn bearing(
        &self,
        point: &Point2<f64>,
        jacobian_self: Option<&mut Matrix1x3<f64>>,
        jacobian_point: Option<&mut Matrix1x2<f64>>,
    ) -> ManifoldResult<SO2> {
        if jacobian_self.is_none() && jacobian_point.is_none() {
            let local = self.transform_to(point, None, None);
            return SO2::relative_bearing(&local, None);
        }

        let mut d_local_d_pose = Matrix2x3::zeros();
        let mut d_local_d_point = Matrix2::zeros();
        let local = self.transform_to(
            point,
            Some(&mut d_local_d_pose),
            Some(&mut d_local_d_point),
        );

        let mut d_bearing = Matrix1x2::zeros();
        let bearing = SO2::relative_bearing(&local, Some(&mut d_bearing))?;

        if let Some(jac) = jacobian_self {
            *jac = d_bearing * d_local_d_pose;
        }
        if let Some(jac) = jacobian_point {
            *jac = d_bearing * d_local_d_point;
        }

        Ok(bearing)
    }

    /// Euclidean distance from the pose translation to `point`.
    ///
    /// # Arguments
    /// * `point` - Landmark in the world frame
    /// * `jacobian_self` - Optional Jacobian (1×3) with respect to the pose
    /// * `jacobian_point` - Optional Jacobian (1×2) with respect to the point
    ///
    /// # Errors
    /// Returns [`ManifoldError::DegenerateGeometry`] when a Jacobian is requested
    /// and `point` coincides with the pose translation.
    pub fn range(
        &self,
        point: &Point2<f64>,
        jacobian_self: Option<&mut Matrix1x3<f64>>,
        jacobian_point: Option<&mut Matrix1x2<f64>>,
    ) -> ManifoldResult<f64> {
        let offset = point.coords - self.translation;
        let range = offset.norm();

        if jacobian_self.is_none() && jacobian_point.is_none() {
            return Ok(range);
        }
        if range < f64::EPSILON {
            return Err(ManifoldError::DegenerateGeometry(
                "range Jacobian is undefined when the point coincides with the pose".to_string(),
            )
            .log());
        }

        if let Some(jac) = jacobian_self {
            let local = self.rotation.unrotate(&offset, None, None);
            *jac = Matrix1x3::new(-local.x / range, -local.y / range, 0.0);
        }
        if let Some(jac) = jacobian_point {
            *jac = Matrix1x2::new(offset.x / range, offset.y / range);
        }

        Ok(range)
    }
}

impl LieGroup for SE2 {
    type TangentVector = SE2Tangent;
    type JacobianMatrix = Matrix3<f64>;

    /// Get the inverse.
    ///
    /// # Notes
    /// For SE(2): g^{-1} = [R^T, -R^T * t; 0, 1]
    /// J_g⁻¹_g = -Ad(g)
    fn inverse(&self, jacobian: Option<&mut Self::JacobianMatrix>) -> Self {
        if let Some(jac) = jacobian {
            *jac = -self.adjoint();
        }

        let rotation = self.rotation.inverse(None);
        let translation = -rotation.rotate(&self.translation, None, None);
        SE2::new(translation, rotation)
    }

    /// Composition of this and another SE2 element.
    ///
    /// # Notes
    /// t = t₁ + R₁·t₂, R = R₁·R₂
    /// J_C_A = Ad(B)⁻¹
    /// J_C_B = I
    fn compose(
        &self,
        other: &Self,
        jacobian_self: Option<&mut Self::JacobianMatrix>,
        jacobian_other: Option<&mut Self::JacobianMatrix>,
    ) -> Self {
        if let Some(jac_self) = jacobian_self {
            *jac_self = other.inverse(None).adjoint();
        }
        if let Some(jac_other) = jacobian_other {
            *jac_other = Matrix3::identity();
        }

        SE2::new(
            self.translation + self.rotation.rotate(&other.translation, None, None),
            self.rotation.compose(&other.rotation, None, None),
        )
    }

    /// Chart coordinates [x, y, θ] of this pose.
    fn log(&self, jacobian: Option<&mut Self::JacobianMatrix>) -> Self::TangentVector {
        let result = SE2Tangent::new(self.x(), self.y(), self.angle());

        if let Some(jac) = jacobian {
            *jac = result.right_jacobian_inv();
        }

        result
    }

    /// Ad(g) = [R, [y, -x]ᵀ; 0, 1]
    fn adjoint(&self) -> Self::JacobianMatrix {
        let mut adjoint_matrix = Matrix3::identity();
        adjoint_matrix
            .fixed_view_mut::<2, 2>(0, 0)
            .copy_from(&self.rotation_matrix());
        adjoint_matrix[(0, 2)] = self.y();
        adjoint_matrix[(1, 2)] = -self.x();

        adjoint_matrix
    }

    fn random() -> Self {
        let mut rng = rand::rng();
        SE2::from_xy_angle(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-PI..PI),
        )
    }

    fn jacobian_identity() -> Self::JacobianMatrix {
        Matrix3::<f64>::identity()
    }

    fn is_approx(&self, other: &Self, tolerance: f64) -> bool {
        self.right_minus(other, None, None).is_zero(tolerance)
    }
}

/// SE(2) tangent space element, stored as [x, y, theta].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SE2Tangent {
    data: Vector3<f64>,
}

impl fmt::Display for SE2Tangent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SE2Tangent(x: {:.4}, y: {:.4}, theta: {:.4})",
            self.x(),
            self.y(),
            self.angle()
        )
    }
}

impl SE2Tangent {
    /// Create a new SE2Tangent from x, y, and theta components.
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        SE2Tangent {
            data: Vector3::new(x, y, theta),
        }
    }

    /// Create a tangent from its coordinates in [x, y, theta] order.
    pub fn from_coords(data: Vector3<f64>) -> Self {
        SE2Tangent { data }
    }

    pub fn coords(&self) -> Vector3<f64> {
        self.data
    }

    pub fn x(&self) -> f64 {
        self.data[0]
    }

    pub fn y(&self) -> f64 {
        self.data[1]
    }

    pub fn angle(&self) -> f64 {
        self.data[2]
    }

    pub fn translation(&self) -> Vector2<f64> {
        Vector2::new(self.x(), self.y())
    }

    fn rotation(&self) -> SO2 {
        SO2Tangent::new(self.angle()).exp(None)
    }
}

impl Tangent<SE2> for SE2Tangent {
    const DIM: usize = 3;

    /// exp([x y θ]) = (R(θ), [x y])
    fn exp(&self, jacobian: Option<&mut <SE2 as LieGroup>::JacobianMatrix>) -> SE2 {
        if let Some(jac) = jacobian {
            *jac = self.right_jacobian();
        }
        SE2::new(self.translation(), self.rotation())
    }

    /// Jr = [R(θ)ᵀ, 0; 0, 1]
    fn right_jacobian(&self) -> <SE2 as LieGroup>::JacobianMatrix {
        let mut jac = Matrix3::identity();
        jac.fixed_view_mut::<2, 2>(0, 0)
            .copy_from(&self.rotation().rotation_matrix().transpose());
        jac
    }

    /// Jl = [I, [y, -x]ᵀ; 0, 1]
    fn left_jacobian(&self) -> <SE2 as LieGroup>::JacobianMatrix {
        let mut jac = Matrix3::identity();
        jac[(0, 2)] = self.y();
        jac[(1, 2)] = -self.x();
        jac
    }

    fn right_jacobian_inv(&self) -> <SE2 as LieGroup>::JacobianMatrix {
        let mut jac = Matrix3::identity();
        jac.fixed_view_mut::<2, 2>(0, 0)
            .copy_from(&self.rotation().rotation_matrix());
        jac
    }

    fn left_jacobian_inv(&self) -> <SE2 as LieGroup>::JacobianMatrix {
        let mut jac = Matrix3::identity();
        jac[(0, 2)] = -self.y();
        jac[(1, 2)] = self.x();
        jac
    }

    fn to_vector(&self) -> DVector<f64> {
        DVector::from_column_slice(self.data.as_slice())
    }

    fn from_vector(data: &DVector<f64>) -> ManifoldResult<SE2Tangent> {
        if data.len() != Self::DIM {
            return Err(ManifoldError::InvalidTangentDimension {
                expected: Self::DIM,
                actual: data.len(),
            });
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(ManifoldError::InvalidNumber);
        }
        Ok(SE2Tangent::new(data[0], data[1], data[2]))
    }

    fn is_approx(&self, other: &Self, tolerance: f64) -> bool {
        (self.data - other.data).norm() < tolerance
    }

    fn zero() -> Self {
        SE2Tangent {
            data: Vector3::zeros(),
        }
    }

    fn random() -> Self {
        let mut rng = rand::rng();
        SE2Tangent::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-PI..PI),
        )
    }

    fn is_zero(&self, tolerance: f64) -> bool {
        self.data.norm() < tolerance
    }
}
