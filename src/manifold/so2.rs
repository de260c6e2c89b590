//! SO(2) - Special Orthogonal Group in 2D
//!
//! This module implements the Special Orthogonal group SO(2), which represents
//! rotations in 2D space.
//!
//! SO(2) elements are represented using nalgebra's UnitComplex internally, so
//! composition never accumulates angle drift. The reported angle is always in
//! the canonical range (−π, π].
//!
//! SO(2) tangent elements are represented as a single angle in radians.

use crate::manifold::{LieGroup, ManifoldError, ManifoldResult, Tangent, wrap_angle};
use nalgebra::{DVector, Matrix1, Matrix1x2, Matrix2, Point2, UnitComplex, Vector2};
use rand::Rng;
use std::{
    f64::consts::PI,
    fmt,
    fmt::{Display, Formatter},
};

/// SO(2) group element representing rotations in 2D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SO2 {
    /// Internal representation as a unit complex number
    complex: UnitComplex<f64>,
}

impl Display for SO2 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SO2(angle: {:.4})", self.angle())
    }
}

impl Default for SO2 {
    fn default() -> Self {
        SO2::identity()
    }
}

impl SO2 {
    /// Degrees of freedom - dimension of the tangent space
    pub const DOF: usize = 1;

    /// Get the identity element of the group.
    pub fn identity() -> Self {
        SO2 {
            complex: UnitComplex::identity(),
        }
    }

    /// Create a new SO(2) element from a unit complex number.
    pub fn new(complex: UnitComplex<f64>) -> Self {
        SO2 { complex }
    }

    /// Create SO(2) from an angle in radians. Any real angle is accepted.
    pub fn from_angle(angle: f64) -> Self {
        SO2::new(UnitComplex::new(angle))
    }

    /// Create SO(2) from a cosine/sine pair, renormalizing it onto the unit circle.
    pub fn from_cos_sin(cos: f64, sin: f64) -> Self {
        SO2::from_angle(sin.atan2(cos))
    }

    /// Get the underlying unit complex number.
    pub fn complex(&self) -> UnitComplex<f64> {
        self.complex
    }

    /// Get the rotation angle in radians, in (−π, π].
    pub fn angle(&self) -> f64 {
        let theta = self.complex.angle();
        if theta <= -PI { PI } else { theta }
    }

    pub fn cos(&self) -> f64 {
        self.complex.re
    }

    pub fn sin(&self) -> f64 {
        self.complex.im
    }

    /// Get the rotation matrix (2x2).
    pub fn rotation_matrix(&self) -> Matrix2<f64> {
        self.complex.to_rotation_matrix().into_inner()
    }

    /// Rotate a vector: R·v.
    ///
    /// # Arguments
    /// * `vector` - Vector to rotate
    /// * `jacobian_self` - Optional Jacobian (2×1) with respect to the rotation
    /// * `jacobian_vector` - Optional Jacobian (2×2) with respect to the vector
    pub fn rotate(
        &self,
        vector: &Vector2<f64>,
        jacobian_self: Option<&mut Vector2<f64>>,
        jacobian_vector: Option<&mut Matrix2<f64>>,
    ) -> Vector2<f64> {
        let rotated = self.complex.transform_vector(vector);
        if let Some(jac) = jacobian_self {
            *jac = Vector2::new(-rotated.y, rotated.x);
        }
        if let Some(jac) = jacobian_vector {
            *jac = self.rotation_matrix();
        }
        rotated
    }

    /// Rotate a vector by the inverse rotation: Rᵀ·v.
    ///
    /// # Arguments
    /// * `vector` - Vector to rotate
    /// * `jacobian_self` - Optional Jacobian (2×1) with respect to the rotation
    /// * `jacobian_vector` - Optional Jacobian (2×2) with respect to the vector
    pub fn unrotate(
        &self,
        vector: &Vector2<f64>,
        jacobian_self: Option<&mut Vector2<f64>>,
        jacobian_vector: Option<&mut Matrix2<f64>>,
    ) -> Vector2<f64> {
        let unrotated = self.complex.inverse_transform_vector(vector);
        if let Some(jac) = jacobian_self {
            *jac = Vector2::new(unrotated.y, -unrotated.x);
        }
        if let Some(jac) = jacobian_vector {
            *jac = self.rotation_matrix().transpose();
        }
        unrotated
    }

    /// Rotation pointing from the origin towards `point`: atan2(p.y, p.x).
    ///
    /// # Arguments
    /// * `point` - Target point, expressed in the frame the bearing is measured in
    /// * `jacobian` - Optional Jacobian (1×2) with respect to the point
    ///
    /// # Errors
    /// Returns [`ManifoldError::DegenerateGeometry`] for a point at the origin,
    /// where the direction is undefined.
    pub fn relative_bearing(
        point: &Point2<f64>,
        jacobian: Option<&mut Matrix1x2<f64>>,
    ) -> ManifoldResult<SO2> {
        let r2 = point.coords.norm_squared();
        if r2 < f64::EPSILON * f64::EPSILON {
            return Err(ManifoldError::DegenerateGeometry(
                "bearing is undefined for a point at the origin".to_string(),
            )
            .log());
        }

        if let Some(jac) = jacobian {
            *jac = Matrix1x2::new(-point.y / r2, point.x / r2);
        }
        Ok(SO2::from_angle(point.y.atan2(point.x)))
    }
}

impl LieGroup for SO2 {
    type TangentVector = SO2Tangent;
    type JacobianMatrix = Matrix1<f64>;

    /// SO2 inverse.
    ///
    /// # Notes
    /// R(θ)⁻¹ = R(-θ)
    /// J_R⁻¹_R = -I
    fn inverse(&self, jacobian: Option<&mut Self::JacobianMatrix>) -> Self {
        if let Some(jac) = jacobian {
            *jac = -self.adjoint();
        }
        SO2 {
            complex: self.complex.inverse(),
        }
    }

    /// SO2 composition.
    ///
    /// # Notes
    /// J_C_A = I
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
            *jac_other = Matrix1::identity();
        }
        SO2 {
            complex: self.complex * other.complex,
        }
    }

    /// θ = atan2(R(1,0), R(0,0)), wrapped to (−π, π].
    fn log(&self, jacobian: Option<&mut Self::JacobianMatrix>) -> Self::TangentVector {
        if let Some(jac) = jacobian {
            *jac = Matrix1::identity();
        }
        SO2Tangent { data: self.angle() }
    }

    fn adjoint(&self) -> Self::JacobianMatrix {
        Matrix1::identity()
    }

    fn random() -> Self {
        SO2::from_angle(rand::rng().random_range(-PI..PI))
    }

    fn jacobian_identity() -> Self::JacobianMatrix {
        Matrix1::<f64>::identity()
    }

    fn is_approx(&self, other: &Self, tolerance: f64) -> bool {
        self.right_minus(other, None, None).is_zero(tolerance)
    }
}

/// SO(2) tangent space element: a single angle in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SO2Tangent {
    data: f64,
}

impl fmt::Display for SO2Tangent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "so2(angle: {:.4})", self.data)
    }
}

impl SO2Tangent {
    pub fn new(angle: f64) -> Self {
        SO2Tangent { data: angle }
    }

    pub fn angle(&self) -> f64 {
        self.data
    }
}

impl Tangent<SO2> for SO2Tangent {
    const DIM: usize = 1;

    /// Exponential map: the angle modulo 2π.
    fn exp(&self, jacobian: Option<&mut <SO2 as LieGroup>::JacobianMatrix>) -> SO2 {
        if let Some(jac) = jacobian {
            *jac = Matrix1::identity();
        }
        SO2::from_angle(self.data)
    }

    fn right_jacobian(&self) -> <SO2 as LieGroup>::JacobianMatrix {
        Matrix1::identity()
    }

    fn left_jacobian(&self) -> <SO2 as LieGroup>::JacobianMatrix {
        Matrix1::identity()
    }

    fn right_jacobian_inv(&self) -> <SO2 as LieGroup>::JacobianMatrix {
        Matrix1::identity()
    }

    fn left_jacobian_inv(&self) -> <SO2 as LieGroup>::JacobianMatrix {
        Matrix1::identity()
    }

    fn to_vector(&self) -> DVector<f64> {
        DVector::from_element(1, self.data)
    }

    fn from_vector(data: &DVector<f64>) -> ManifoldResult<SO2Tangent> {
        if data.len() != Self::DIM {
            return Err(ManifoldError::InvalidTangentDimension {
                expected: Self::DIM,
                actual: data.len(),
            });
        }
        Ok(SO2Tangent::new(data[0]))
    }

    fn is_approx(&self, other: &Self, tolerance: f64) -> bool {
        wrap_angle(self.data - other.data).abs() < tolerance
    }

    fn zero() -> Self {
        SO2Tangent { data: 0.0 }
    }

    fn random() -> Self {
        SO2Tangent {
            data: rand::rng().random_range(-0.1..0.1),
        }
    }

    fn is_zero(&self, tolerance: f64) -> bool {
        self.data.abs() < tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerical::{numerical_derivative11, numerical_derivative21};

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn test_so2_identity() {
        let so2 = SO2::identity();
        assert!(so2.angle().abs() < TOLERANCE);
        assert_eq!(SO2::default(), so2);
    }

    #[test]
    fn test_so2_inverse() {
        let so2 = SO2::from_angle(PI / 4.0);
        let mut jac = Matrix1::zeros();
        let so2_inv = so2.inverse(Some(&mut jac));
        assert!((so2_inv.angle() + PI / 4.0).abs() < TOLERANCE);
        assert!((jac[(0, 0)] + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_so2_compose_wraps() {
        let so2_a = SO2::from_angle(3.0 * PI / 4.0);
        let so2_b = SO2::from_angle(PI / 2.0);
        let composed = so2_a.compose(&so2_b, None, None);
        assert!((composed.angle() + 3.0 * PI / 4.0).abs() < TOLERANCE);
        assert!(composed.angle() > -PI && composed.angle() <= PI);
    }

    #[test]
    fn test_so2_angle_at_pi_is_positive() {
        assert!((SO2::from_angle(-PI).angle() - PI).abs() < TOLERANCE);
        assert!((SO2::from_angle(PI).angle() - PI).abs() < TOLERANCE);
    }

    #[test]
    fn test_so2_exp_log_consistency() {
        let tangent = SO2Tangent::new(PI / 4.0);
        let recovered = tangent.exp(None).log(None);
        assert!((tangent.angle() - recovered.angle()).abs() < 1e-10);

        let wrapped = SO2Tangent::new(5.0 * PI / 2.0).exp(None).log(None);
        assert!((wrapped.angle() - PI / 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_so2_from_cos_sin() {
        let so2 = SO2::from_cos_sin(2.0, 2.0);
        assert!((so2.angle() - PI / 4.0).abs() < TOLERANCE);
        assert!((so2.cos() - 0.5_f64.sqrt()).abs() < TOLERANCE);
        assert!((so2.sin() - 0.5_f64.sqrt()).abs() < TOLERANCE);
    }

    #[test]
    fn test_so2_is_approx() {
        let so2_1 = SO2::from_angle(PI / 4.0);
        let so2_2 = SO2::from_angle(PI / 4.0 + 1e-12);
        let so2_3 = SO2::from_angle(PI / 2.0);

        assert!(so2_1.is_approx(&so2_2, 1e-10));
        assert!(!so2_1.is_approx(&so2_3, 1e-10));
        assert!(SO2::from_angle(PI).is_approx(&SO2::from_angle(-PI), 1e-10));
    }

    #[test]
    fn test_so2_rotate_unrotate() {
        let so2 = SO2::from_angle(PI / 2.0);
        let v = Vector2::new(1.0, 0.0);
        let rotated = so2.rotate(&v, None, None);
        assert!((rotated - Vector2::new(0.0, 1.0)).norm() < TOLERANCE);
        let back = so2.unrotate(&rotated, None, None);
        assert!((back - v).norm() < TOLERANCE);
    }

    #[test]
    fn test_so2_rotate_jacobians() {
        let so2 = SO2::from_angle(0.3);
        let point = Point2::new(1.5, -0.7);

        let mut jac_rot = Vector2::zeros();
        let mut jac_vec = Matrix2::zeros();
        so2.rotate(&point.coords, Some(&mut jac_rot), Some(&mut jac_vec));

        let rotate = |r: &SO2, p: &Point2<f64>| Point2::from(r.rotate(&p.coords, None, None));
        let numerical_rot = numerical_derivative21(rotate, &so2, &point, 1e-5);
        for i in 0..2 {
            assert!((numerical_rot[(i, 0)] - jac_rot[i]).abs() < 1e-5);
        }

        let mut jac_unrot = Vector2::zeros();
        so2.unrotate(&point.coords, Some(&mut jac_unrot), None);
        let unrotate = |r: &SO2, p: &Point2<f64>| Point2::from(r.unrotate(&p.coords, None, None));
        let numerical_unrot = numerical_derivative21(unrotate, &so2, &point, 1e-5);
        for i in 0..2 {
            assert!((numerical_unrot[(i, 0)] - jac_unrot[i]).abs() < 1e-5);
        }
    }

    #[test]
    fn test_so2_relative_bearing() -> Result<(), Box<dyn std::error::Error>> {
        let point = Point2::new(2.0, 2.0);
        let mut jac = Matrix1x2::zeros();
        let bearing = SO2::relative_bearing(&point, Some(&mut jac))?;
        assert!((bearing.angle() - PI / 4.0).abs() < TOLERANCE);

        let numerical = numerical_derivative11(
            |p: &Point2<f64>| SO2::relative_bearing(p, None).unwrap_or_default(),
            &point,
            1e-5,
        );
        assert!((numerical[(0, 0)] - jac[(0, 0)]).abs() < 1e-5);
        assert!((numerical[(0, 1)] - jac[(0, 1)]).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_so2_relative_bearing_degenerate() {
        let origin = Point2::origin();
        let mut jac = Matrix1x2::zeros();
        assert!(matches!(
            SO2::relative_bearing(&origin, Some(&mut jac)),
            Err(ManifoldError::DegenerateGeometry(_))
        ));
        assert!(matches!(
            SO2::relative_bearing(&origin, None),
            Err(ManifoldError::DegenerateGeometry(_))
        ));
        assert!(SO2::relative_bearing(&Point2::new(1e-6, 0.0), None).is_ok());
    }

    #[test]
    fn test_so2_right_minus_jacobians() {
        let a = SO2::from_angle(0.4);
        let b = SO2::from_angle(-1.1);
        let mut jac_a = Matrix1::zeros();
        let mut jac_b = Matrix1::zeros();
        let diff = a.right_minus(&b, Some(&mut jac_a), Some(&mut jac_b));
        assert!((diff.angle() - 1.5).abs() < TOLERANCE);
        assert!((jac_a[(0, 0)] - 1.0).abs() < TOLERANCE);
        assert!((jac_b[(0, 0)] + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_so2_tangent_from_vector_dimension() {
        let bad = DVector::from_vec(vec![0.1, 0.2]);
        assert_eq!(
            SO2Tangent::from_vector(&bad),
            Err(ManifoldError::InvalidTangentDimension {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn test_so2_random_in_range() {
        for _ in 0..20 {
            let r = SO2::random();
            assert!(r.angle() > -PI && r.angle() <= PI);
            assert!(SO2Tangent::random().is_zero(0.1 + 1e-12));
        }
    }
}
