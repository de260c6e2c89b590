//! Central-difference numerical derivatives on manifolds.
//!
//! Used to verify analytic Jacobians: each input is perturbed through its own
//! retraction and each output difference is read back through local
//! coordinates, so the result is directly comparable with the right-perturbation
//! Jacobians returned by [`crate::manifold`] operations.
//!
//! ```
//! use nalgebra::Point2;
//! use planar_lsq::manifold::se2::SE2;
//! use planar_lsq::numerical::{DEFAULT_STEP, numerical_derivative21};
//!
//! let pose = SE2::from_xy_angle(1.0, 2.0, std::f64::consts::FRAC_PI_2);
//! let point = Point2::new(-1.0, 4.0);
//! let h = numerical_derivative21(
//!     |p: &SE2, l: &Point2<f64>| p.transform_to(l, None, None),
//!     &pose,
//!     &point,
//!     DEFAULT_STEP,
//! );
//! assert_eq!(h.shape(), (2, 3));
//! ```

use crate::manifold::{
    LieGroup, Tangent,
    se2::{SE2, SE2Tangent},
    so2::{SO2, SO2Tangent},
};
use nalgebra::{DMatrix, DVector, Point2, Vector2};

/// Default central-difference step.
pub const DEFAULT_STEP: f64 = 1e-5;

/// A value that can be perturbed by a tangent vector and compared in local coordinates.
pub trait LocalCoordinates {
    /// Dimension of the local coordinate space.
    fn dim(&self) -> usize;

    /// Move away from `self` along `delta` (length `dim()`).
    fn retract(&self, delta: &DVector<f64>) -> Self;

    /// Coordinates of `other` relative to `self`; inverse of [`LocalCoordinates::retract`].
    fn local(&self, other: &Self) -> DVector<f64>;
}

impl LocalCoordinates for f64 {
    fn dim(&self) -> usize {
        1
    }

    fn retract(&self, delta: &DVector<f64>) -> Self {
        self + delta[0]
    }

    fn local(&self, other: &Self) -> DVector<f64> {
        DVector::from_element(1, other - self)
    }
}

impl LocalCoordinates for DVector<f64> {
    fn dim(&self) -> usize {
        self.len()
    }

    fn retract(&self, delta: &DVector<f64>) -> Self {
        self + delta
    }

    fn local(&self, other: &Self) -> DVector<f64> {
        other - self
    }
}

impl LocalCoordinates for Point2<f64> {
    fn dim(&self) -> usize {
        2
    }

    fn retract(&self, delta: &DVector<f64>) -> Self {
        self + Vector2::new(delta[0], delta[1])
    }

    fn local(&self, other: &Self) -> DVector<f64> {
        let d = other - self;
        DVector::from_column_slice(d.as_slice())
    }
}

impl LocalCoordinates for SO2 {
    fn dim(&self) -> usize {
        SO2::DOF
    }

    fn retract(&self, delta: &DVector<f64>) -> Self {
        self.right_plus(&SO2Tangent::new(delta[0]), None, None)
    }

    fn local(&self, other: &Self) -> DVector<f64> {
        other.right_minus(self, None, None).to_vector()
    }
}

impl LocalCoordinates for SE2 {
    fn dim(&self) -> usize {
        SE2::DOF
    }

    fn retract(&self, delta: &DVector<f64>) -> Self {
        self.expmap(&SE2Tangent::new(delta[0], delta[1], delta[2]))
    }

    fn local(&self, other: &Self) -> DVector<f64> {
        self.logmap(other).to_vector()
    }
}

/// Numerical Jacobian of a unary function `f(x)`, shaped `dim(y) × dim(x)`.
pub fn numerical_derivative11<X, Y, F>(f: F, x: &X, step: f64) -> DMatrix<f64>
where
    X: LocalCoordinates,
    Y: LocalCoordinates,
    F: Fn(&X) -> Y,
{
    let y0 = f(x);
    let mut jacobian = DMatrix::zeros(y0.dim(), x.dim());

    for j in 0..x.dim() {
        let mut delta = DVector::zeros(x.dim());
        delta[j] = step;
        let forward = y0.local(&f(&x.retract(&delta)));
        let backward = y0.local(&f(&x.retract(&-&delta)));
        jacobian.set_column(j, &((forward - backward) / (2.0 * step)));
    }

    jacobian
}

/// Numerical Jacobian of `f(x1, x2)` with respect to its first argument.
pub fn numerical_derivative21<X1, X2, Y, F>(f: F, x1: &X1, x2: &X2, step: f64) -> DMatrix<f64>
where
    X1: LocalCoordinates,
    X2: LocalCoordinates,
    Y: LocalCoordinates,
    F: Fn(&X1, &X2) -> Y,
{
    numerical_derivative11(|a: &X1| f(a, x2), x1, step)
}

/// Numerical Jacobian of `f(x1, x2)` with respect to its second argument.
pub fn numerical_derivative22<X1, X2, Y, F>(f: F, x1: &X1, x2: &X2, step: f64) -> DMatrix<f64>
where
    X1: LocalCoordinates,
    X2: LocalCoordinates,
    Y: LocalCoordinates,
    F: Fn(&X1, &X2) -> Y,
{
    numerical_derivative11(|b: &X2| f(x1, b), x2, step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_derivative() {
        let jac = numerical_derivative11(|x: &f64| x * x * x, &2.0, DEFAULT_STEP);
        assert_eq!(jac.shape(), (1, 1));
        assert!((jac[(0, 0)] - 12.0).abs() < 1e-8);
    }

    #[test]
    fn test_binary_derivatives() {
        let f = |a: &f64, p: &Point2<f64>| a * p.x + p.y * p.y;
        let point = Point2::new(3.0, -2.0);

        let d1 = numerical_derivative21(f, &0.5, &point, DEFAULT_STEP);
        assert!((d1[(0, 0)] - 3.0).abs() < 1e-8);

        let d2 = numerical_derivative22(f, &0.5, &point, DEFAULT_STEP);
        assert_eq!(d2.shape(), (1, 2));
        assert!((d2[(0, 0)] - 0.5).abs() < 1e-8);
        assert!((d2[(0, 1)] + 4.0).abs() < 1e-8);
    }

    #[test]
    fn test_retract_local_inverse() {
        let pose = SE2::from_xy_angle(0.2, -1.0, 2.5);
        let delta = DVector::from_vec(vec![0.1, -0.3, 0.2]);
        let moved = pose.retract(&delta);
        assert!((pose.local(&moved) - delta).norm() < 1e-12);

        let rot = SO2::from_angle(3.1);
        let moved = rot.retract(&DVector::from_element(1, 0.1));
        assert!((rot.local(&moved)[0] - 0.1).abs() < 1e-12);
    }
}
