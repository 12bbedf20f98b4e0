//! Rigid transform (translation + rotation) used for joints and root motion.
//!
//! Composition follows the parent-then-child convention:
//! `(a * b).transform_point(p) == a.transform_point(b.transform_point(p))`.

use std::ops::{Mul, MulAssign};

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

const SLERP_EPSILON: f32 = 1.0e-6;

/// Translation + rotation pair. Rotations are renormalized after every
/// composition so drift never accumulates across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "TransformRepr", into = "TransformRepr")]
pub struct AffineTransform {
    pub t: Vector3<f32>,
    pub q: UnitQuaternion<f32>,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    #[inline]
    pub fn new(t: Vector3<f32>, q: UnitQuaternion<f32>) -> Self {
        Self { t, q }
    }

    #[inline]
    pub fn identity() -> Self {
        Self {
            t: Vector3::zeros(),
            q: UnitQuaternion::identity(),
        }
    }

    #[inline]
    pub fn from_translation(t: Vector3<f32>) -> Self {
        Self {
            t,
            q: UnitQuaternion::identity(),
        }
    }

    #[inline]
    pub fn from_rotation(q: UnitQuaternion<f32>) -> Self {
        Self {
            t: Vector3::zeros(),
            q,
        }
    }

    #[inline]
    pub fn transform_point(&self, p: Vector3<f32>) -> Vector3<f32> {
        self.q * p + self.t
    }

    #[inline]
    pub fn transform_direction(&self, v: Vector3<f32>) -> Vector3<f32> {
        self.q * v
    }

    #[inline]
    pub fn inverse_transform_point(&self, p: Vector3<f32>) -> Vector3<f32> {
        self.q.inverse() * (p - self.t)
    }

    #[inline]
    pub fn inverse_transform_direction(&self, v: Vector3<f32>) -> Vector3<f32> {
        self.q.inverse() * v
    }

    #[inline]
    pub fn inverse(&self) -> Self {
        let q = self.q.inverse();
        Self { t: q * -self.t, q }
    }

    /// Difference between two transforms: `self.inverse() * other`.
    ///
    /// This is the residual that, composed back onto `self`, yields `other`.
    #[inline]
    pub fn inverse_times(&self, other: &AffineTransform) -> Self {
        let q = self.q.inverse();
        let mut r = q * other.q;
        r.renormalize();
        Self {
            t: q * (other.t - self.t),
            q: r,
        }
    }

    /// Lerp on translation, shortest-arc slerp on rotation.
    pub fn interpolate(a: &AffineTransform, b: &AffineTransform, w: f32) -> Self {
        Self {
            t: a.t.lerp(&b.t, w),
            q: slerp_shortest(&a.q, &b.q, w),
        }
    }
}

impl Mul for AffineTransform {
    type Output = AffineTransform;

    #[inline]
    fn mul(self, rhs: AffineTransform) -> AffineTransform {
        let mut q = self.q * rhs.q;
        q.renormalize();
        AffineTransform {
            t: self.t + self.q * rhs.t,
            q,
        }
    }
}

impl MulAssign for AffineTransform {
    #[inline]
    fn mul_assign(&mut self, rhs: AffineTransform) {
        *self = *self * rhs;
    }
}

/// Slerp taking the shorter of the two arcs between `a` and `b`.
///
/// Nearly identical rotations fall back to nlerp, where slerp's `sin` term
/// vanishes.
pub fn slerp_shortest(
    a: &UnitQuaternion<f32>,
    b: &UnitQuaternion<f32>,
    t: f32,
) -> UnitQuaternion<f32> {
    let b = if a.coords.dot(&b.coords) < 0.0 {
        UnitQuaternion::new_unchecked(-b.into_inner())
    } else {
        *b
    };
    a.try_slerp(&b, t, SLERP_EPSILON)
        .unwrap_or_else(|| a.nlerp(&b, t))
}

/// Serialized form: `{ "t": [x, y, z], "q": [x, y, z, w] }`.
#[derive(Serialize, Deserialize)]
struct TransformRepr {
    t: [f32; 3],
    q: [f32; 4],
}

impl From<TransformRepr> for AffineTransform {
    fn from(repr: TransformRepr) -> Self {
        let [x, y, z, w] = repr.q;
        // A zero quaternion has no orientation; treat it as "no rotation".
        let q = UnitQuaternion::try_new(Quaternion::new(w, x, y, z), SLERP_EPSILON)
            .unwrap_or_else(UnitQuaternion::identity);
        Self {
            t: Vector3::from(repr.t),
            q,
        }
    }
}

impl From<AffineTransform> for TransformRepr {
    fn from(xf: AffineTransform) -> Self {
        Self {
            t: [xf.t.x, xf.t.y, xf.t.z],
            q: [xf.q.i, xf.q.j, xf.q.k, xf.q.w],
        }
    }
}
