//! Finite-difference helpers for transforms.
//!
//! All divisions go through [`safe_recip`], so a zero or non-finite time step
//! yields a zero rate instead of NaN/Inf.

use nalgebra::{UnitQuaternion, Vector3};

use crate::transform::AffineTransform;

/// Durations at or below this are treated as zero.
pub const TIME_EPSILON: f32 = 1.0e-6;

/// `1 / x`, or `0` when `x` is too small (or not finite) to divide by.
#[inline]
pub fn safe_recip(x: f32) -> f32 {
    if x.is_finite() && x.abs() > TIME_EPSILON {
        x.recip()
    } else {
        0.0
    }
}

/// Non-negative finite time step; anything else counts as no time passing.
#[inline]
pub fn clamp_step(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.max(0.0)
    } else {
        0.0
    }
}

/// Translation rate `(current - previous) / dt`.
#[inline]
pub fn linear_velocity(
    current: &AffineTransform,
    previous: &AffineTransform,
    dt: f32,
) -> Vector3<f32> {
    (current.t - previous.t) * safe_recip(dt)
}

/// Rotation rate as an axis-angle vector (radians per second) taking
/// `previous` to `current` over `dt`, expressed in the parent frame.
#[inline]
pub fn angular_velocity(
    current: &AffineTransform,
    previous: &AffineTransform,
    dt: f32,
) -> Vector3<f32> {
    let delta: UnitQuaternion<f32> = current.q * previous.q.inverse();
    delta.scaled_axis() * safe_recip(dt)
}
