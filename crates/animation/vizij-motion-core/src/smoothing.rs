//! Half-life exponential smoothing.
//!
//! `value = target + (value - target) * exp(-ln2 * dt / half_life)`, so after
//! one half-life the remaining distance to the target is halved. A
//! non-positive half-life snaps straight to the target.

use nalgebra::Vector3;

use crate::derivative::clamp_step;

/// Decay factor for one step, or `0` (snap) when the half-life is not usable.
#[inline]
fn decay(half_life: f32, dt: f32) -> f32 {
    if !half_life.is_finite() || half_life <= 0.0 {
        return 0.0;
    }
    (-std::f32::consts::LN_2 * clamp_step(dt) / half_life.max(1.0e-6)).exp()
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SmoothValue {
    pub value: f32,
}

impl SmoothValue {
    pub fn new(value: f32) -> Self {
        Self { value }
    }

    pub fn step(&mut self, target: f32, half_life: f32, dt: f32) -> f32 {
        self.value = target + (self.value - target) * decay(half_life, dt);
        self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothValue3 {
    pub value: Vector3<f32>,
}

impl Default for SmoothValue3 {
    fn default() -> Self {
        Self::new(Vector3::zeros())
    }
}

impl SmoothValue3 {
    pub fn new(value: Vector3<f32>) -> Self {
        Self { value }
    }

    pub fn step(&mut self, target: Vector3<f32>, half_life: f32, dt: f32) -> Vector3<f32> {
        self.value = target + (self.value - target) * decay(half_life, dt);
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn halves_distance_per_half_life() {
        let mut s = SmoothValue::new(1.0);
        assert_relative_eq!(s.step(0.0, 0.2, 0.2), 0.5, epsilon = 1e-6);
        assert_relative_eq!(s.step(0.0, 0.2, 0.2), 0.25, epsilon = 1e-6);
    }

    #[test]
    fn non_positive_half_life_snaps() {
        let mut s = SmoothValue3::new(Vector3::new(1.0, 2.0, 3.0));
        let target = Vector3::new(-1.0, 0.0, 4.0);
        assert_eq!(s.step(target, 0.0, 0.1), target);
        let mut s = SmoothValue::new(3.0);
        assert_eq!(s.step(1.0, f32::NAN, 0.1), 1.0);
    }

    #[test]
    fn zero_step_holds() {
        let mut s = SmoothValue::new(3.0);
        assert_eq!(s.step(1.0, 0.5, 0.0), 3.0);
    }
}
