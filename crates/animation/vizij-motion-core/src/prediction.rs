//! Future trajectory prediction toward a desired velocity and facing.
//!
//! Prediction runs in normalized time: step `i` of `half` sits at
//! `elapsed = i / half`. Velocity and facing are smoothed toward their goals
//! with a half-life of `max(0, factor - elapsed)`, so a factor of `0` commits
//! on the first sample and a factor of `1` only fully commits on the last.

use nalgebra::{UnitQuaternion, Vector3};

use crate::derivative::safe_recip;
use crate::smoothing::{SmoothValue, SmoothValue3};
use crate::transform::{slerp_shortest, AffineTransform};

/// Writes the future half of a trajectory slice.
///
/// ```ignore
/// let mut prediction = TrajectoryPrediction::new(/* .. */);
/// while !prediction.is_full() {
///     let mut next = prediction.advance();
///     next.t.y = ground_height(next.t);
///     prediction.push(next);
/// }
/// ```
pub struct TrajectoryPrediction<'a> {
    trajectory: &'a mut [AffineTransform],
    half_length: usize,
    sample_rate: f32,
    desired_velocity: Vector3<f32>,
    desired_rotation: UnitQuaternion<f32>,
    velocity_factor: f32,
    rotation_factor: f32,
    velocity: SmoothValue3,
    rotation_weight: SmoothValue,
    transform: AffineTransform,
    index: usize,
    written: usize,
}

impl<'a> TrajectoryPrediction<'a> {
    /// `desired_linear_velocity` and `desired_rotation` are world-space goals;
    /// `current_velocity` is in the character's root space. The future half of
    /// `trajectory` (present sample included) is reset to identity.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        current_world_root: &AffineTransform,
        desired_linear_velocity: Vector3<f32>,
        desired_rotation: UnitQuaternion<f32>,
        trajectory: &'a mut [AffineTransform],
        velocity_factor: f32,
        rotation_factor: f32,
        current_velocity: Vector3<f32>,
        sample_rate: f32,
    ) -> Self {
        let half_length = trajectory.len() / 2;
        for sample in &mut trajectory[half_length..] {
            *sample = AffineTransform::identity();
        }
        let desired_velocity = if desired_linear_velocity.iter().all(|v| v.is_finite()) {
            current_world_root.inverse_transform_direction(desired_linear_velocity)
        } else {
            Vector3::zeros()
        };
        let current_velocity = if current_velocity.iter().all(|v| v.is_finite()) {
            current_velocity
        } else {
            Vector3::zeros()
        };
        Self {
            trajectory,
            half_length,
            sample_rate,
            desired_velocity,
            desired_rotation: current_world_root.q.inverse() * desired_rotation,
            velocity_factor: sanitize_factor(velocity_factor),
            rotation_factor: sanitize_factor(rotation_factor),
            velocity: SmoothValue3::new(current_velocity),
            rotation_weight: SmoothValue::new(0.0),
            transform: AffineTransform::identity(),
            index: 0,
            written: 0,
        }
    }

    /// Goal velocity in root space.
    #[inline]
    pub fn desired_velocity(&self) -> Vector3<f32> {
        self.desired_velocity
    }

    /// Goal facing in root space.
    #[inline]
    pub fn desired_rotation(&self) -> UnitQuaternion<f32> {
        self.desired_rotation
    }

    /// Smoothed velocity after the last [`advance`](Self::advance).
    #[inline]
    pub fn velocity(&self) -> Vector3<f32> {
        self.velocity.value
    }

    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.half_length + 1 + self.written >= self.trajectory.len()
    }

    /// Predict the next future sample from the running transform.
    pub fn advance(&mut self) -> AffineTransform {
        self.index += 1;
        let step = safe_recip(self.half_length as f32);
        let elapsed = self.index as f32 * step;

        let velocity = self.velocity.step(
            self.desired_velocity,
            (self.velocity_factor - elapsed).max(0.0),
            step,
        );
        let weight = self.rotation_weight.step(
            1.0,
            (self.rotation_factor - elapsed).max(0.0),
            step,
        );

        AffineTransform::new(
            self.transform.t + velocity * safe_recip(self.sample_rate),
            slerp_shortest(&UnitQuaternion::identity(), &self.desired_rotation, weight),
        )
    }

    /// Store `transform` as the next future sample and continue from it.
    /// Returns `false` once the future half is full.
    pub fn push(&mut self, transform: AffineTransform) -> bool {
        if self.is_full() {
            return false;
        }
        self.trajectory[self.half_length + 1 + self.written] = transform;
        self.transform = transform;
        self.written += 1;
        true
    }

    /// Fill the remaining future half; returns the number of samples written.
    pub fn generate(&mut self) -> usize {
        while !self.is_full() {
            let next = self.advance();
            self.push(next);
        }
        self.written
    }
}

#[inline]
fn sanitize_factor(factor: f32) -> f32 {
    if factor.is_finite() {
        factor.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn push_stops_when_full() {
        let mut samples = vec![AffineTransform::identity(); 5];
        let mut prediction = TrajectoryPrediction::new(
            &AffineTransform::identity(),
            Vector3::new(1.0, 0.0, 0.0),
            UnitQuaternion::identity(),
            &mut samples,
            0.0,
            0.0,
            Vector3::zeros(),
            10.0,
        );
        assert!(prediction.push(AffineTransform::identity()));
        assert!(prediction.push(AffineTransform::identity()));
        assert!(!prediction.push(AffineTransform::identity()));
        assert_eq!(prediction.written(), 2);
    }

    #[test]
    fn desired_goals_are_made_root_relative() {
        let mut samples = vec![AffineTransform::identity(); 5];
        let root = AffineTransform::from_rotation(UnitQuaternion::from_axis_angle(
            &Vector3::y_axis(),
            std::f32::consts::FRAC_PI_2,
        ));
        let prediction = TrajectoryPrediction::new(
            &root,
            Vector3::new(1.0, 0.0, 0.0),
            root.q,
            &mut samples,
            0.5,
            0.5,
            Vector3::zeros(),
            10.0,
        );
        assert_relative_eq!(
            prediction.desired_velocity(),
            Vector3::new(0.0, 0.0, 1.0),
            epsilon = 1e-6
        );
        assert!(prediction.desired_rotation().angle() < 1e-6);
    }

    #[test]
    fn clears_present_and_future() {
        let junk = AffineTransform::from_translation(Vector3::new(9.0, 9.0, 9.0));
        let mut samples = vec![junk; 5];
        TrajectoryPrediction::new(
            &AffineTransform::identity(),
            Vector3::zeros(),
            UnitQuaternion::identity(),
            &mut samples,
            0.5,
            0.5,
            Vector3::zeros(),
            10.0,
        );
        assert_eq!(samples[0], junk);
        assert_eq!(samples[1], junk);
        assert!(samples[2..].iter().all(|s| *s == AffineTransform::identity()));
    }
}
