//! Per-character configuration for the motion core.

use serde::{Deserialize, Serialize};

use crate::error::MotionError;
use crate::trajectory::{half_length_for, MAX_HALF_LENGTH};

/// Tuning for one character instance.
///
/// Buffers are sized from this once at construction; changing it later has no
/// effect on an existing synthesizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MotionConfig {
    /// Seconds an inertial blend takes to decay a residual to zero.
    pub blend_duration: f32,
    /// Seconds of trajectory kept on each side of the present.
    pub time_horizon: f32,
    /// Trajectory samples per second.
    pub sample_rate: f32,
    /// Normalized prediction time before the desired velocity is committed.
    pub velocity_factor: f32,
    /// Normalized prediction time before the desired rotation is committed.
    pub rotation_factor: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            blend_duration: 0.25,
            time_horizon: 1.0,
            sample_rate: 30.0,
            velocity_factor: 0.5,
            rotation_factor: 0.5,
        }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> Result<(), MotionError> {
        if !self.blend_duration.is_finite() || self.blend_duration < 0.0 {
            return Err(MotionError::invalid_config(
                "blendDuration",
                format!("must be finite and >= 0, got {}", self.blend_duration),
            ));
        }
        half_length_for(self.time_horizon, self.sample_rate)?;
        for (field, value) in [
            ("velocityFactor", self.velocity_factor),
            ("rotationFactor", self.rotation_factor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MotionError::invalid_config(
                    field,
                    format!("must be within [0, 1], got {value}"),
                ));
            }
        }
        Ok(())
    }

    /// Samples on one side of the present (excluding the present sample).
    #[inline]
    pub fn half_length(&self) -> usize {
        let samples = (self.time_horizon * self.sample_rate).round();
        if samples.is_nan() {
            0
        } else {
            samples.clamp(0.0, MAX_HALF_LENGTH as f32) as usize
        }
    }

    /// Length of the root-relative trajectory array: past, present and future.
    #[inline]
    pub fn trajectory_length(&self) -> usize {
        2 * self.half_length() + 1
    }
}
