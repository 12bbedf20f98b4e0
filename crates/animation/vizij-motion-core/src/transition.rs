//! Inertial blending: analytic decay of a pose residual to zero.
//!
//! A residual is the difference between the pose that was being output and a
//! newly selected target. Each scalar channel of that residual follows a
//! quintic `x(t)` with
//!
//! - `x(0) = x0`, `x'(0) = v0`, `x''(0) = a0` (derived)
//! - `x(t1) = x'(t1) = x''(t1) = 0`
//!
//! so the blend ends with no step in position, velocity or acceleration.

use nalgebra::{Unit, UnitQuaternion, Vector3};

use crate::derivative::{clamp_step, safe_recip};
use crate::transform::AffineTransform;

/// Offsets and durations at or below this are treated as zero.
pub const TRANSITION_EPSILON: f32 = 1.0e-5;

/// Quintic decay of one scalar residual channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarTransition {
    x0: f32,
    v0: f32,
    a0: f32,
    a: f32,
    b: f32,
    c: f32,
    duration: f32,
}

impl ScalarTransition {
    /// The transition that is zero everywhere.
    pub const IDENTITY: ScalarTransition = ScalarTransition {
        x0: 0.0,
        v0: 0.0,
        a0: 0.0,
        a: 0.0,
        b: 0.0,
        c: 0.0,
        duration: 0.0,
    };

    /// Build the decay of offset `x0` moving at `v0`, finishing by `t1`.
    ///
    /// `v0` is clamped so it never points away from zero. When `v0` would
    /// carry the channel past zero before `t1`, the duration is shortened to
    /// `-5 * x0 / v0`, which keeps the curve from overshooting.
    pub fn new(x0: f32, v0: f32, t1: f32) -> Self {
        if t1.is_nan()
            || t1 <= TRANSITION_EPSILON
            || !x0.is_finite()
            || x0.abs() <= TRANSITION_EPSILON
        {
            return Self::IDENTITY;
        }

        // Solve with a positive offset, then mirror back.
        let sign = x0.signum();
        let x = x0.abs();
        let v = if v0.is_finite() {
            (v0 * sign).min(0.0)
        } else {
            0.0
        };

        let t1 = if v < 0.0 { t1.min(-5.0 * x / v) } else { t1 };
        let t2 = t1 * t1;
        let t3 = t2 * t1;
        let t4 = t3 * t1;
        let t5 = t4 * t1;

        let a0 = ((-8.0 * v * t1 - 20.0 * x) / t2).max(0.0);
        let a = -(a0 * t2 + 6.0 * v * t1 + 12.0 * x) / (2.0 * t5);
        let b = (3.0 * a0 * t2 + 16.0 * v * t1 + 30.0 * x) / (2.0 * t4);
        let c = -(3.0 * a0 * t2 + 12.0 * v * t1 + 20.0 * x) / (2.0 * t3);

        Self {
            x0,
            v0: v * sign,
            a0: a0 * sign,
            a: a * sign,
            b: b * sign,
            c: c * sign,
            duration: t1,
        }
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.duration <= 0.0
    }

    /// Time at which the residual reaches zero (possibly shorter than asked).
    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    pub fn initial_value(&self) -> f32 {
        self.x0
    }

    #[inline]
    pub fn initial_velocity(&self) -> f32 {
        self.v0
    }

    #[inline]
    pub fn initial_acceleration(&self) -> f32 {
        self.a0
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        if t >= self.duration {
            return 0.0;
        }
        let t = t.max(0.0);
        ((((self.a * t + self.b) * t + self.c) * t + 0.5 * self.a0) * t + self.v0) * t + self.x0
    }

    pub fn velocity(&self, t: f32) -> f32 {
        if t >= self.duration {
            return 0.0;
        }
        let t = t.max(0.0);
        (((5.0 * self.a * t + 4.0 * self.b) * t + 3.0 * self.c) * t + self.a0) * t + self.v0
    }

    pub fn acceleration(&self, t: f32) -> f32 {
        if t >= self.duration {
            return 0.0;
        }
        let t = t.max(0.0);
        ((20.0 * self.a * t + 12.0 * self.b) * t + 6.0 * self.c) * t + self.a0
    }
}

impl Default for ScalarTransition {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Blend state of one scalar channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ChannelBlend {
    /// No residual left.
    #[default]
    Idle,
    Decaying {
        transition: ScalarTransition,
        elapsed: f32,
    },
}

impl ChannelBlend {
    pub fn start(transition: ScalarTransition) -> Self {
        if transition.is_identity() {
            ChannelBlend::Idle
        } else {
            ChannelBlend::Decaying {
                transition,
                elapsed: 0.0,
            }
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, ChannelBlend::Decaying { .. })
    }

    /// Residual at the current elapsed time.
    #[inline]
    pub fn value(&self) -> f32 {
        match self {
            ChannelBlend::Idle => 0.0,
            ChannelBlend::Decaying {
                transition,
                elapsed,
            } => transition.evaluate(*elapsed),
        }
    }

    /// Move the blend forward by `dt` (clamped at the transition's end) and
    /// return the new residual. A finished blend falls back to `Idle`.
    pub fn advance(&mut self, dt: f32) -> f32 {
        if let ChannelBlend::Decaying {
            transition,
            elapsed,
        } = self
        {
            *elapsed = (*elapsed + clamp_step(dt)).min(transition.duration());
            if *elapsed >= transition.duration() {
                *self = ChannelBlend::Idle;
            }
        }
        self.value()
    }
}

/// Residual blend of one joint: three translation channels, plus an angle
/// about a fixed axis for rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointBlend {
    linear: [ChannelBlend; 3],
    axis: Unit<Vector3<f32>>,
    angular: ChannelBlend,
}

impl Default for JointBlend {
    fn default() -> Self {
        Self::idle()
    }
}

impl JointBlend {
    pub fn idle() -> Self {
        Self {
            linear: [ChannelBlend::Idle; 3],
            axis: Vector3::z_axis(),
            angular: ChannelBlend::Idle,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.angular.is_active() || self.linear.iter().any(ChannelBlend::is_active)
    }

    /// Restart the blend so that `target * residual` reproduces `current`.
    ///
    /// `previous_target` is the new target one step of `dt` before `target`;
    /// the residual velocity is the output's velocity relative to it, so the
    /// blended output keeps its velocity across the switch.
    pub fn seed(
        &mut self,
        previous: &AffineTransform,
        current: &AffineTransform,
        previous_target: &AffineTransform,
        target: &AffineTransform,
        dt: f32,
        duration: f32,
    ) {
        let residual = target.inverse_times(current);
        let previous_residual = previous_target.inverse_times(previous);
        let inv_dt = safe_recip(dt);

        for (axis, channel) in self.linear.iter_mut().enumerate() {
            let x0 = residual.t[axis];
            let v0 = (x0 - previous_residual.t[axis]) * inv_dt;
            *channel = ChannelBlend::start(ScalarTransition::new(x0, v0, duration));
        }

        let q0 = positive_hemisphere(&residual.q);
        let imag = q0.imag();
        let sin_half = imag.norm();
        if sin_half <= TRANSITION_EPSILON {
            self.axis = Vector3::z_axis();
            self.angular = ChannelBlend::Idle;
            return;
        }
        self.axis = Unit::new_unchecked(imag / sin_half);
        let angle0 = 2.0 * sin_half.atan2(q0.w);
        let angle_prev = twist_angle(&previous_residual.q, &self.axis);
        let v0 = (angle0 - angle_prev) * inv_dt;
        self.angular = ChannelBlend::start(ScalarTransition::new(angle0, v0, duration));
    }

    /// Current residual without advancing.
    pub fn residual(&self) -> AffineTransform {
        AffineTransform::new(
            Vector3::new(
                self.linear[0].value(),
                self.linear[1].value(),
                self.linear[2].value(),
            ),
            UnitQuaternion::from_axis_angle(&self.axis, self.angular.value()),
        )
    }

    /// Advance every channel by `dt` and return the new residual.
    pub fn advance(&mut self, dt: f32) -> AffineTransform {
        for channel in &mut self.linear {
            channel.advance(dt);
        }
        self.angular.advance(dt);
        self.residual()
    }
}

#[inline]
fn positive_hemisphere(q: &UnitQuaternion<f32>) -> UnitQuaternion<f32> {
    if q.w < 0.0 {
        UnitQuaternion::new_unchecked(-q.into_inner())
    } else {
        *q
    }
}

/// Signed rotation angle of `q` about `axis` (swing is discarded).
fn twist_angle(q: &UnitQuaternion<f32>, axis: &Unit<Vector3<f32>>) -> f32 {
    let q = positive_hemisphere(q);
    2.0 * q.imag().dot(axis.as_ref()).atan2(q.w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn channel_returns_to_idle() {
        let mut ch = ChannelBlend::start(ScalarTransition::new(1.0, 0.0, 0.5));
        assert!(ch.is_active());
        assert_relative_eq!(ch.value(), 1.0);
        ch.advance(0.25);
        assert!(ch.value() > 0.0 && ch.value() < 1.0);
        assert_eq!(ch.advance(10.0), 0.0);
        assert_eq!(ch, ChannelBlend::Idle);
    }

    #[test]
    fn negative_or_nan_step_does_not_rewind() {
        let mut ch = ChannelBlend::start(ScalarTransition::new(1.0, 0.0, 0.5));
        ch.advance(0.1);
        let v = ch.value();
        assert_eq!(ch.advance(-1.0), v);
        assert_eq!(ch.advance(f32::NAN), v);
    }

    #[test]
    fn joint_seed_reproduces_current() {
        let target = AffineTransform::new(
            Vector3::new(0.0, 1.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.2),
        );
        let current = AffineTransform::new(
            Vector3::new(0.3, 0.0, -0.1),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -0.6),
        );
        let mut blend = JointBlend::idle();
        blend.seed(&current, &current, &target, &target, 1.0 / 30.0, 0.5);
        let out = target * blend.residual();
        assert_relative_eq!(out.t, current.t, epsilon = 1e-5);
        assert!(out.q.angle_to(&current.q) < 1e-4);

        for _ in 0..30 {
            blend.advance(1.0 / 30.0);
        }
        assert!(!blend.is_active());
        assert_eq!(blend.residual(), AffineTransform::identity());
    }

    #[test]
    fn residual_velocity_is_relative_to_the_new_target() {
        let step = |x: f32| AffineTransform::from_translation(Vector3::new(x, 0.0, 0.0));
        let mut blend = JointBlend::idle();
        // Output and new target move in lockstep: the offset holds still.
        blend.seed(&step(0.0), &step(0.1), &step(0.5), &step(0.6), 0.1, 0.5);
        match blend.linear[0] {
            ChannelBlend::Decaying { transition, .. } => {
                assert_relative_eq!(transition.initial_value(), -0.5, epsilon = 1e-6);
                assert_relative_eq!(transition.initial_velocity(), 0.0, epsilon = 1e-4);
            }
            ChannelBlend::Idle => panic!("expected an active channel"),
        }
    }

    #[test]
    fn twist_ignores_swing() {
        let axis = Vector3::y_axis();
        let q = UnitQuaternion::from_axis_angle(&axis, 0.4);
        assert_relative_eq!(twist_angle(&q, &axis), 0.4, epsilon = 1e-5);
        let q = UnitQuaternion::from_axis_angle(&axis, -0.4);
        assert_relative_eq!(twist_angle(&q, &axis), -0.4, epsilon = 1e-5);
    }
}
