//! Rolling root trajectory around the present.
//!
//! `trajectory` holds `2 * half + 1` root-relative samples at a fixed rate:
//! indices `[0, half)` are the past, `half` is the present and `(half, N)` the
//! predicted future. The past is rebuilt every tick from a delta-space
//! history (root poses in an arbitrary, stable frame paired with the tick
//! durations that produced them), so variable tick lengths still land on the
//! fixed sample grid.

use nalgebra::Vector3;

use crate::derivative::{angular_velocity, safe_recip, TIME_EPSILON};
use crate::error::MotionError;
use crate::transform::AffineTransform;

/// Largest number of samples on one side of the present.
pub const MAX_HALF_LENGTH: usize = 1 << 16;

/// Samples on one side of the present for `time_horizon` seconds at
/// `sample_rate` Hz.
pub(crate) fn half_length_for(
    time_horizon: f32,
    sample_rate: f32,
) -> Result<usize, MotionError> {
    if !time_horizon.is_finite() || time_horizon <= 0.0 {
        return Err(MotionError::invalid_config(
            "timeHorizon",
            format!("must be finite and > 0, got {time_horizon}"),
        ));
    }
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(MotionError::invalid_config(
            "sampleRate",
            format!("must be finite and > 0, got {sample_rate}"),
        ));
    }
    let samples = (time_horizon * sample_rate).round();
    if samples > MAX_HALF_LENGTH as f32 {
        return Err(MotionError::invalid_config(
            "timeHorizon",
            format!(
                "{time_horizon}s at {sample_rate} Hz needs {samples} samples per side, \
                 at most {MAX_HALF_LENGTH} are supported"
            ),
        ));
    }
    if samples < 1.0 {
        return Err(MotionError::invalid_config(
            "timeHorizon",
            format!("{time_horizon}s at {sample_rate} Hz covers no samples"),
        ));
    }
    Ok(samples as usize)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DeltaSample {
    transform: AffineTransform,
    /// Seconds between this entry and the one before it.
    delta_time: f32,
}

/// Root trajectory of one character.
///
/// The delta-space history keeps `2 * N` ticks. With ticks shorter than half
/// the sample period it spans less than the time horizon, and the oldest past
/// samples repeat the oldest recorded pose; [`recorded_span`] reports the
/// seconds actually covered.
///
/// [`recorded_span`]: TrajectoryModel::recorded_span
#[derive(Debug, Clone)]
pub struct TrajectoryModel {
    trajectory: Vec<AffineTransform>,
    /// Ring buffer; `head` is the newest entry.
    delta_space: Vec<DeltaSample>,
    head: usize,
    half_length: usize,
    sample_rate: f32,
    time_horizon: f32,
    world_root: AffineTransform,
    short_ticks_reported: bool,
}

impl TrajectoryModel {
    pub fn new(time_horizon: f32, sample_rate: f32) -> Result<Self, MotionError> {
        let half_length = half_length_for(time_horizon, sample_rate)?;
        let length = 2 * half_length + 1;
        // Twice the trajectory length covers the horizon for ticks down to
        // half the sample period; shorter ticks clamp to the oldest entry.
        let seed = DeltaSample {
            transform: AffineTransform::identity(),
            delta_time: sample_rate.recip(),
        };
        Ok(Self {
            trajectory: vec![AffineTransform::identity(); length],
            delta_space: vec![seed; 2 * length],
            head: 0,
            half_length,
            sample_rate,
            time_horizon,
            world_root: AffineTransform::identity(),
            short_ticks_reported: false,
        })
    }

    #[inline]
    pub fn trajectory(&self) -> &[AffineTransform] {
        &self.trajectory
    }

    #[inline]
    pub fn trajectory_mut(&mut self) -> &mut [AffineTransform] {
        &mut self.trajectory
    }

    /// The present sample and everything after it.
    #[inline]
    pub fn future_mut(&mut self) -> &mut [AffineTransform] {
        &mut self.trajectory[self.half_length..]
    }

    #[inline]
    pub fn half_length(&self) -> usize {
        self.half_length
    }

    #[inline]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    #[inline]
    pub fn time_horizon(&self) -> f32 {
        self.time_horizon
    }

    #[inline]
    pub fn world_root_transform(&self) -> &AffineTransform {
        &self.world_root
    }

    /// Record one tick: the root moved by `delta` (in the previous root's
    /// space) over `delta_time` seconds and now sits at `world_root`.
    pub fn update(
        &mut self,
        world_root: AffineTransform,
        delta: AffineTransform,
        delta_time: f32,
    ) {
        self.world_root = world_root;

        let inverse = delta.inverse();
        for sample in &mut self.trajectory[self.half_length..] {
            *sample = inverse * *sample;
        }

        let head = self.delta_space[self.head].transform * delta;
        if delta_time.is_finite() && delta_time > TIME_EPSILON {
            self.report_short_tick(delta_time);
            self.head = (self.head + 1) % self.delta_space.len();
            self.delta_space[self.head] = DeltaSample {
                transform: head,
                delta_time,
            };
        } else {
            log::trace!("trajectory: coalescing {delta_time}s tick into the history head");
            self.delta_space[self.head].transform = head;
        }

        self.rebuild_past();
    }

    /// Re-project history after the root was moved by `root_delta` outside of
    /// a simulated tick, so past samples keep their world positions.
    pub fn keep_past_trajectory_in_world_space(&mut self, root_delta: AffineTransform) {
        let inverse = root_delta.inverse();
        for sample in &mut self.trajectory[..self.half_length] {
            *sample = inverse * *sample;
        }
        let head = &mut self.delta_space[self.head].transform;
        *head = *head * root_delta;
        self.world_root = self.world_root * root_delta;
    }

    /// Root-relative root transform `t` seconds from now (negative is the
    /// past), interpolated between samples and clamped to the horizon.
    pub fn root_transform_at(&self, t: f32) -> AffineTransform {
        let last = self.trajectory.len() - 1;
        let position = if t.is_finite() {
            (self.half_length as f32 + t * self.sample_rate).clamp(0.0, last as f32)
        } else {
            self.half_length as f32
        };
        let i0 = (position.floor() as usize).min(last);
        let i1 = (i0 + 1).min(last);
        let w = position - i0 as f32;
        AffineTransform::interpolate(&self.trajectory[i0], &self.trajectory[i1], w)
    }

    /// World-space root transform `t` seconds from now.
    pub fn world_transform_at(&self, t: f32) -> AffineTransform {
        self.world_root * self.root_transform_at(t)
    }

    /// Average root-space velocity over `[t - window/2, t + window/2]`.
    pub fn root_velocity(&self, t: f32, window: f32) -> Vector3<f32> {
        match self.window_ends(t, window) {
            Some((a, b, span)) => (b.t - a.t) * safe_recip(span),
            None => Vector3::zeros(),
        }
    }

    /// Average angular velocity (axis times radians per second) over the same
    /// window as [`root_velocity`](Self::root_velocity).
    pub fn root_angular_velocity(&self, t: f32, window: f32) -> Vector3<f32> {
        match self.window_ends(t, window) {
            Some((a, b, span)) => angular_velocity(&b, &a, span),
            None => Vector3::zeros(),
        }
    }

    /// Seconds of history held by the delta-space ring, oldest entry to head.
    pub fn recorded_span(&self) -> f32 {
        let capacity = self.delta_space.len();
        let oldest = (self.head + 1) % capacity;
        self.delta_space
            .iter()
            .enumerate()
            .filter(|&(index, _)| index != oldest)
            .map(|(_, entry)| entry.delta_time)
            .sum()
    }

    /// Root-space velocity over the most recent sample interval.
    pub fn current_velocity(&self) -> Vector3<f32> {
        let previous = &self.trajectory[self.half_length - 1];
        -previous.t * self.sample_rate
    }

    fn window_ends(
        &self,
        t: f32,
        window: f32,
    ) -> Option<(AffineTransform, AffineTransform, f32)> {
        if !window.is_finite() || window <= TIME_EPSILON || !t.is_finite() {
            return None;
        }
        let reach = self.half_length as f32 / self.sample_rate;
        let t0 = (t - 0.5 * window).clamp(-reach, reach);
        let t1 = (t + 0.5 * window).clamp(-reach, reach);
        Some((self.root_transform_at(t0), self.root_transform_at(t1), t1 - t0))
    }

    fn report_short_tick(&mut self, delta_time: f32) {
        let span = delta_time * (self.delta_space.len() - 1) as f32;
        if !self.short_ticks_reported && span < self.time_horizon {
            self.short_ticks_reported = true;
            log::debug!(
                "trajectory: {delta_time}s ticks keep {span}s of history, \
                 less than the {}s horizon",
                self.time_horizon
            );
        }
    }

    /// Resample the delta-space history onto the past half of the grid.
    fn rebuild_past(&mut self) {
        let capacity = self.delta_space.len();
        let head = self.delta_space[self.head].transform;

        // Walk back from the head once; sample ages only grow.
        let mut newer = self.head;
        let mut newer_age = 0.0_f32;
        let mut walked = 0;
        for i in (0..self.half_length).rev() {
            let age = (self.half_length - i) as f32 / self.sample_rate;
            let sample = loop {
                let entry = self.delta_space[newer];
                let older = (newer + capacity - 1) % capacity;
                if walked + 1 >= capacity {
                    break entry.transform;
                }
                let older_age = newer_age + entry.delta_time;
                if age <= older_age {
                    let w = (age - newer_age) * safe_recip(entry.delta_time);
                    break AffineTransform::interpolate(
                        &entry.transform,
                        &self.delta_space[older].transform,
                        w.clamp(0.0, 1.0),
                    );
                }
                newer = older;
                newer_age = older_age;
                walked += 1;
            };
            self.trajectory[i] = head.inverse_times(&sample);
        }
    }
}
