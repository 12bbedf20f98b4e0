//! Pose generator: samples the target pose every tick and hides target
//! switches behind an inertial blend.
//!
//! Tick order:
//! 1. sample the library at the requested [`SamplingTime`] into a scratch pose
//! 2. if a transition was armed, re-seed every joint's blend from the last
//!    two outputs, measured against the new target at the same two instants
//! 3. advance the blends by `delta_time`
//! 4. output `target[j] * residual[j]`
//! 5. overwrite the root with the externally driven world root
//!
//! The previous output is kept for one tick so the next seed can estimate
//! velocity.

use crate::derivative::clamp_step;
use crate::error::MotionError;
use crate::library::PoseLibrary;
use crate::pose::PoseBuffer;
use crate::time::SamplingTime;
use crate::transform::AffineTransform;
use crate::transition::JointBlend;

#[derive(Debug, Clone)]
pub struct PoseGenerator {
    current: PoseBuffer,
    previous: PoseBuffer,
    /// Scratch for the sampled target; never reallocated after construction.
    target: PoseBuffer,
    /// New target at the instants of `current` and `previous`, filled on seed.
    seed_target: PoseBuffer,
    seed_previous_target: PoseBuffer,
    blends: Vec<JointBlend>,
    blend_duration: f32,
    transition_pending: bool,
    /// Time step between `previous` and `current`.
    last_delta_time: f32,
}

impl PoseGenerator {
    /// Create a generator resting in `bind_pose` with no active blends.
    pub fn new(bind_pose: PoseBuffer, blend_duration: f32) -> Result<Self, MotionError> {
        if bind_pose.is_empty() {
            return Err(MotionError::EmptyPose);
        }
        if !blend_duration.is_finite() || blend_duration < 0.0 {
            return Err(MotionError::invalid_config(
                "blendDuration",
                format!("must be finite and >= 0, got {blend_duration}"),
            ));
        }
        let joint_count = bind_pose.joint_count();
        Ok(Self {
            previous: bind_pose.clone(),
            target: bind_pose.clone(),
            seed_target: bind_pose.clone(),
            seed_previous_target: bind_pose.clone(),
            current: bind_pose,
            blends: vec![JointBlend::idle(); joint_count],
            blend_duration,
            transition_pending: false,
            last_delta_time: 0.0,
        })
    }

    pub fn from_library<L: PoseLibrary + ?Sized>(
        library: &L,
        blend_duration: f32,
    ) -> Result<Self, MotionError> {
        let bind_pose = library.bind_pose();
        bind_pose.ensure_joint_count(library.joint_count())?;
        Self::new(bind_pose.clone(), blend_duration)
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.current.joint_count()
    }

    #[inline]
    pub fn blend_duration(&self) -> f32 {
        self.blend_duration
    }

    /// Blended local-space pose produced by the last update.
    #[inline]
    pub fn current(&self) -> &PoseBuffer {
        &self.current
    }

    /// Output of the update before the last one.
    #[inline]
    pub fn previous(&self) -> &PoseBuffer {
        &self.previous
    }

    #[inline]
    pub fn is_transition_pending(&self) -> bool {
        self.transition_pending
    }

    /// True while any joint still carries a residual.
    pub fn is_blending(&self) -> bool {
        self.blends.iter().any(JointBlend::is_active)
    }

    /// Arm a transition: the next [`update`](Self::update) re-seeds every
    /// joint's blend from the current output toward the new target.
    ///
    /// Blends still in flight are not cut; their residual is part of the
    /// current output the new blend starts from.
    pub fn trigger_transition(&mut self) {
        if !self.transition_pending {
            log::debug!(
                "pose generator: transition armed ({} joints, {}s blend)",
                self.joint_count(),
                self.blend_duration
            );
        }
        self.transition_pending = true;
    }

    /// Re-base the root of both held poses across a segment boundary.
    pub fn apply_root_delta(&mut self, delta: &AffineTransform) {
        let current = *self.current.root() * *delta;
        self.current.set_root(current);
        let previous = *self.previous.root() * *delta;
        self.previous.set_root(previous);
    }

    /// `library` must share this generator's skeleton.
    pub fn update<L: PoseLibrary + ?Sized>(
        &mut self,
        library: &L,
        world_root: AffineTransform,
        sampling_time: SamplingTime,
        delta_time: f32,
    ) {
        debug_assert_eq!(
            library.joint_count(),
            self.joint_count(),
            "pose library joint count differs from the generator's"
        );
        library.sample_pose_at(sampling_time, &mut self.target);

        if self.transition_pending {
            self.transition_pending = false;
            self.seed_blends(library, sampling_time, delta_time);
        }

        self.previous.copy_from(&self.current);
        for joint in 1..self.current.joint_count() {
            let residual = self.blends[joint].advance(delta_time);
            self.current[joint] = self.target[joint] * residual;
        }
        self.current.set_root(world_root);
        self.last_delta_time = clamp_step(delta_time);
    }

    /// `current` was output one `delta_time` before `sampling_time`, and
    /// `previous` one `last_delta_time` before that.
    fn seed_blends<L: PoseLibrary + ?Sized>(
        &mut self,
        library: &L,
        sampling_time: SamplingTime,
        delta_time: f32,
    ) {
        let step = clamp_step(delta_time);
        let at_current = library.advance(sampling_time, -step).sampling_time;
        library.sample_pose_at(at_current, &mut self.seed_target);
        let at_previous = library
            .advance(sampling_time, -(step + self.last_delta_time))
            .sampling_time;
        library.sample_pose_at(at_previous, &mut self.seed_previous_target);

        log::debug!(
            "pose generator: seeding {} joint blends over {}s",
            self.joint_count() - 1,
            self.blend_duration
        );
        // The root is driven externally and never blended.
        self.blends[0] = JointBlend::idle();
        for joint in 1..self.current.joint_count() {
            self.blends[joint].seed(
                &self.previous[joint],
                &self.current[joint],
                &self.seed_previous_target[joint],
                &self.seed_target[joint],
                self.last_delta_time,
                self.blend_duration,
            );
        }
    }
}
