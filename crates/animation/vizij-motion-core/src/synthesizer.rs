//! Per-character wiring of the tick: advance the sampling time through the
//! library, turn the advance into root motion, then drive the pose generator
//! and the trajectory model from it.

use nalgebra::{UnitQuaternion, Vector3};

use crate::config::MotionConfig;
use crate::error::MotionError;
use crate::generator::PoseGenerator;
use crate::library::PoseLibrary;
use crate::pose::PoseBuffer;
use crate::prediction::TrajectoryPrediction;
use crate::time::SamplingTime;
use crate::trajectory::TrajectoryModel;
use crate::transform::AffineTransform;

#[derive(Debug, Clone)]
pub struct MotionSynthesizer {
    config: MotionConfig,
    generator: PoseGenerator,
    trajectory: TrajectoryModel,
    sampling_time: SamplingTime,
    world_root: AffineTransform,
}

impl MotionSynthesizer {
    /// Buffers are sized once here from `config` and the library skeleton.
    /// No sampling time is selected until [`push`](Self::push).
    pub fn new<L: PoseLibrary + ?Sized>(
        library: &L,
        config: &MotionConfig,
        world_root: AffineTransform,
    ) -> Result<Self, MotionError> {
        config.validate()?;
        let generator = PoseGenerator::from_library(library, config.blend_duration)?;
        let mut trajectory = TrajectoryModel::new(config.time_horizon, config.sample_rate)?;
        trajectory.update(world_root, AffineTransform::identity(), 0.0);
        log::debug!(
            "motion synthesizer: {} joints, {} trajectory samples",
            generator.joint_count(),
            trajectory.trajectory().len()
        );
        Ok(Self {
            config: config.clone(),
            generator,
            trajectory,
            sampling_time: SamplingTime::INVALID,
            world_root,
        })
    }

    #[inline]
    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Blended local-space pose; joint 0 is the world root.
    #[inline]
    pub fn pose(&self) -> &PoseBuffer {
        self.generator.current()
    }

    #[inline]
    pub fn generator(&self) -> &PoseGenerator {
        &self.generator
    }

    #[inline]
    pub fn trajectory(&self) -> &TrajectoryModel {
        &self.trajectory
    }

    #[inline]
    pub fn world_root_transform(&self) -> &AffineTransform {
        &self.world_root
    }

    #[inline]
    pub fn sampling_time(&self) -> SamplingTime {
        self.sampling_time
    }

    /// Root-space velocity from recorded history.
    #[inline]
    pub fn current_velocity(&self) -> Vector3<f32> {
        self.trajectory.current_velocity()
    }

    #[inline]
    pub fn is_blending(&self) -> bool {
        self.generator.is_blending()
    }

    /// Continue playback from `sampling_time`, blending into it on the next
    /// update.
    pub fn push(&mut self, sampling_time: SamplingTime) {
        self.sampling_time = sampling_time;
        self.generator.trigger_transition();
    }

    /// Place the root at `world_root` without simulating motion; recorded
    /// history keeps its world placement.
    pub fn teleport(&mut self, world_root: AffineTransform) {
        let root_delta = self.world_root.inverse_times(&world_root);
        self.trajectory.keep_past_trajectory_in_world_space(root_delta);
        self.world_root = world_root;
    }

    /// Rewrite the future half of the trajectory toward world-space goals.
    /// Returns the number of predicted samples.
    pub fn predict(
        &mut self,
        desired_velocity: Vector3<f32>,
        desired_rotation: UnitQuaternion<f32>,
    ) -> usize {
        let current_velocity = self.trajectory.current_velocity();
        let sample_rate = self.trajectory.sample_rate();
        TrajectoryPrediction::new(
            &self.world_root,
            desired_velocity,
            desired_rotation,
            self.trajectory.trajectory_mut(),
            self.config.velocity_factor,
            self.config.rotation_factor,
            current_velocity,
            sample_rate,
        )
        .generate()
    }

    pub fn update<L: PoseLibrary + ?Sized>(&mut self, library: &L, delta_time: f32) {
        if !self.sampling_time.is_valid() {
            log::trace!("motion synthesizer: no sampling time selected; holding pose");
            self.trajectory
                .update(self.world_root, AffineTransform::identity(), delta_time);
            return;
        }

        let advanced = library.advance(self.sampling_time, delta_time);
        let root_delta = library.root_motion(self.sampling_time, &advanced);
        self.sampling_time = advanced.sampling_time;
        self.world_root *= root_delta;

        self.generator
            .update(library, self.world_root, self.sampling_time, delta_time);
        self.trajectory.update(self.world_root, root_delta, delta_time);
    }
}
