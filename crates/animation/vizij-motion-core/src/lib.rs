//! Vizij Motion Core (engine-agnostic)
//!
//! Real-time motion synthesis for one character at a time: inertial blending
//! between sampled library poses, a rolling root trajectory around the present,
//! and prediction of the future half of that trajectory. Pose data comes from a
//! [`PoseLibrary`]; this crate never builds or searches it.
//!
//! Every per-tick operation is synchronous and allocation-free once a
//! character's buffers exist.

pub mod config;
pub mod derivative;
pub mod error;
pub mod generator;
pub mod library;
pub mod pose;
pub mod prediction;
pub mod smoothing;
pub mod synthesizer;
pub mod time;
pub mod trajectory;
pub mod transform;
pub mod transition;

// Re-exports for hosts
pub use config::MotionConfig;
pub use error::MotionError;
pub use generator::PoseGenerator;
pub use library::{MemoryPoseLibrary, PoseLibrary, Segment, SegmentLink};
pub use pose::PoseBuffer;
pub use prediction::TrajectoryPrediction;
pub use smoothing::{SmoothValue, SmoothValue3};
pub use synthesizer::MotionSynthesizer;
pub use time::{DeltaSamplingTime, SamplingTime, TimeIndex};
pub use trajectory::TrajectoryModel;
pub use transform::AffineTransform;
pub use transition::{ChannelBlend, JointBlend, ScalarTransition};

pub type Result<T> = core::result::Result<T, MotionError>;
