//! Error types for the motion core.
//!
//! Only construction and loading paths return errors. The per-tick operations
//! (pose blending, trajectory updates, prediction) resolve degenerate input
//! locally and never fail.

use serde::{Deserialize, Serialize};

/// Errors raised while configuring a character or loading a pose library.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MotionError {
    /// A configuration value is out of its accepted range
    #[error("Invalid config '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    /// A pose buffer does not match the skeleton's joint count
    #[error("Joint count mismatch: expected {expected}, got {actual}")]
    JointCountMismatch { expected: usize, actual: usize },

    /// A pose with zero joints (the root joint is mandatory)
    #[error("Pose must contain at least the root joint")]
    EmptyPose,

    /// A segment index that does not exist or holds no frames
    #[error("Invalid segment: {segment}")]
    InvalidSegment { segment: i16 },

    /// A matched segment cannot provide the requested frame window
    #[error("Segment {segment} has {frames} frames but {required} are required")]
    SegmentTooShort {
        segment: i16,
        frames: usize,
        required: usize,
    },

    /// A continuation link points at a missing segment
    #[error("Segment {segment} links to missing segment {target}")]
    InvalidLink { segment: i16, target: i16 },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl MotionError {
    pub(crate) fn invalid_config(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "config",
            Self::JointCountMismatch { .. } | Self::EmptyPose => "pose",
            Self::InvalidSegment { .. }
            | Self::SegmentTooShort { .. }
            | Self::InvalidLink { .. } => "library",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for MotionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
