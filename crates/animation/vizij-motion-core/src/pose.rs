//! Joint-indexed local-space pose buffers.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::error::MotionError;
use crate::transform::AffineTransform;

/// One full-body pose: joint 0 is the root, every other joint is expressed
/// relative to its parent. The length is fixed for the lifetime of a
/// character.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseBuffer {
    joints: Vec<AffineTransform>,
}

impl PoseBuffer {
    /// Pose of `joint_count` identity transforms.
    pub fn identity(joint_count: usize) -> Self {
        Self {
            joints: vec![AffineTransform::identity(); joint_count],
        }
    }

    pub fn from_joints(joints: Vec<AffineTransform>) -> Self {
        Self { joints }
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    #[inline]
    pub fn root(&self) -> &AffineTransform {
        &self.joints[0]
    }

    #[inline]
    pub fn set_root(&mut self, root: AffineTransform) {
        self.joints[0] = root;
    }

    #[inline]
    pub fn joints(&self) -> &[AffineTransform] {
        &self.joints
    }

    #[inline]
    pub fn joints_mut(&mut self) -> &mut [AffineTransform] {
        &mut self.joints
    }

    pub fn iter(&self) -> impl Iterator<Item = &AffineTransform> {
        self.joints.iter()
    }

    /// Overwrite this pose with `other` without reallocating.
    ///
    /// Panics if the joint counts differ, which would mean two skeletons got
    /// mixed up inside one character.
    #[inline]
    pub fn copy_from(&mut self, other: &PoseBuffer) {
        self.joints.copy_from_slice(&other.joints);
    }

    /// Write the per-joint interpolation of `a` and `b` into `self`.
    pub fn interpolate_into(&mut self, a: &PoseBuffer, b: &PoseBuffer, w: f32) {
        for ((out, ja), jb) in self.joints.iter_mut().zip(a.iter()).zip(b.iter()) {
            *out = AffineTransform::interpolate(ja, jb, w);
        }
    }

    pub fn ensure_joint_count(&self, expected: usize) -> Result<(), MotionError> {
        if self.joints.len() != expected {
            return Err(MotionError::JointCountMismatch {
                expected,
                actual: self.joints.len(),
            });
        }
        Ok(())
    }
}

impl Index<usize> for PoseBuffer {
    type Output = AffineTransform;

    #[inline]
    fn index(&self, joint: usize) -> &AffineTransform {
        &self.joints[joint]
    }
}

impl IndexMut<usize> for PoseBuffer {
    #[inline]
    fn index_mut(&mut self, joint: usize) -> &mut AffineTransform {
        &mut self.joints[joint]
    }
}
