//! Frame addressing into a segmented pose library.
//!
//! A [`TimeIndex`] names a stored frame, a [`SamplingTime`] adds the sub-frame
//! blend position, and a [`DeltaSamplingTime`] is what advancing a sampling
//! time produces: the new position plus the root correction needed when the
//! advance jumped into a segment that is not spatially contiguous.

use serde::{Deserialize, Serialize};

use crate::transform::AffineTransform;

/// Frame within a segment. A negative segment marks the index invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeIndex {
    pub segment: i16,
    pub frame: i16,
}

impl TimeIndex {
    pub const INVALID: TimeIndex = TimeIndex {
        segment: -1,
        frame: 0,
    };

    #[inline]
    pub const fn new(segment: i16, frame: i16) -> Self {
        Self { segment, frame }
    }

    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.segment >= 0
    }
}

impl Default for TimeIndex {
    fn default() -> Self {
        Self::INVALID
    }
}

/// A frame plus the interpolation weight toward the following frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingTime {
    pub time_index: TimeIndex,
    /// Sub-frame position in `[0, 1]` between `frame` and `frame + 1`.
    pub theta: f32,
}

impl SamplingTime {
    pub const INVALID: SamplingTime = SamplingTime {
        time_index: TimeIndex::INVALID,
        theta: 0.0,
    };

    #[inline]
    pub fn new(time_index: TimeIndex, theta: f32) -> Self {
        let theta = if theta.is_finite() {
            theta.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self { time_index, theta }
    }

    /// Sampling time sitting exactly on a stored frame.
    #[inline]
    pub fn at_frame(segment: i16, frame: i16) -> Self {
        Self::new(TimeIndex::new(segment, frame), 0.0)
    }

    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.time_index.is_valid()
    }

    #[inline]
    pub fn segment(&self) -> i16 {
        self.time_index.segment
    }

    /// Fractional frame position within the segment.
    #[inline]
    pub fn frame_position(&self) -> f32 {
        self.time_index.frame as f32 + self.theta
    }
}

impl Default for SamplingTime {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Result of advancing a [`SamplingTime`] by an elapsed duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeltaSamplingTime {
    pub sampling_time: SamplingTime,
    /// Pose of the entered segment's root space expressed in the exited
    /// segment's root space, accumulated over every crossing of this advance.
    /// Identity when no boundary was crossed.
    pub delta_transform: AffineTransform,
    pub crossed_boundary: bool,
}

impl DeltaSamplingTime {
    /// Advance that stayed inside its segment.
    #[inline]
    pub fn within_segment(sampling_time: SamplingTime) -> Self {
        Self {
            sampling_time,
            delta_transform: AffineTransform::identity(),
            crossed_boundary: false,
        }
    }

    #[inline]
    pub fn crossed(sampling_time: SamplingTime, delta_transform: AffineTransform) -> Self {
        Self {
            sampling_time,
            delta_transform,
            crossed_boundary: true,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.sampling_time.is_valid()
    }

    /// Re-base a root-relative transform across the crossed boundary.
    ///
    /// Consumers holding state in the exited segment's root space must pass it
    /// through here before composing it with samples from the new segment.
    #[inline]
    pub fn correct(&self, transform: &AffineTransform) -> AffineTransform {
        if self.crossed_boundary {
            *transform * self.delta_transform
        } else {
            *transform
        }
    }
}
