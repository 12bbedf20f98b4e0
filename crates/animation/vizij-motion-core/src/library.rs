//! Pose library boundary.
//!
//! The core never owns animation data. It talks to a [`PoseLibrary`] that
//! samples poses at a [`SamplingTime`] and knows how segments connect.
//! [`MemoryPoseLibrary`] is a small in-memory implementation used by tests,
//! benches and simple hosts.

use serde::{Deserialize, Serialize};

use crate::error::MotionError;
use crate::pose::PoseBuffer;
use crate::time::{DeltaSamplingTime, SamplingTime, TimeIndex};
use crate::transform::AffineTransform;

/// Source of sampled poses for one skeleton.
pub trait PoseLibrary {
    fn joint_count(&self) -> usize;

    fn bind_pose(&self) -> &PoseBuffer;

    /// Stored frames per second.
    fn sample_rate(&self) -> f32;

    /// Write the pose at `time` into `out`, which is sized to `joint_count`.
    /// An invalid `time` is a caller error; the written pose is unspecified.
    fn sample_pose_at(&self, time: SamplingTime, out: &mut PoseBuffer);

    /// Root joint at `time`, in the root space of `time`'s segment.
    fn root_transform_at(&self, time: SamplingTime) -> AffineTransform;

    /// Move `time` by `delta_time` seconds (negative plays backwards),
    /// following segment continuations where they exist.
    fn advance(&self, time: SamplingTime, delta_time: f32) -> DeltaSamplingTime;

    /// Root displacement from `from` to the end of an advance, bridging any
    /// crossed boundary with its delta transform.
    fn root_motion(&self, from: SamplingTime, to: &DeltaSamplingTime) -> AffineTransform {
        let start = self.root_transform_at(from);
        let end = to.delta_transform * self.root_transform_at(to.sampling_time);
        start.inverse_times(&end)
    }
}

/// Continuation from the end of one segment into another.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentLink {
    pub segment: i16,
    /// Root space of `segment` expressed in the linking segment's root space.
    /// The linking segment's last frame and `segment`'s first frame are the
    /// same instant.
    pub delta_transform: AffineTransform,
}

/// Contiguous run of frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub frames: Vec<PoseBuffer>,
    #[serde(default)]
    pub next: Option<SegmentLink>,
}

impl Segment {
    #[inline]
    fn last_frame(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }
}

/// Segment boundaries one [`PoseLibrary::advance`] call may cross.
pub const MAX_CROSSINGS: usize = 1024;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibraryRepr {
    sample_rate: f32,
    bind_pose: PoseBuffer,
    segments: Vec<Segment>,
}

/// In-memory pose library.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryPoseLibrary {
    sample_rate: f32,
    bind_pose: PoseBuffer,
    segments: Vec<Segment>,
    /// Inverse of the `next` links, indexed by the entered segment.
    #[serde(skip)]
    previous: Vec<Option<SegmentLink>>,
}

impl MemoryPoseLibrary {
    pub fn new(
        sample_rate: f32,
        bind_pose: PoseBuffer,
        segments: Vec<Segment>,
    ) -> Result<Self, MotionError> {
        validate(sample_rate, &bind_pose, &segments)?;

        let mut previous: Vec<Option<SegmentLink>> = vec![None; segments.len()];
        for (index, segment) in segments.iter().enumerate() {
            if let Some(link) = segment.next {
                let slot = &mut previous[link.segment as usize];
                if slot.is_none() {
                    *slot = Some(SegmentLink {
                        segment: index as i16,
                        delta_transform: link.delta_transform.inverse(),
                    });
                } else {
                    log::debug!(
                        "segment {} has several entries; backward play follows the first",
                        link.segment
                    );
                }
            }
        }

        log::debug!(
            "pose library: {} joints, {} segments at {} Hz",
            bind_pose.joint_count(),
            segments.len(),
            sample_rate
        );
        Ok(Self {
            sample_rate,
            bind_pose,
            segments,
            previous,
        })
    }

    /// Parse and validate a library from JSON
    /// (`{ sampleRate, bindPose, segments: [{ frames, next? }] }`).
    pub fn from_json(s: &str) -> Result<Self, MotionError> {
        let repr: LibraryRepr = serde_json::from_str(s)?;
        Self::new(repr.sample_rate, repr.bind_pose, repr.segments)
    }

    pub fn to_json(&self) -> Result<String, MotionError> {
        Ok(serde_json::to_string(self)?)
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segment(&self, segment: i16) -> Option<&Segment> {
        if segment < 0 {
            return None;
        }
        self.segments.get(segment as usize)
    }

    /// Segment length in seconds.
    pub fn segment_duration(&self, segment: i16) -> Option<f32> {
        self.segment(segment)
            .map(|seg| seg.last_frame() as f32 / self.sample_rate)
    }

    /// Check that `min_frames` frames are available from `time_index` to the
    /// end of its segment.
    pub fn check_window(
        &self,
        time_index: TimeIndex,
        min_frames: usize,
    ) -> Result<(), MotionError> {
        let segment = self
            .segment(time_index.segment)
            .ok_or(MotionError::InvalidSegment {
                segment: time_index.segment,
            })?;
        let start = (time_index.frame.max(0) as usize).min(segment.frames.len());
        let available = segment.frames.len() - start;
        if available < min_frames {
            return Err(MotionError::SegmentTooShort {
                segment: time_index.segment,
                frames: available,
                required: min_frames,
            });
        }
        Ok(())
    }

    /// Bracketing frames and weight for `time`, or `None` when invalid.
    fn bracket(&self, time: SamplingTime) -> Option<(&PoseBuffer, &PoseBuffer, f32)> {
        let segment = self.segment(time.segment())?;
        let last = segment.last_frame();
        let f0 = (time.time_index.frame.max(0) as usize).min(last);
        let f1 = (f0 + 1).min(last);
        Some((&segment.frames[f0], &segment.frames[f1], time.theta))
    }

    fn sampling_time_at(&self, segment: i16, position: f32) -> SamplingTime {
        let last = self
            .segment(segment)
            .map(Segment::last_frame)
            .unwrap_or(0);
        let position = position.clamp(0.0, last as f32);
        let frame = (position.floor() as usize).min(last);
        let theta = if frame == last {
            0.0
        } else {
            position - frame as f32
        };
        SamplingTime::new(TimeIndex::new(segment, frame as i16), theta)
    }
}

fn validate(
    sample_rate: f32,
    bind_pose: &PoseBuffer,
    segments: &[Segment],
) -> Result<(), MotionError> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(MotionError::invalid_config(
            "sampleRate",
            format!("must be finite and > 0, got {sample_rate}"),
        ));
    }
    if bind_pose.is_empty() {
        return Err(MotionError::EmptyPose);
    }
    if segments.len() > i16::MAX as usize {
        return Err(MotionError::InvalidSegment { segment: i16::MAX });
    }
    let joint_count = bind_pose.joint_count();
    for (index, segment) in segments.iter().enumerate() {
        let id = index as i16;
        if segment.frames.is_empty() || segment.frames.len() > i16::MAX as usize {
            return Err(MotionError::InvalidSegment { segment: id });
        }
        for frame in &segment.frames {
            frame.ensure_joint_count(joint_count)?;
        }
        if let Some(link) = segment.next {
            if link.segment < 0 || link.segment as usize >= segments.len() {
                return Err(MotionError::InvalidLink {
                    segment: id,
                    target: link.segment,
                });
            }
        }
    }
    Ok(())
}

impl PoseLibrary for MemoryPoseLibrary {
    fn joint_count(&self) -> usize {
        self.bind_pose.joint_count()
    }

    fn bind_pose(&self) -> &PoseBuffer {
        &self.bind_pose
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn sample_pose_at(&self, time: SamplingTime, out: &mut PoseBuffer) {
        match self.bracket(time) {
            Some((a, _, theta)) if theta <= 0.0 => out.copy_from(a),
            Some((a, b, theta)) => out.interpolate_into(a, b, theta),
            None => out.copy_from(&self.bind_pose),
        }
    }

    fn root_transform_at(&self, time: SamplingTime) -> AffineTransform {
        match self.bracket(time) {
            Some((a, b, theta)) => AffineTransform::interpolate(a.root(), b.root(), theta),
            None => AffineTransform::identity(),
        }
    }

    fn advance(&self, time: SamplingTime, delta_time: f32) -> DeltaSamplingTime {
        let Some(mut segment) = self.segment(time.segment()) else {
            return DeltaSamplingTime::within_segment(time);
        };
        let mut id = time.segment();
        let step = if delta_time.is_finite() {
            delta_time * self.sample_rate
        } else {
            0.0
        };
        let mut position = time.frame_position() + step;
        let mut delta = AffineTransform::identity();
        let mut crossed = false;

        // A cycle of single-frame segments consumes no time, and a huge step
        // outgrows f32 precision so `position` stops shrinking. Past the cap
        // the position is clamped into the segment reached.
        for crossing in 0..=MAX_CROSSINGS {
            let last = segment.last_frame() as f32;
            let link = if position > last {
                segment.next
            } else if position < 0.0 {
                self.previous[id as usize]
            } else {
                break;
            };
            let Some(link) = link else {
                log::trace!("segment {id} has no continuation; clamping at its end");
                break;
            };
            if crossing == MAX_CROSSINGS {
                log::debug!(
                    "advance of {delta_time}s crossed {MAX_CROSSINGS} segment boundaries; \
                     clamping in segment {id}"
                );
                break;
            }

            let entered = &self.segments[link.segment as usize];
            if position > last {
                position -= last;
            } else {
                position += entered.last_frame() as f32;
            }
            log::trace!("crossed from segment {id} into segment {}", link.segment);
            delta *= link.delta_transform;
            crossed = true;
            id = link.segment;
            segment = entered;
        }

        let sampling_time = self.sampling_time_at(id, position);
        if crossed {
            DeltaSamplingTime::crossed(sampling_time, delta)
        } else {
            DeltaSamplingTime::within_segment(sampling_time)
        }
    }
}
