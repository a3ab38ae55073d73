//! Crop plan handed to the video compositor.
//!
//! A plan is an ordered list of segments whose `[start_time, end_time)`
//! ranges partition the clip duration. Each segment carries one pane
//! (center composition) or two stacked panes (split composition).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::timeline::CompositionMode;

/// Tolerance used when comparing segment boundaries.
const TIME_EPSILON: f64 = 1e-9;

/// Crop offset held over a time range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OffsetKeyframe {
    /// Range start in seconds (inclusive)
    pub start: f64,
    /// Range end in seconds (exclusive)
    pub end: f64,
    /// Left edge of the crop window in scaled-source pixels
    pub offset: f64,
}

/// Horizontal crop offset of a pane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HorizontalOffset {
    /// Same offset for the whole segment
    Constant { offset: f64 },
    /// Step function over time, one keyframe per timeline entry
    Keyframed { keyframes: Vec<OffsetKeyframe> },
}

impl HorizontalOffset {
    pub fn is_constant(&self) -> bool {
        matches!(self, HorizontalOffset::Constant { .. })
    }

    /// Offset in effect at time `t`.
    ///
    /// Keyframed offsets hold the last keyframe's value at and after its end.
    pub fn offset_at(&self, t: f64) -> Option<f64> {
        match self {
            HorizontalOffset::Constant { offset } => Some(*offset),
            HorizontalOffset::Keyframed { keyframes } => keyframes
                .iter()
                .find(|k| t >= k.start && t < k.end)
                .or_else(|| keyframes.last().filter(|k| t >= k.end))
                .map(|k| k.offset),
        }
    }
}

/// Where a pane lands in the output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaneSlot {
    /// Whole output frame (center composition)
    Full,
    /// Upper half (split composition, left subject)
    Top,
    /// Lower half (split composition, right subject)
    Bottom,
}

/// Crop window of one pane within the scaled source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PaneTransform {
    pub slot: PaneSlot,
    /// Crop width in scaled-source pixels
    pub crop_width: u32,
    /// Crop height in scaled-source pixels
    pub crop_height: u32,
    /// Top edge of the crop window in scaled-source pixels
    pub crop_y: u32,
    /// Left edge of the crop window over time
    pub offset: HorizontalOffset,
}

/// One time-bounded segment of the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentPlan {
    /// Segment start in seconds (inclusive)
    pub start_time: f64,
    /// Segment end in seconds (exclusive)
    pub end_time: f64,
    pub mode: CompositionMode,
    /// One pane for center segments, top then bottom for split segments
    pub panes: Vec<PaneTransform>,
}

impl SegmentPlan {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Ordered, time-partitioned composition instructions for one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CropPlan {
    pub source_width: u32,
    pub source_height: u32,
    /// Source width after scaling to the output height
    pub scaled_width: u32,
    /// Source height after scaling (equals the output height)
    pub scaled_height: u32,
    pub output_width: u32,
    pub output_height: u32,
    /// Clip duration in seconds
    pub duration: f64,
    pub segments: Vec<SegmentPlan>,
}

impl CropPlan {
    /// True when no concatenation is needed.
    pub fn is_single_segment(&self) -> bool {
        self.segments.len() == 1
    }

    /// Segment active at time `t`.
    pub fn segment_at(&self, t: f64) -> Option<&SegmentPlan> {
        self.segments
            .iter()
            .find(|s| t >= s.start_time && t < s.end_time)
    }

    /// Check that segment ranges cover `[0, duration)` with no gap or overlap.
    pub fn is_time_partition(&self) -> bool {
        let Some(first) = self.segments.first() else {
            return false;
        };
        if first.start_time.abs() > TIME_EPSILON {
            return false;
        }
        let contiguous = self
            .segments
            .windows(2)
            .all(|w| (w[0].end_time - w[1].start_time).abs() <= TIME_EPSILON);
        let ordered = self.segments.iter().all(|s| s.end_time >= s.start_time);
        let closes = self
            .segments
            .last()
            .is_some_and(|s| (s.end_time - self.duration).abs() <= TIME_EPSILON);
        contiguous && ordered && closes
    }
}
