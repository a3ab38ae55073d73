//! Per-frame composition timeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::{BoundingBox, Point};

/// How a sampled frame should be composed in the vertical output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum CompositionMode {
    /// Single subject, one full-height pane
    #[default]
    Center,
    /// Two subjects, two stacked panes
    Split,
}

impl CompositionMode {
    /// Number of output panes this mode renders.
    pub fn pane_count(&self) -> usize {
        match self {
            CompositionMode::Center => 1,
            CompositionMode::Split => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompositionMode::Center => "center",
            CompositionMode::Split => "split",
        }
    }
}

impl fmt::Display for CompositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the subject position of a timeline entry was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStatus {
    /// A real detection supported this frame
    Detected,
    /// The tracker carried a previous detection forward
    Interpolated,
    /// Nothing is known about the subject
    NoDetection,
    /// A position exists but its confidence is below threshold
    LowConfidence,
}

impl DetectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionStatus::Detected => "detected",
            DetectionStatus::Interpolated => "interpolated",
            DetectionStatus::NoDetection => "no_detection",
            DetectionStatus::LowConfidence => "low_confidence",
        }
    }
}

impl fmt::Display for DetectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sampled time point of a video's analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimelineEntry {
    /// Seconds from the start of the clip
    pub timestamp: f64,
    /// Composition for this instant
    pub mode: CompositionMode,
    /// One center per pane subject, ordered left to right
    #[serde(default)]
    pub centers: Vec<Point>,
    /// Confidence of the subject position (0.0 when nothing was detected)
    pub confidence: f64,
    /// How the position was obtained
    pub status: DetectionStatus,
    /// Stabilized primary face box, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

impl TimelineEntry {
    /// Entry with no subject information.
    pub fn empty(timestamp: f64, mode: CompositionMode) -> Self {
        Self {
            timestamp,
            mode,
            centers: Vec::new(),
            confidence: 0.0,
            status: DetectionStatus::NoDetection,
            bbox: None,
        }
    }

    /// Entry with explicit centers, marked as detected.
    pub fn with_centers(timestamp: f64, mode: CompositionMode, centers: Vec<Point>) -> Self {
        Self {
            timestamp,
            mode,
            centers,
            confidence: 1.0,
            status: DetectionStatus::Detected,
            bbox: None,
        }
    }

    /// Center driving pane `index`, if one was recorded.
    pub fn center(&self, index: usize) -> Option<Point> {
        self.centers.get(index).copied()
    }
}
