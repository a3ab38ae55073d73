//! Shared data models for the smart-crop pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Source-frame geometry (points, bounding boxes)
//! - Face detections, landmarks and tracker output
//! - Per-frame composition timelines
//! - Crop plans consumed by the video compositor

pub mod detection;
pub mod geometry;
pub mod plan;
pub mod timeline;

// Re-export common types
pub use detection::{FaceDetection, FaceLandmarks, StabilizedFace};
pub use geometry::{BoundingBox, Point};
pub use plan::{CropPlan, HorizontalOffset, OffsetKeyframe, PaneSlot, PaneTransform, SegmentPlan};
pub use timeline::{CompositionMode, DetectionStatus, TimelineEntry};
