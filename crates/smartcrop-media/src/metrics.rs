//! Metrics emitted by the smart-crop pipeline.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! host process installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const DETECTIONS_REJECTED_TOTAL: &str = "smartcrop_detections_rejected_total";
    pub const FRAMES_DEGRADED_TOTAL: &str = "smartcrop_frames_degraded_total";
    pub const IMPLAUSIBLE_FRAMES_TOTAL: &str = "smartcrop_implausible_frames_total";
    pub const TRACKER_RESETS_TOTAL: &str = "smartcrop_tracker_resets_total";
    pub const PLANS_TOTAL: &str = "smartcrop_plans_total";
    pub const PLAN_SEGMENTS: &str = "smartcrop_plan_segments";
    pub const FALLBACKS_TOTAL: &str = "smartcrop_fallbacks_total";
}

/// Record a detection dropped by the geometric filter.
pub fn record_rejection(reason: &'static str) {
    counter!(names::DETECTIONS_REJECTED_TOTAL, "reason" => reason).increment(1);
}

/// Record a frame whose detector call failed and was treated as empty.
pub fn record_degraded_frame() {
    counter!(names::FRAMES_DEGRADED_TOTAL).increment(1);
}

/// Record a frame with an implausible number of faces.
pub fn record_implausible_frame() {
    counter!(names::IMPLAUSIBLE_FRAMES_TOTAL).increment(1);
}

/// Record a tracker losing its subject.
pub fn record_tracker_reset(reason: &'static str) {
    counter!(names::TRACKER_RESETS_TOTAL, "reason" => reason).increment(1);
}

/// Record a synthesized crop plan.
pub fn record_plan(segments: usize) {
    counter!(names::PLANS_TOTAL).increment(1);
    histogram!(names::PLAN_SEGMENTS).record(segments as f64);
}

/// Record a clip that fell back to the manual crop path.
pub fn record_fallback(reason: &'static str) {
    counter!(names::FALLBACKS_TOTAL, "reason" => reason).increment(1);
}
