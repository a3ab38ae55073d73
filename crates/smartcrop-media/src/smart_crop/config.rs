//! Configuration for the smart-crop pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{MediaError, MediaResult};

/// Geometric false-positive filter thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Minimum face height as fraction of frame height (default: 0.10)
    pub min_height_ratio: f64,
    /// Maximum face height as fraction of frame height (default: 0.80)
    pub max_height_ratio: f64,
    /// Minimum width/height ratio (default: 0.6)
    pub min_aspect_ratio: f64,
    /// Maximum width/height ratio (default: 1.4)
    pub max_aspect_ratio: f64,
    /// Minimum eye-to-eye distance as fraction of face width (default: 0.2)
    pub min_eye_distance_ratio: f64,
    /// Minimum nose-to-eye-midpoint distance as fraction of face height (default: 0.15)
    pub min_nose_distance_ratio: f64,
    /// Reject detections that carry no usable landmarks instead of
    /// skipping the landmark check (default: false)
    pub reject_missing_landmarks: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_height_ratio: 0.10,
            max_height_ratio: 0.80,
            min_aspect_ratio: 0.6,
            max_aspect_ratio: 1.4,
            min_eye_distance_ratio: 0.2,
            min_nose_distance_ratio: 0.15,
            reject_missing_landmarks: false,
        }
    }
}

/// Weights of the primary face score. Must sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorWeights {
    pub size: f64,
    pub position: f64,
    pub confidence: f64,
    pub vertical: f64,
    /// Face centers below this fraction of frame height get the penalty (default: 0.66)
    pub lower_third_threshold: f64,
    /// Vertical bias applied inside the lower third (default: 0.7)
    pub lower_third_bias: f64,
}

impl Default for SelectorWeights {
    fn default() -> Self {
        Self {
            size: 0.4,
            position: 0.3,
            confidence: 0.2,
            vertical: 0.1,
            lower_third_threshold: 0.66,
            lower_third_bias: 0.7,
        }
    }
}

impl SelectorWeights {
    pub fn total(&self) -> f64 {
        self.size + self.position + self.confidence + self.vertical
    }
}

/// Temporal tracker parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// EMA weight of the incoming detection (default: 0.3)
    pub ema_alpha: f64,
    /// Frames a detection may be carried forward (default: 3)
    pub max_missed_frames: u64,
    /// Confidence multiplier per missed frame (default: 0.8)
    pub confidence_decay: f64,
    /// Largest center jump, as fraction of frame width, still smoothed (default: 0.3)
    pub max_jump_ratio: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            ema_alpha: 0.3,
            max_missed_frames: 3,
            confidence_decay: 0.8,
            max_jump_ratio: 0.3,
        }
    }
}

/// Output frame geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputGeometry {
    /// Output width (default: 1080)
    pub width: u32,
    /// Output height; the source is scaled to this height (default: 1920)
    pub height: u32,
    /// Height of each stacked pane in split composition (default: 960)
    pub split_pane_height: u32,
    /// Top edge of split pane crops in the scaled source (default: 480)
    pub split_crop_y: u32,
}

impl Default for OutputGeometry {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            split_pane_height: 960,
            split_crop_y: 480,
        }
    }
}

/// Configuration for the smart-crop pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartCropConfig {
    // === Per-frame stage ===
    pub filter: FilterConfig,
    pub selector: SelectorWeights,
    /// More faces than this in one frame is treated as a false-positive storm (default: 20)
    pub max_faces_per_frame: usize,
    /// Entries below this confidence are marked low_confidence (default: 0.5)
    pub low_confidence_threshold: f64,

    // === Tracking ===
    pub tracker: TrackerConfig,

    // === Compression ===
    /// Center x movement, in source pixels, that is still redundant (default: 2.0)
    pub center_tolerance_px: f64,

    // === Synthesis ===
    pub output: OutputGeometry,
    /// Maximum timeline entries in one plan segment (default: 40)
    pub max_segment_entries: usize,

    // === Analysis ===
    /// Frames per second sampled for detection (default: 1.0)
    pub sample_fps: f64,
    /// Timeout for a single detector call
    #[serde(with = "duration_millis")]
    pub detection_timeout: Duration,
    /// Retries for a failed detector call (default: 1)
    pub detection_retries: u32,
    /// Detector calls in flight at once (default: 4)
    pub max_parallel_detections: usize,
}

impl Default for SmartCropConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            selector: SelectorWeights::default(),
            max_faces_per_frame: 20,
            low_confidence_threshold: 0.5,

            tracker: TrackerConfig::default(),

            center_tolerance_px: 2.0,

            output: OutputGeometry::default(),
            max_segment_entries: 40,

            sample_fps: 1.0,
            detection_timeout: Duration::from_secs(5),
            detection_retries: 1,
            max_parallel_detections: 4,
        }
    }
}

impl SmartCropConfig {
    /// Denser sampling for short clips with fast speaker changes.
    pub fn responsive() -> Self {
        Self {
            sample_fps: 4.0,
            max_parallel_detections: 8,
            ..Default::default()
        }
    }

    /// Reject values no pipeline stage can work with.
    pub fn validate(&self) -> MediaResult<()> {
        if (self.selector.total() - 1.0).abs() > 1e-6 {
            return Err(MediaError::invalid_config(format!(
                "selector weights must sum to 1.0, got {:.3}",
                self.selector.total()
            )));
        }
        if !(self.tracker.ema_alpha > 0.0 && self.tracker.ema_alpha <= 1.0) {
            return Err(MediaError::invalid_config(format!(
                "tracker ema_alpha must be in (0, 1], got {}",
                self.tracker.ema_alpha
            )));
        }
        if !(self.sample_fps > 0.0) {
            return Err(MediaError::invalid_config("sample_fps must be positive"));
        }
        if self.max_segment_entries == 0 {
            return Err(MediaError::invalid_config(
                "max_segment_entries must be at least 1",
            ));
        }
        if self.max_parallel_detections == 0 {
            return Err(MediaError::invalid_config(
                "max_parallel_detections must be at least 1",
            ));
        }
        if self.output.width == 0 || self.output.height == 0 {
            return Err(MediaError::invalid_config("output geometry must be non-zero"));
        }
        if self.output.split_crop_y + self.output.split_pane_height > self.output.height {
            return Err(MediaError::invalid_config(
                "split pane crop exceeds the scaled source height",
            ));
        }
        Ok(())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
