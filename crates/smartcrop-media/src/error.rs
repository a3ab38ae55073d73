//! Error types for smart-crop and media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during analysis, planning or rendering.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Cannot synthesize a crop plan from an empty timeline")]
    EmptyTimeline,

    #[error("Timeline timestamps must start at 0 and strictly increase (entry {index} at {timestamp:.3}s)")]
    UnorderedTimeline { index: usize, timestamp: f64 },

    #[error("Video duration {duration:.3}s ends before the last timeline entry at {last_timestamp:.3}s")]
    DurationBeforeTimeline { duration: f64, last_timestamp: f64 },

    #[error("Invalid frame metadata: {0}")]
    InvalidFrameMetadata(String),

    #[error("Face detection unavailable: {0}")]
    DetectionUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid subtitles: {0}")]
    InvalidSubtitles(String),

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a detection failure error.
    pub fn detection_unavailable(message: impl Into<String>) -> Self {
        Self::DetectionUnavailable(message.into())
    }

    /// Create an invalid metadata error.
    pub fn invalid_metadata(message: impl Into<String>) -> Self {
        Self::InvalidFrameMetadata(message.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn invalid_subtitles(message: impl Into<String>) -> Self {
        Self::InvalidSubtitles(message.into())
    }

    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Whether a failure of the smart-crop path should send the clip down
    /// the manual crop path instead of failing it.
    ///
    /// Cancellation is the one case that must propagate.
    pub fn is_smart_crop_fallback(&self) -> bool {
        !matches!(self, MediaError::Cancelled)
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            MediaError::EmptyTimeline => "empty_timeline",
            MediaError::UnorderedTimeline { .. } => "unordered_timeline",
            MediaError::DurationBeforeTimeline { .. } => "duration_before_timeline",
            MediaError::InvalidFrameMetadata(_) => "invalid_frame_metadata",
            MediaError::DetectionUnavailable(_) => "detection_unavailable",
            MediaError::InvalidConfig(_) => "invalid_config",
            MediaError::InvalidSubtitles(_) => "invalid_subtitles",
            MediaError::FfmpegNotFound => "ffmpeg_not_found",
            MediaError::FfprobeNotFound => "ffprobe_not_found",
            MediaError::FfmpegFailed { .. } => "ffmpeg_failed",
            MediaError::FfprobeFailed { .. } => "ffprobe_failed",
            MediaError::FileNotFound(_) => "file_not_found",
            MediaError::Cancelled => "cancelled",
            MediaError::Timeout(_) => "timeout",
            MediaError::Io(_) => "io",
            MediaError::JsonParse(_) => "json_parse",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_policy() {
        assert!(MediaError::EmptyTimeline.is_smart_crop_fallback());
        assert!(MediaError::invalid_metadata("height is 0").is_smart_crop_fallback());
        assert!(!MediaError::Cancelled.is_smart_crop_fallback());
    }

    #[test]
    fn test_display() {
        let err = MediaError::DurationBeforeTimeline {
            duration: 4.0,
            last_timestamp: 5.0,
        };
        assert_eq!(
            err.to_string(),
            "Video duration 4.000s ends before the last timeline entry at 5.000s"
        );
        assert_eq!(err.kind(), "duration_before_timeline");
    }
}
