//! Face detector capability interface.
//!
//! Every detection backend (in-process model, HTTP service, test script)
//! implements [`FaceProvider`]. The pipeline only sees the common
//! [`FaceDetection`] shape.

use async_trait::async_trait;
use std::path::PathBuf;

use smartcrop_models::FaceDetection;

use crate::error::MediaResult;

/// One frame sampled from the clip for detection.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledFrame {
    /// Position in the sampled sequence, starting at 0
    pub index: u64,
    /// Seconds from the start of the clip
    pub timestamp: f64,
    /// Encoded image on disk
    pub path: PathBuf,
}

impl SampledFrame {
    pub fn new(index: u64, timestamp: f64, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            timestamp,
            path: path.into(),
        }
    }
}

/// Face detection backend.
#[async_trait]
pub trait FaceProvider: Send + Sync {
    /// Detect faces in one sampled frame.
    ///
    /// A blank frame yields an empty list, not an error.
    async fn detect(&self, frame: &SampledFrame) -> MediaResult<Vec<FaceDetection>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;

    /// Release backend resources.
    async fn close(&self) -> MediaResult<()> {
        Ok(())
    }
}
