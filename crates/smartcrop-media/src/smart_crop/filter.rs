//! Geometric false-positive filter for raw face detections.

use smartcrop_models::FaceDetection;
use tracing::debug;

use super::config::FilterConfig;
use crate::metrics;

/// Why a detection was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Size,
    AspectRatio,
    Landmarks,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::Size => "size",
            Rejection::AspectRatio => "aspect_ratio",
            Rejection::Landmarks => "landmarks",
        }
    }
}

/// Rejects detections whose geometry cannot belong to a real face.
#[derive(Debug, Clone, Default)]
pub struct DetectionFilter {
    config: FilterConfig,
}

impl DetectionFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Keep the plausible detections, preserving their order.
    pub fn filter(
        &self,
        detections: &[FaceDetection],
        frame_width: u32,
        frame_height: u32,
    ) -> Vec<FaceDetection> {
        let kept: Vec<FaceDetection> = detections
            .iter()
            .filter(|det| match self.check(det, frame_height) {
                Ok(()) => true,
                Err(reason) => {
                    debug!(
                        reason = reason.as_str(),
                        width = det.bbox.width,
                        height = det.bbox.height,
                        frame_width,
                        frame_height,
                        "Rejected face candidate"
                    );
                    metrics::record_rejection(reason.as_str());
                    false
                }
            })
            .cloned()
            .collect();

        debug!(
            "Kept {}/{} detections after filtering",
            kept.len(),
            detections.len()
        );
        kept
    }

    /// Check one detection against every rule.
    pub fn check(&self, det: &FaceDetection, frame_height: u32) -> Result<(), Rejection> {
        let frame_height = frame_height as f64;
        let min_height = frame_height * self.config.min_height_ratio;
        let max_height = frame_height * self.config.max_height_ratio;
        if det.bbox.height < min_height || det.bbox.height > max_height {
            return Err(Rejection::Size);
        }

        match det.bbox.aspect_ratio() {
            Some(ratio)
                if ratio >= self.config.min_aspect_ratio
                    && ratio <= self.config.max_aspect_ratio => {}
            _ => return Err(Rejection::AspectRatio),
        }

        let Some(landmarks) = det.usable_landmarks() else {
            return if self.config.reject_missing_landmarks {
                Err(Rejection::Landmarks)
            } else {
                Ok(())
            };
        };

        let left_eye = landmarks.left_eye();
        let right_eye = landmarks.right_eye();
        if left_eye.distance(&right_eye) < det.bbox.width * self.config.min_eye_distance_ratio {
            return Err(Rejection::Landmarks);
        }

        let eye_midpoint = left_eye.midpoint(&right_eye);
        if landmarks.nose().distance(&eye_midpoint)
            < det.bbox.height * self.config.min_nose_distance_ratio
        {
            return Err(Rejection::Landmarks);
        }

        Ok(())
    }
}
