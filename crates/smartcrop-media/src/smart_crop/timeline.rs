//! Per-frame analysis and the timeline fold.
//!
//! Analysis of a single frame (filter, classify, select) has no state and
//! can run for many frames at once. The fold that feeds the tracker must
//! see frames one by one in frame-index order.

use smartcrop_models::{
    CompositionMode, DetectionStatus, FaceDetection, Point, TimelineEntry,
};
use tracing::debug;

use super::classifier::ModeClassifier;
use super::config::SmartCropConfig;
use super::filter::DetectionFilter;
use super::selector::PrimaryFaceSelector;
use super::tracker::TemporalTracker;

/// Stateless outcome of one frame's detections.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameAnalysis {
    pub index: u64,
    pub timestamp: f64,
    pub mode: CompositionMode,
    /// Most salient face of the whole frame
    pub primary: Option<FaceDetection>,
    /// Most salient face left and right of the midpoint, for split frames
    pub split_pair: Option<(FaceDetection, FaceDetection)>,
    /// Faces that survived the filter
    pub face_count: usize,
}

/// Filter, classify and select for single frames.
#[derive(Debug, Clone)]
pub struct FrameAnalyzer {
    filter: DetectionFilter,
    selector: PrimaryFaceSelector,
    classifier: ModeClassifier,
    frame_width: u32,
    frame_height: u32,
}

impl FrameAnalyzer {
    pub fn new(config: &SmartCropConfig, frame_width: u32, frame_height: u32) -> Self {
        Self {
            filter: DetectionFilter::new(config.filter.clone()),
            selector: PrimaryFaceSelector::new(config.selector.clone()),
            classifier: ModeClassifier::new(config.max_faces_per_frame),
            frame_width,
            frame_height,
        }
    }

    pub fn analyze(&self, index: u64, timestamp: f64, detections: &[FaceDetection]) -> FrameAnalysis {
        let faces = self
            .filter
            .filter(detections, self.frame_width, self.frame_height);
        let mode = self.classifier.classify(&faces, self.frame_width);
        let primary = self
            .selector
            .select(&faces, self.frame_width, self.frame_height);

        let split_pair = match mode {
            CompositionMode::Split => self.split_pair(&faces),
            CompositionMode::Center => None,
        };

        debug!(
            frame = index,
            raw = detections.len(),
            faces = faces.len(),
            mode = mode.as_str(),
            "Analyzed frame"
        );

        FrameAnalysis {
            index,
            timestamp,
            mode,
            primary,
            split_pair,
            face_count: faces.len(),
        }
    }

    fn split_pair(&self, faces: &[FaceDetection]) -> Option<(FaceDetection, FaceDetection)> {
        let midpoint = self.frame_width as f64 / 2.0;
        let (left, right): (Vec<FaceDetection>, Vec<FaceDetection>) =
            faces.iter().cloned().partition(|f| f.bbox.cx() < midpoint);

        let left = self
            .selector
            .select(&left, self.frame_width, self.frame_height)?;
        let right = self
            .selector
            .select(&right, self.frame_width, self.frame_height)?;
        Some((left, right))
    }
}

/// Fold analyzed frames into timeline entries.
///
/// Frames must be sorted by index. The tracker follows the primary face
/// through every frame, including split frames, so a return to center
/// composition starts from a warm track.
pub fn build_timeline(
    frames: &[FrameAnalysis],
    frame_width: u32,
    config: &SmartCropConfig,
) -> Vec<TimelineEntry> {
    let mut tracker = TemporalTracker::new(frame_width, config.tracker.clone());

    frames
        .iter()
        .map(|frame| {
            let stabilized = tracker.update(frame.primary.as_ref(), frame.index);
            let supported = frame.primary.is_some();

            let (centers, confidence) = match (&frame.split_pair, &stabilized) {
                (Some((left, right)), _) => (
                    vec![left.center(), right.center()],
                    left.confidence.min(right.confidence),
                ),
                (None, Some(face)) => (vec![face.center()], face.confidence),
                (None, None) => (Vec::<Point>::new(), 0.0),
            };

            let status = if centers.is_empty() {
                DetectionStatus::NoDetection
            } else if confidence < config.low_confidence_threshold {
                DetectionStatus::LowConfidence
            } else if supported {
                DetectionStatus::Detected
            } else {
                DetectionStatus::Interpolated
            };

            TimelineEntry {
                timestamp: frame.timestamp,
                mode: frame.mode,
                centers,
                confidence,
                status,
                bbox: stabilized.map(|face| face.bbox),
            }
        })
        .collect()
}
