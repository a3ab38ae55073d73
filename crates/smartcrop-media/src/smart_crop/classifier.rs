//! Per-frame composition mode decision.

use smartcrop_models::{CompositionMode, FaceDetection};
use tracing::warn;

use crate::metrics;

/// Decides between single-subject and two-subject composition.
#[derive(Debug, Clone)]
pub struct ModeClassifier {
    max_faces: usize,
}

impl Default for ModeClassifier {
    fn default() -> Self {
        Self { max_faces: 20 }
    }
}

impl ModeClassifier {
    pub fn new(max_faces: usize) -> Self {
        Self { max_faces }
    }

    /// Classify one frame from its filtered detections.
    ///
    /// Split composition needs at least one face on each side of the
    /// horizontal midpoint. Frames with more faces than the sanity cap are
    /// treated as a detector false-positive storm and stay centered.
    pub fn classify(&self, faces: &[FaceDetection], frame_width: u32) -> CompositionMode {
        if faces.len() <= 1 {
            return CompositionMode::Center;
        }

        if faces.len() > self.max_faces {
            warn!(
                faces = faces.len(),
                cap = self.max_faces,
                "Implausible face count, keeping center composition"
            );
            metrics::record_implausible_frame();
            return CompositionMode::Center;
        }

        let midpoint = frame_width as f64 / 2.0;
        let has_left = faces.iter().any(|f| f.bbox.cx() < midpoint);
        let has_right = faces.iter().any(|f| f.bbox.cx() >= midpoint);

        if has_left && has_right {
            CompositionMode::Split
        } else {
            CompositionMode::Center
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartcrop_models::BoundingBox;

    fn face_at(cx: f64) -> FaceDetection {
        FaceDetection::new(BoundingBox::new(cx - 25.0, 100.0, 50.0, 50.0), 0.9)
    }

    #[test]
    fn test_zero_or_one_face_is_center() {
        let classifier = ModeClassifier::default();
        assert_eq!(classifier.classify(&[], 600), CompositionMode::Center);
        assert_eq!(
            classifier.classify(&[face_at(100.0)], 600),
            CompositionMode::Center
        );
    }

    #[test]
    fn test_faces_on_both_sides_split() {
        let classifier = ModeClassifier::default();
        let faces = vec![face_at(100.0), face_at(500.0)];
        assert_eq!(classifier.classify(&faces, 600), CompositionMode::Split);
    }

    #[test]
    fn test_faces_on_one_side_center() {
        let classifier = ModeClassifier::default();
        let faces = vec![face_at(100.0), face_at(250.0)];
        assert_eq!(classifier.classify(&faces, 600), CompositionMode::Center);
    }

    #[test]
    fn test_face_on_midpoint_counts_right() {
        let classifier = ModeClassifier::default();
        let faces = vec![face_at(100.0), face_at(300.0)];
        assert_eq!(classifier.classify(&faces, 600), CompositionMode::Split);
    }

    #[test]
    fn test_storm_stays_center() {
        let classifier = ModeClassifier::default();
        let faces: Vec<_> = (0..21).map(|i| face_at(20.0 + i as f64 * 25.0)).collect();
        assert_eq!(classifier.classify(&faces, 600), CompositionMode::Center);

        // Exactly at the cap is still classified normally
        assert_eq!(
            classifier.classify(&faces[..20], 600),
            CompositionMode::Split
        );
    }
}
