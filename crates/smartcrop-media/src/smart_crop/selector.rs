//! Primary face selection.
//!
//! Scores every candidate with a weighted sum of size, centrality,
//! confidence and a lower-third penalty, and picks the best one.

use smartcrop_models::{FaceDetection, Point};
use tracing::debug;

use super::config::SelectorWeights;

/// Picks the most salient face of a frame.
#[derive(Debug, Clone, Default)]
pub struct PrimaryFaceSelector {
    weights: SelectorWeights,
}

impl PrimaryFaceSelector {
    pub fn new(weights: SelectorWeights) -> Self {
        Self { weights }
    }

    /// Select the highest scoring candidate.
    ///
    /// The returned detection is a copy of the winner with its `score` set.
    /// Ties resolve to the earliest candidate.
    pub fn select(
        &self,
        candidates: &[FaceDetection],
        frame_width: u32,
        frame_height: u32,
    ) -> Option<FaceDetection> {
        let mut best: Option<(usize, f64)> = None;

        for (idx, candidate) in candidates.iter().enumerate() {
            let score = self.score(candidate, frame_width, frame_height);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((idx, score));
            }
        }

        let (idx, score) = best?;
        if candidates.len() > 1 {
            debug!(
                "Selected face {}/{} with score {:.3}",
                idx + 1,
                candidates.len(),
                score
            );
        }

        let mut selected = candidates[idx].clone();
        selected.score = Some(score);
        Some(selected)
    }

    /// Weighted saliency score of one face.
    pub fn score(&self, face: &FaceDetection, frame_width: u32, frame_height: u32) -> f64 {
        let frame_w = frame_width as f64;
        let frame_h = frame_height as f64;

        let frame_area = frame_w * frame_h;
        let size_score = if frame_area > 0.0 {
            face.bbox.area() / frame_area
        } else {
            0.0
        };

        let face_center = face.center();
        let frame_center = Point::new(frame_w / 2.0, frame_h / 2.0);
        let max_distance = frame_center.distance(&Point::new(0.0, 0.0));
        let position_score = if max_distance > 0.0 {
            1.0 - face_center.distance(&frame_center) / max_distance
        } else {
            0.0
        };

        let vertical_bias = if face_center.y > frame_h * self.weights.lower_third_threshold {
            self.weights.lower_third_bias
        } else {
            1.0
        };

        size_score * self.weights.size
            + position_score * self.weights.position
            + face.confidence * self.weights.confidence
            + vertical_bias * self.weights.vertical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartcrop_models::BoundingBox;

    fn det(x: f64, y: f64, size: f64, confidence: f64) -> FaceDetection {
        FaceDetection::new(BoundingBox::new(x, y, size, size), confidence)
    }

    #[test]
    fn test_empty_returns_none() {
        let selector = PrimaryFaceSelector::default();
        assert!(selector.select(&[], 1920, 1080).is_none());
    }

    #[test]
    fn test_single_candidate_keeps_geometry() {
        let selector = PrimaryFaceSelector::default();
        let only = det(1500.0, 900.0, 40.0, 0.3);
        let selected = selector.select(std::slice::from_ref(&only), 1920, 1080).unwrap();
        assert_eq!(selected.bbox, only.bbox);
        assert_eq!(selected.confidence, only.confidence);
        assert!(selected.score.is_some());
    }

    #[test]
    fn test_prefers_large_central_face() {
        let selector = PrimaryFaceSelector::default();
        let candidates = vec![
            det(50.0, 50.0, 100.0, 0.9),
            det(810.0, 390.0, 300.0, 0.9),
        ];
        let selected = selector.select(&candidates, 1920, 1080).unwrap();
        assert_eq!(selected.bbox, candidates[1].bbox);
    }

    #[test]
    fn test_lower_third_penalty() {
        let selector = PrimaryFaceSelector::default();
        // Mirror images around the frame center: same size, centrality and confidence
        let upper = det(910.0, 240.0, 100.0, 0.9);
        let lower = det(910.0, 740.0, 100.0, 0.9);
        let upper_score = selector.score(&upper, 1920, 1080);
        let lower_score = selector.score(&lower, 1920, 1080);
        assert!((upper_score - lower_score - 0.03).abs() < 1e-9);
    }

    #[test]
    fn test_ties_resolve_to_first() {
        let selector = PrimaryFaceSelector::default();
        // Mirror images around the vertical center line score the same
        let candidates = vec![det(400.0, 490.0, 100.0, 0.8), det(1420.0, 490.0, 100.0, 0.8)];
        let selected = selector.select(&candidates, 1920, 1080).unwrap();
        assert_eq!(selected.bbox, candidates[0].bbox);
        assert_eq!(selected.score, Some(selector.score(&candidates[0], 1920, 1080)));
    }

    #[test]
    fn test_score_components() {
        let selector = PrimaryFaceSelector::default();
        // Face centered in a 1000x1000 frame, covering 1% of it
        let centered = det(450.0, 450.0, 100.0, 1.0);
        let expected = 0.01 * 0.4 + 1.0 * 0.3 + 1.0 * 0.2 + 1.0 * 0.1;
        assert!((selector.score(&centered, 1000, 1000) - expected).abs() < 1e-9);
    }
}
