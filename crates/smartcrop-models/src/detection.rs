//! Face detections as produced by a detector backend, and the tracker's
//! smoothed view of a single subject.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, Point};

/// The five facial landmarks, in fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FaceLandmarks {
    /// `[left_eye, right_eye, nose, left_mouth, right_mouth]`
    pub points: [Point; 5],
}

impl FaceLandmarks {
    pub fn new(points: [Point; 5]) -> Self {
        Self { points }
    }

    /// Build from a flat `[x1, y1, ..., x5, y5]` array.
    ///
    /// Returns `None` unless at least ten values are present.
    pub fn from_flat(values: &[f64]) -> Option<Self> {
        if values.len() < 10 {
            return None;
        }
        let mut points = [Point::default(); 5];
        for (i, point) in points.iter_mut().enumerate() {
            *point = Point::new(values[i * 2], values[i * 2 + 1]);
        }
        Some(Self { points })
    }

    #[inline]
    pub fn left_eye(&self) -> Point {
        self.points[0]
    }

    #[inline]
    pub fn right_eye(&self) -> Point {
        self.points[1]
    }

    #[inline]
    pub fn nose(&self) -> Point {
        self.points[2]
    }

    #[inline]
    pub fn left_mouth(&self) -> Point {
        self.points[3]
    }

    #[inline]
    pub fn right_mouth(&self) -> Point {
        self.points[4]
    }

    /// True when every landmark sits at the origin, which is how backends
    /// without landmark support fill the slot.
    pub fn is_unset(&self) -> bool {
        self.points.iter().all(|p| p.x == 0.0 && p.y == 0.0)
    }
}

/// One face candidate in a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FaceDetection {
    /// Bounding box in source-frame pixels
    pub bbox: BoundingBox,
    /// Detector confidence (0.0-1.0)
    pub confidence: f64,
    /// Facial landmarks, absent when the backend does not supply them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<FaceLandmarks>,
    /// Selection score assigned by the primary face selector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl FaceDetection {
    /// Create a detection without landmarks.
    pub fn new(bbox: BoundingBox, confidence: f64) -> Self {
        Self {
            bbox,
            confidence,
            landmarks: None,
            score: None,
        }
    }

    /// Attach landmarks.
    pub fn with_landmarks(mut self, landmarks: FaceLandmarks) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    /// Landmarks that carry real data (unset landmark sets count as missing).
    pub fn usable_landmarks(&self) -> Option<&FaceLandmarks> {
        self.landmarks.as_ref().filter(|l| !l.is_unset())
    }

    /// Center of the bounding box.
    #[inline]
    pub fn center(&self) -> Point {
        self.bbox.center()
    }
}

/// Temporally smoothed face owned by a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StabilizedFace {
    /// Smoothed bounding box
    pub bbox: BoundingBox,
    /// Current confidence (decayed while carried forward)
    pub confidence: f64,
    /// Index of the last frame backed by a real detection
    pub last_seen: u64,
}

impl StabilizedFace {
    /// Center of the smoothed box.
    #[inline]
    pub fn center(&self) -> Point {
        self.bbox.center()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmarks_from_flat() {
        let flat = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let landmarks = FaceLandmarks::from_flat(&flat).unwrap();
        assert_eq!(landmarks.left_eye(), Point::new(1.0, 2.0));
        assert_eq!(landmarks.nose(), Point::new(5.0, 6.0));
        assert_eq!(landmarks.right_mouth(), Point::new(9.0, 10.0));

        assert!(FaceLandmarks::from_flat(&flat[..8]).is_none());
    }

    #[test]
    fn test_unset_landmarks_are_not_usable() {
        let det = FaceDetection::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.9)
            .with_landmarks(FaceLandmarks::default());
        assert!(det.landmarks.is_some());
        assert!(det.usable_landmarks().is_none());
    }

    #[test]
    fn test_detection_serde_skips_empty_fields() {
        let det = FaceDetection::new(BoundingBox::new(1.0, 2.0, 3.0, 4.0), 0.5);
        let json = serde_json::to_value(&det).unwrap();
        assert!(json.get("landmarks").is_none());
        assert!(json.get("score").is_none());

        let back: FaceDetection = serde_json::from_value(json).unwrap();
        assert_eq!(back, det);
    }
}
