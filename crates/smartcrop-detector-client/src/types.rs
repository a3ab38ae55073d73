//! Detector service request/response types.

use serde::{Deserialize, Serialize};
use smartcrop_models::{BoundingBox, FaceDetection, FaceLandmarks};

/// One face as reported by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireDetection {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    /// Confidence (0.0 - 1.0)
    pub c: f64,
    /// Flat landmarks `[x1, y1, ..., x5, y5]`
    #[serde(default)]
    pub l: Vec<f64>,
}

impl WireDetection {
    /// Convert to the pipeline shape. Short landmark arrays are dropped.
    pub fn into_detection(self) -> FaceDetection {
        let det = FaceDetection::new(BoundingBox::new(self.x, self.y, self.w, self.h), self.c);
        match FaceLandmarks::from_flat(&self.l) {
            Some(landmarks) => det.with_landmarks(landmarks),
            None => det,
        }
    }
}

/// Response of `POST /detect`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    #[serde(default)]
    pub detections: Vec<WireDetection>,
    /// Model time spent on the frame
    #[serde(default)]
    pub inference_ms: f64,
}

impl DetectResponse {
    pub fn into_detections(self) -> Vec<FaceDetection> {
        self.detections
            .into_iter()
            .map(WireDetection::into_detection)
            .collect()
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: Option<String>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy" || self.status == "ok"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartcrop_models::Point;

    #[test]
    fn test_decode_response() {
        let json = r#"{
            "detections": [
                {"x": 10.0, "y": 20.0, "w": 100.0, "h": 120.0, "c": 0.93,
                 "l": [40.0, 60.0, 80.0, 60.0, 60.0, 90.0, 45.0, 110.0, 75.0, 110.0]}
            ],
            "inference_ms": 7.5
        }"#;
        let response: DetectResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.inference_ms, 7.5);

        let dets = response.into_detections();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].bbox, BoundingBox::new(10.0, 20.0, 100.0, 120.0));
        assert_eq!(dets[0].confidence, 0.93);
        let landmarks = dets[0].usable_landmarks().unwrap();
        assert_eq!(landmarks.nose(), Point::new(60.0, 90.0));
    }

    #[test]
    fn test_short_landmarks_dropped() {
        let wire = WireDetection {
            x: 0.0,
            y: 0.0,
            w: 50.0,
            h: 50.0,
            c: 0.8,
            l: vec![1.0, 2.0, 3.0],
        };
        assert!(wire.into_detection().usable_landmarks().is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let response: DetectResponse = serde_json::from_str("{}").unwrap();
        assert!(response.detections.is_empty());
    }

    #[test]
    fn test_health_status() {
        let health: HealthResponse = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
        assert!(health.is_healthy());
        assert!(health.model.is_none());
    }
}
