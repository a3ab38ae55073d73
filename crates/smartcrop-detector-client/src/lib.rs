//! Client for the face detection service.
//!
//! The service runs the detection model out of process and answers one
//! JPEG frame per request. [`HttpFaceDetector`] wraps it as a
//! [`FaceProvider`](smartcrop_media::FaceProvider) so the smart-crop
//! context can use it like any other backend.

pub mod client;
pub mod error;
pub mod types;

pub use client::{DetectorClientConfig, HttpFaceDetector};
pub use error::{DetectorError, DetectorResult};
pub use types::{DetectResponse, HealthResponse, WireDetection};
