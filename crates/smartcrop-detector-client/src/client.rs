//! Detector service HTTP client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};

use smartcrop_media::{
    retry_async, FaceProvider, MediaError, MediaResult, RetryConfig, SampledFrame,
};
use smartcrop_models::FaceDetection;

use crate::error::{DetectorError, DetectorResult};
use crate::types::{DetectResponse, HealthResponse};

/// Shortest per-request timeout [`DetectorClientConfig::fit_within`] goes down to.
const MIN_REQUEST_TIMEOUT: Duration = Duration::from_millis(100);

/// Configuration for the detector client.
#[derive(Debug, Clone)]
pub struct DetectorClientConfig {
    /// Base URL of the detector service
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries
    pub max_retries: u32,
    /// Delay before the first retry, doubled per attempt
    pub retry_base_delay: Duration,
}

impl Default for DetectorClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8002".to_string(),
            timeout: Duration::from_millis(2000),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(100),
        }
    }
}

impl DetectorClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("DETECTOR_SERVICE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            timeout: std::env::var("DETECTOR_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            max_retries: std::env::var("DETECTOR_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            retry_base_delay: defaults.retry_base_delay,
        }
    }

    /// Backoff policy for detector requests.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new("detector request")
            .with_max_retries(self.max_retries)
            .with_base_delay(self.retry_base_delay)
    }

    /// Shrink the request timeout so every attempt plus backoff fits in
    /// `budget`.
    ///
    /// The analysis context bounds each frame's detection by its own
    /// timeout; a client whose retries outlast it gets its last attempt
    /// cut off mid-request.
    pub fn fit_within(mut self, budget: Duration) -> Self {
        let attempts = self.max_retries.saturating_add(1);
        let per_attempt = budget.saturating_sub(self.retry_config().total_backoff()) / attempts;
        if per_attempt < self.timeout {
            self.timeout = per_attempt.max(MIN_REQUEST_TIMEOUT);
        }
        self
    }
}

/// Face detector backed by the HTTP detection service.
pub struct HttpFaceDetector {
    http: Client,
    config: DetectorClientConfig,
    retry: RetryConfig,
}

impl HttpFaceDetector {
    /// Create a new detector client.
    pub fn new(config: DetectorClientConfig) -> DetectorResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(DetectorError::Network)?;

        let retry = config.retry_config();
        Ok(Self {
            http,
            config,
            retry,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> DetectorResult<Self> {
        Self::new(DetectorClientConfig::from_env())
    }

    pub fn config(&self) -> &DetectorClientConfig {
        &self.config
    }

    /// Check if the detector service is healthy.
    pub async fn health_check(&self) -> DetectorResult<bool> {
        let url = format!("{}/health", self.config.base_url);

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let health: HealthResponse = response.json().await?;
                Ok(health.is_healthy())
            }
            Ok(response) => {
                warn!("Detector health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Detector health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Detect faces in an encoded JPEG frame.
    pub async fn detect_jpeg(&self, jpeg: &[u8]) -> DetectorResult<Vec<FaceDetection>> {
        let url = format!("{}/detect", self.config.base_url);
        let url = url.as_str();

        let response = retry_async(
            &self.retry,
            || async move {
                let response = self
                    .http
                    .post(url)
                    .header(CONTENT_TYPE, "image/jpeg")
                    .body(jpeg.to_vec())
                    .send()
                    .await
                    .map_err(|e| self.send_error(e))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(DetectorError::from_status(status.as_u16(), body));
                }

                response
                    .json::<DetectResponse>()
                    .await
                    .map_err(|e| DetectorError::InvalidResponse(e.to_string()))
            },
            DetectorError::is_retryable,
        )
        .await
        .into_result()?;

        debug!(
            faces = response.detections.len(),
            inference_ms = response.inference_ms,
            "Detector response"
        );
        Ok(response.into_detections())
    }

    /// Read a frame from disk and detect faces in it.
    pub async fn detect_file(&self, path: impl AsRef<Path>) -> DetectorResult<Vec<FaceDetection>> {
        let jpeg = tokio::fs::read(path.as_ref()).await?;
        self.detect_jpeg(&jpeg).await
    }

    fn send_error(&self, e: reqwest::Error) -> DetectorError {
        if e.is_timeout() {
            DetectorError::Timeout(self.config.timeout.as_millis() as u64)
        } else if e.is_connect() {
            DetectorError::ServiceUnavailable(e.to_string())
        } else {
            DetectorError::Network(e)
        }
    }
}

#[async_trait]
impl FaceProvider for HttpFaceDetector {
    async fn detect(&self, frame: &SampledFrame) -> MediaResult<Vec<FaceDetection>> {
        self.detect_file(&frame.path).await.map_err(|e| {
            MediaError::detection_unavailable(format!("frame {}: {}", frame.index, e))
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
