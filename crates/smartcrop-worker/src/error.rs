//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid clip request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Media error: {0}")]
    Media(#[from] smartcrop_media::MediaError),

    #[error("Detector error: {0}")]
    Detector(#[from] smartcrop_detector_client::DetectorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn processing_failed(msg: impl Into<String>) -> Self {
        Self::ProcessingFailed(msg.into())
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Detector(e) => e.is_retryable(),
            WorkerError::Media(smartcrop_media::MediaError::Timeout(_)) => true,
            WorkerError::Io(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartcrop_media::MediaError;

    #[test]
    fn test_retryable() {
        assert!(WorkerError::from(MediaError::Timeout(30)).is_retryable());
        assert!(!WorkerError::from(MediaError::Cancelled).is_retryable());
        assert!(!WorkerError::invalid_request("end before start").is_retryable());
    }
}
