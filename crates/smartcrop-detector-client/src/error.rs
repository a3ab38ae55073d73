//! Detector client error types.

use thiserror::Error;

pub type DetectorResult<T> = Result<T, DetectorError>;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Detector service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Detector service returned {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Request rejected with {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0} ms")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DetectorError {
    /// Network failures, 5xx answers and timeouts are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            DetectorError::ServiceUnavailable(_)
            | DetectorError::ServerError { .. }
            | DetectorError::Timeout(_) => true,
            DetectorError::Network(e) => !e.is_decode() && !e.is_builder(),
            _ => false,
        }
    }

    /// Map an unsuccessful HTTP status to an error.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            503 => DetectorError::ServiceUnavailable(body),
            500..=599 => DetectorError::ServerError { status, body },
            _ => DetectorError::RequestFailed { status, body },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(DetectorError::from_status(500, String::new()).is_retryable());
        assert!(DetectorError::from_status(503, "warming up".into()).is_retryable());
        assert!(!DetectorError::from_status(400, "bad image".into()).is_retryable());
        assert!(!DetectorError::from_status(413, String::new()).is_retryable());
    }

    #[test]
    fn test_timeout_retryable() {
        assert!(DetectorError::Timeout(2000).is_retryable());
        assert!(!DetectorError::InvalidResponse("bad".into()).is_retryable());
    }
}
