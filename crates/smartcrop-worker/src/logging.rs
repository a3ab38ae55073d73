//! Structured clip logging utilities.
//!
//! Every clip gets an id and a tracing span, so one clip's cut, analysis
//! and rendering can be followed as a single unit of work.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

/// Clip logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct ClipLogger {
    clip_id: String,
    operation: String,
}

impl ClipLogger {
    /// Create a logger with a fresh clip id.
    pub fn new(operation: &str) -> Self {
        Self::from_string(&Uuid::new_v4().to_string(), operation)
    }

    /// Create a logger for an existing clip id.
    pub fn from_string(clip_id: &str, operation: &str) -> Self {
        Self {
            clip_id: clip_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            clip_id = %self.clip_id,
            operation = %self.operation,
            "Clip started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            clip_id = %self.clip_id,
            operation = %self.operation,
            "Clip progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            clip_id = %self.clip_id,
            operation = %self.operation,
            "Clip warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            clip_id = %self.clip_id,
            operation = %self.operation,
            "Clip error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            clip_id = %self.clip_id,
            operation = %self.operation,
            "Clip completed: {}", message
        );
    }

    pub fn clip_id(&self) -> &str {
        &self.clip_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this clip.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "clip",
            clip_id = %self.clip_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_differ() {
        let a = ClipLogger::new("generate");
        let b = ClipLogger::new("generate");
        assert_ne!(a.clip_id(), b.clip_id());
        assert_eq!(a.operation(), "generate");
    }

    #[test]
    fn test_from_string() {
        let logger = ClipLogger::from_string("clip-123", "smart_crop");
        assert_eq!(logger.clip_id(), "clip-123");
        assert_eq!(logger.operation(), "smart_crop");
    }
}
