//! Clip generation worker.
//!
//! This crate provides:
//! - Environment configuration for the smart-crop pipeline and detector
//! - The clip generation flow (cut, smart crop with fallback, manual crops)
//! - Structured per-clip logging

pub mod config;
pub mod error;
pub mod logging;
pub mod processor;
pub mod timecode;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::ClipLogger;
pub use processor::{ClipOptions, ClipOutput, ClipProcessor, ClipRequest, Stage};
pub use timecode::parse_timecode;
