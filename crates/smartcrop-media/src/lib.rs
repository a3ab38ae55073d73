#![deny(unreachable_patterns)]
//! Smart-crop planning and FFmpeg CLI wrapper.
//!
//! This crate provides:
//! - The smart-crop pipeline (filter, selector, tracker, classifier,
//!   compressor, synthesizer) and its analysis context
//! - Filter-graph serialization of crop plans
//! - Type-safe FFmpeg command building with timeout and cancellation
//! - Probing, frame sampling, cutting and rendering of clips
//! - Static portrait and split fallbacks
//! - SRT cutting and caption burn-in

pub mod captions;
pub mod command;
pub mod error;
pub mod filter_graph;
pub mod frames;
pub mod metrics;
pub mod probe;
pub mod renderer;
pub mod retry;
pub mod smart_crop;

pub use captions::{cut_srt, render_captions, CaptionStyle, SubtitleCue};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use filter_graph::FilterScript;
pub use frames::{sample_frames, SampledFrames};
pub use probe::{probe_video, VideoMeta};
pub use renderer::{
    cut_segment, render_crop_plan, render_portrait, render_split_halves, PortraitPosition,
};
pub use retry::{retry_async, RetryConfig, RetryResult};
pub use smart_crop::{FaceProvider, SampledFrame, SmartCropConfig, SmartCropContext};
