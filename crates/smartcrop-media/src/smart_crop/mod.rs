//! Smart-crop planning: follow detected faces in a vertical reframe.
//!
//! Raw per-frame detections go through a chain of small stages and come
//! out as a [`CropPlan`](smartcrop_models::CropPlan) the renderer executes.
//!
//! # Architecture
//!
//! ```text
//! Sampled Frames
//!     │
//!     ▼
//! ┌──────────────────┐
//! │  Face Provider   │ ← Detector backend, timeout + retry per frame
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ Detection Filter │ ← Drop implausible boxes (size, aspect, landmarks)
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ Mode Classifier  │ ← center vs split per frame
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ Primary Selector │ ← Most salient face
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ Temporal Tracker │ ← EMA smoothing, bridges short gaps (frame order)
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   Compressor     │ ← Keep change-points only
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   Synthesizer    │ ← Segments + per-pane crop offsets
//! └────────┬─────────┘
//!          │
//!          ▼
//!      Crop Plan
//! ```
//!
//! Everything except the tracker is a pure function of its input.

pub mod classifier;
pub mod compressor;
pub mod config;
pub mod context;
pub mod filter;
pub mod provider;
pub mod selector;
pub mod synthesizer;
pub mod timeline;
pub mod tracker;


pub use classifier::ModeClassifier;
pub use compressor::compress;
pub use config::{FilterConfig, OutputGeometry, SelectorWeights, SmartCropConfig, TrackerConfig};
pub use context::SmartCropContext;
pub use filter::{DetectionFilter, Rejection};
pub use provider::{FaceProvider, SampledFrame};
pub use selector::PrimaryFaceSelector;
pub use synthesizer::{segment_timeline, CropPlanSynthesizer, Segment};
pub use timeline::{build_timeline, FrameAnalysis, FrameAnalyzer};
pub use tracker::TemporalTracker;
