//! Analysis context for one or more clips.
//!
//! The context owns the configuration and the detector backend. It is
//! created explicitly by the caller and torn down with [`SmartCropContext::close`].
//! Analyses run through one context share no mutable state.

use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use smartcrop_models::{CropPlan, FaceDetection, TimelineEntry};

use super::compressor::compress;
use super::config::SmartCropConfig;
use super::provider::{FaceProvider, SampledFrame};
use super::synthesizer::CropPlanSynthesizer;
use super::timeline::{build_timeline, FrameAnalysis, FrameAnalyzer};
use crate::command::FfmpegRunner;
use crate::error::{MediaError, MediaResult};
use crate::frames::sample_frames;
use crate::metrics;
use crate::probe::{probe_video, VideoMeta};
use crate::retry::{retry_async, RetryConfig, RetryResult};

/// Smart-crop analysis context.
pub struct SmartCropContext {
    config: SmartCropConfig,
    provider: Arc<dyn FaceProvider>,
    retry: RetryConfig,
}

impl SmartCropContext {
    /// Create a context, validating the configuration.
    pub fn new(config: SmartCropConfig, provider: Arc<dyn FaceProvider>) -> MediaResult<Self> {
        config.validate()?;
        let retry = RetryConfig::new(format!("{} detection", provider.name()))
            .with_max_retries(config.detection_retries);
        Ok(Self {
            config,
            provider,
            retry,
        })
    }

    pub fn config(&self) -> &SmartCropConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Build the per-frame timeline of already sampled frames.
    ///
    /// Detector calls run concurrently; a frame whose detection fails or
    /// times out counts as a frame without faces. Only cancellation aborts
    /// the analysis.
    pub async fn analyze(
        &self,
        frames: &[SampledFrame],
        meta: &VideoMeta,
    ) -> MediaResult<Vec<TimelineEntry>> {
        meta.validate()?;

        let started = Instant::now();
        let analyzer = FrameAnalyzer::new(&self.config, meta.width, meta.height);

        let results: Vec<MediaResult<FrameAnalysis>> = stream::iter(frames)
            .map(|frame| {
                let analyzer = &analyzer;
                async move {
                    let detections = self.detect_frame(frame).await?;
                    Ok(analyzer.analyze(frame.index, frame.timestamp, &detections))
                }
            })
            .buffered(self.config.max_parallel_detections)
            .collect()
            .await;

        let mut analyses = results.into_iter().collect::<MediaResult<Vec<_>>>()?;
        analyses.sort_by_key(|a| a.index);

        let timeline = build_timeline(&analyses, meta.width, &self.config);

        info!(
            frames = frames.len(),
            provider = self.provider.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built smart-crop timeline"
        );
        Ok(timeline)
    }

    /// Analyze, compress and synthesize a crop plan.
    pub async fn plan(&self, frames: &[SampledFrame], meta: &VideoMeta) -> MediaResult<CropPlan> {
        let timeline = self.analyze(frames, meta).await?;
        let compressed = compress(&timeline, self.config.center_tolerance_px);
        debug!(
            "Timeline compressed from {} to {} entries",
            timeline.len(),
            compressed.len()
        );

        CropPlanSynthesizer::new(&self.config).synthesize(
            &compressed,
            meta.duration,
            meta.width,
            meta.height,
        )
    }

    /// Probe and sample `input`, then plan it.
    ///
    /// Sampling runs on `runner`, so the caller's timeout and cancellation
    /// cover it.
    pub async fn plan_video(
        &self,
        runner: &FfmpegRunner,
        input: impl AsRef<Path>,
        work_dir: Option<&Path>,
    ) -> MediaResult<CropPlan> {
        let input = input.as_ref();
        if runner.is_cancelled() {
            return Err(MediaError::Cancelled);
        }
        let meta = probe_video(input).await?;
        let frames =
            sample_frames(runner, input, self.config.sample_fps, meta.duration, work_dir).await?;
        self.plan(frames.frames(), &meta).await
    }

    /// Release the detector backend.
    pub async fn close(self) -> MediaResult<()> {
        debug!("Closing smart-crop context ({})", self.provider.name());
        self.provider.close().await
    }

    /// Detect one frame with timeout and retries, degrading to no faces.
    async fn detect_frame(&self, frame: &SampledFrame) -> MediaResult<Vec<FaceDetection>> {
        let timeout = self.config.detection_timeout;
        let result = retry_async(
            &self.retry,
            || async move {
                match tokio::time::timeout(timeout, self.provider.detect(frame)).await {
                    Ok(result) => result,
                    Err(_) => Err(MediaError::detection_unavailable(format!(
                        "detector timed out after {} ms",
                        timeout.as_millis()
                    ))),
                }
            },
            |e| !matches!(e, MediaError::Cancelled),
        )
        .await;

        match result {
            RetryResult::Success(detections) => Ok(detections),
            RetryResult::Failed {
                error: MediaError::Cancelled,
                ..
            } => Err(MediaError::Cancelled),
            RetryResult::Failed { error, attempts } => {
                warn!(
                    frame = frame.index,
                    attempts,
                    error = %error,
                    "Face detection unavailable, treating frame as empty"
                );
                metrics::record_degraded_frame();
                Ok(Vec::new())
            }
        }
    }
}
