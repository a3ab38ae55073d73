//! Clip generation flow.
//!
//! cut → smart crop (portrait fallback) or manual portrait → optional split
//! → optional captions. Split is skipped when smart crop is requested, since
//! smart crop already composes two-speaker shots.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

use smartcrop_media::metrics::record_fallback;
use smartcrop_media::{
    cut_segment, cut_srt, render_captions, render_crop_plan, render_portrait,
    render_split_halves, CaptionStyle, FaceProvider, FfmpegRunner, MediaError, MediaResult,
    PortraitPosition, SmartCropContext,
};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::ClipLogger;

/// One step of the generation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Cut,
    SmartCrop,
    Portrait,
    Split,
    Caption,
}

/// Reframing options of a clip request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClipOptions {
    #[serde(default)]
    pub smart_crop: bool,
    #[serde(default)]
    pub portrait: bool,
    #[serde(default)]
    pub split: bool,
    /// Placement of the manual portrait crop
    #[serde(default)]
    pub portrait_position: PortraitPosition,
    /// SRT covering the whole input, burned in after the other stages
    #[serde(default)]
    pub caption: Option<PathBuf>,
    #[serde(default)]
    pub caption_style: CaptionStyle,
}

impl ClipOptions {
    /// Stages the flow runs when nothing fails and the captions have cues
    /// inside the clip.
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages = vec![Stage::Cut];
        if self.smart_crop {
            stages.push(Stage::SmartCrop);
        } else if self.portrait {
            stages.push(Stage::Portrait);
        }
        if self.split && !self.smart_crop {
            stages.push(Stage::Split);
        }
        if self.caption.is_some() {
            stages.push(Stage::Caption);
        }
        stages
    }
}

/// A clip to generate.
#[derive(Debug, Clone)]
pub struct ClipRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Clip start in source seconds
    pub start: f64,
    /// Clip end in source seconds
    pub end: f64,
    pub options: ClipOptions,
}

impl ClipRequest {
    pub fn validate(&self) -> WorkerResult<()> {
        if !self.start.is_finite() || self.start < 0.0 {
            return Err(WorkerError::invalid_request(format!(
                "start must be a non-negative time, got {}",
                self.start
            )));
        }
        if !self.end.is_finite() || self.end <= self.start {
            return Err(WorkerError::invalid_request(format!(
                "end ({}) must be after start ({})",
                self.end, self.start
            )));
        }
        if self.input == self.output {
            return Err(WorkerError::invalid_request(
                "output must differ from input",
            ));
        }
        Ok(())
    }
}

/// Result of a generated clip.
#[derive(Debug, Clone, Serialize)]
pub struct ClipOutput {
    pub clip_id: String,
    pub path: PathBuf,
    /// Stages that produced the output, in order
    pub stages: Vec<Stage>,
    /// Segment count of the executed crop plan
    pub plan_segments: Option<usize>,
    /// Why smart crop fell back to the static portrait
    pub fallback_reason: Option<String>,
}

/// Generates clips from a source video.
pub struct ClipProcessor {
    config: WorkerConfig,
    provider: Arc<dyn FaceProvider>,
    runner: FfmpegRunner,
}

impl ClipProcessor {
    pub fn new(config: WorkerConfig, provider: Arc<dyn FaceProvider>) -> Self {
        let runner = FfmpegRunner::new().with_timeout(config.ffmpeg_timeout.as_secs());
        Self {
            config,
            provider,
            runner,
        }
    }

    /// Abort running FFmpeg processes when the flag flips to `true`.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.runner = self.runner.with_cancel(cancel_rx);
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Generate one clip.
    pub async fn generate(&self, request: &ClipRequest) -> WorkerResult<ClipOutput> {
        request.validate()?;
        if !request.input.exists() {
            return Err(MediaError::FileNotFound(request.input.clone()).into());
        }
        if let Some(srt) = request.options.caption.as_ref().filter(|p| !p.exists()) {
            return Err(MediaError::FileNotFound(srt.clone()).into());
        }

        let logger = ClipLogger::new("generate");
        let span = logger.create_span();
        self.generate_inner(request, &logger).instrument(span).await
    }

    async fn generate_inner(
        &self,
        request: &ClipRequest,
        logger: &ClipLogger,
    ) -> WorkerResult<ClipOutput> {
        logger.log_start(&format!(
            "{} [{:.2}s - {:.2}s] stages={:?}",
            request.input.display(),
            request.start,
            request.end,
            request.options.stages()
        ));

        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        let work = tempfile::Builder::new()
            .prefix("smartcrop-clip-")
            .tempdir_in(&self.config.work_dir)?;

        let options = &request.options;
        let geometry = &self.config.smart_crop.output;
        let mut stages = vec![Stage::Cut];
        let mut plan_segments = None;
        let mut fallback_reason = None;

        // 1. Cut
        let cut_path = work.path().join("cut.mp4");
        cut_segment(&self.runner, &request.input, &cut_path, request.start, request.end).await?;
        let mut current = cut_path;

        // 2. Smart crop, or manual portrait
        if options.smart_crop {
            let smart_path = work.path().join("smart.mp4");
            match self.smart_crop(&current, &smart_path, work.path()).await {
                Ok(segments) => {
                    logger.log_progress(&format!("smart crop rendered ({} segments)", segments));
                    stages.push(Stage::SmartCrop);
                    plan_segments = Some(segments);
                    current = smart_path;
                }
                Err(e) if e.is_smart_crop_fallback() => {
                    logger.log_warning(&format!("smart crop failed, using portrait: {}", e));
                    record_fallback(e.kind());
                    fallback_reason = Some(e.to_string());

                    let portrait_path = work.path().join("portrait.mp4");
                    render_portrait(
                        &self.runner,
                        &current,
                        &portrait_path,
                        PortraitPosition::Center,
                        geometry,
                    )
                    .await?;
                    stages.push(Stage::Portrait);
                    current = portrait_path;
                }
                Err(e) => return Err(e.into()),
            }
        } else if options.portrait {
            let portrait_path = work.path().join("portrait.mp4");
            render_portrait(
                &self.runner,
                &current,
                &portrait_path,
                options.portrait_position,
                geometry,
            )
            .await?;
            stages.push(Stage::Portrait);
            current = portrait_path;
        }

        // 3. Split
        if options.split && !options.smart_crop {
            let split_path = work.path().join("split.mp4");
            render_split_halves(&self.runner, &current, &split_path, geometry).await?;
            stages.push(Stage::Split);
            current = split_path;
        }

        // 4. Captions
        if let Some(srt) = &options.caption {
            let clip_srt = work.path().join("clip.srt");
            let cues = cut_srt(srt, &clip_srt, request.start, request.end).await?;
            if cues == 0 {
                logger.log_warning(&format!("no captions in clip range of {}", srt.display()));
            } else {
                let caption_path = work.path().join("caption.mp4");
                render_captions(
                    &self.runner,
                    &current,
                    &caption_path,
                    &clip_srt,
                    &options.caption_style,
                )
                .await?;
                stages.push(Stage::Caption);
                current = caption_path;
            }
        }

        if let Some(parent) = request.output.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::copy(&current, &request.output).await?;

        logger.log_completion(&format!("{} stages={:?}", request.output.display(), stages));

        Ok(ClipOutput {
            clip_id: logger.clip_id().to_string(),
            path: request.output.clone(),
            stages,
            plan_segments,
            fallback_reason,
        })
    }

    /// Analyze and render the smart crop, returning the plan's segment count.
    async fn smart_crop(&self, input: &Path, output: &Path, work_dir: &Path) -> MediaResult<usize> {
        let ctx = SmartCropContext::new(self.config.smart_crop.clone(), Arc::clone(&self.provider))?;

        let result = async {
            let plan = ctx.plan_video(&self.runner, input, Some(work_dir)).await?;
            render_crop_plan(&self.runner, input, output, &plan).await?;
            Ok(plan.segments.len())
        }
        .await;

        if let Err(e) = ctx.close().await {
            tracing::warn!("Failed to close face provider: {}", e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use smartcrop_media::SampledFrame;
    use smartcrop_models::FaceDetection;

    struct NoFaces;

    #[async_trait]
    impl FaceProvider for NoFaces {
        async fn detect(&self, _frame: &SampledFrame) -> MediaResult<Vec<FaceDetection>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &'static str {
            "none"
        }
    }

    fn request(options: ClipOptions) -> ClipRequest {
        ClipRequest {
            input: PathBuf::from("/videos/source.mp4"),
            output: PathBuf::from("/clips/out.mp4"),
            start: 10.0,
            end: 40.0,
            options,
        }
    }

    #[test]
    fn test_stages() {
        let smart = ClipOptions {
            smart_crop: true,
            split: true,
            ..Default::default()
        };
        assert_eq!(smart.stages(), vec![Stage::Cut, Stage::SmartCrop]);

        let manual = ClipOptions {
            portrait: true,
            split: true,
            ..Default::default()
        };
        assert_eq!(
            manual.stages(),
            vec![Stage::Cut, Stage::Portrait, Stage::Split]
        );

        assert_eq!(ClipOptions::default().stages(), vec![Stage::Cut]);

        let captioned = ClipOptions {
            smart_crop: true,
            caption: Some(PathBuf::from("/videos/source.srt")),
            ..Default::default()
        };
        assert_eq!(
            captioned.stages(),
            vec![Stage::Cut, Stage::SmartCrop, Stage::Caption]
        );
    }

    #[test]
    fn test_smart_crop_wins_over_portrait() {
        let options = ClipOptions {
            smart_crop: true,
            portrait: true,
            ..Default::default()
        };
        assert_eq!(options.stages(), vec![Stage::Cut, Stage::SmartCrop]);
    }

    #[test]
    fn test_request_validation() {
        tokio_test::assert_ok!(request(ClipOptions::default()).validate());

        let mut bad = request(ClipOptions::default());
        bad.end = 5.0;
        assert!(matches!(bad.validate(), Err(WorkerError::InvalidRequest(_))));

        let mut bad = request(ClipOptions::default());
        bad.start = -1.0;
        tokio_test::assert_err!(bad.validate());

        let mut bad = request(ClipOptions::default());
        bad.output = bad.input.clone();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_options_from_json() {
        let options: ClipOptions =
            serde_json::from_str(r#"{"smart_crop": true, "portrait_position": "left"}"#).unwrap();
        assert!(options.smart_crop);
        assert!(!options.split);
        assert_eq!(options.portrait_position, PortraitPosition::Left);
        assert!(options.caption.is_none());

        let options: ClipOptions = serde_json::from_str(
            r#"{"portrait": true, "caption": "/subs/video.en.srt", "caption_style": {"font_size": 16}}"#,
        )
        .unwrap();
        assert_eq!(options.caption, Some(PathBuf::from("/subs/video.en.srt")));
        assert_eq!(options.caption_style.font_size, 16);
        assert_eq!(options.caption_style.font_name, "Roboto-Regular");
    }

    #[tokio::test]
    async fn test_missing_input_rejected_before_ffmpeg() {
        let processor = ClipProcessor::new(WorkerConfig::default(), Arc::new(NoFaces));
        let err = processor
            .generate(&request(ClipOptions::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Media(MediaError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_caption_file_rejected_before_ffmpeg() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source.mp4");
        tokio::fs::write(&input, b"video").await.unwrap();
        let missing = dir.path().join("source.srt");

        let mut request = request(ClipOptions {
            caption: Some(missing.clone()),
            ..Default::default()
        });
        request.input = input;
        request.output = dir.path().join("out.mp4");

        let config = WorkerConfig {
            work_dir: dir.path().join("work"),
            ..Default::default()
        };
        let err = ClipProcessor::new(config, Arc::new(NoFaces))
            .generate(&request)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::Media(MediaError::FileNotFound(p)) if p == missing));
    }
}
