//! Clip generation against a real video.
//!
//! Needs FFmpeg and a sample clip at `SMARTCROP_SAMPLE_VIDEO`.

use async_trait::async_trait;
use std::sync::Arc;

use smartcrop_media::{FaceProvider, MediaError, MediaResult, SampledFrame};
use smartcrop_models::FaceDetection;
use smartcrop_worker::{ClipOptions, ClipProcessor, ClipRequest, Stage, WorkerConfig};

/// Detector that is always down.
struct Unavailable;

#[async_trait]
impl FaceProvider for Unavailable {
    async fn detect(&self, frame: &SampledFrame) -> MediaResult<Vec<FaceDetection>> {
        Err(MediaError::detection_unavailable(format!(
            "frame {}: connection refused",
            frame.index
        )))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

fn processor(work_dir: &std::path::Path) -> ClipProcessor {
    let config = WorkerConfig {
        work_dir: work_dir.to_path_buf(),
        ..Default::default()
    };
    ClipProcessor::new(config, Arc::new(Unavailable))
}

#[tokio::test]
#[ignore]
async fn test_smart_crop_without_faces_still_renders() {
    let Ok(input) = std::env::var("SMARTCROP_SAMPLE_VIDEO") else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let request = ClipRequest {
        input: input.into(),
        output: dir.path().join("out/smart.mp4"),
        start: 0.0,
        end: 5.0,
        options: ClipOptions {
            smart_crop: true,
            split: true,
            ..Default::default()
        },
    };

    let output = processor(dir.path()).generate(&request).await.unwrap();
    // Every frame degrades to no detection, which still yields a centered plan.
    assert_eq!(output.stages, vec![Stage::Cut, Stage::SmartCrop]);
    assert_eq!(output.plan_segments, Some(1));
    assert!(output.path.exists());
}

#[tokio::test]
#[ignore]
async fn test_manual_portrait_and_split() {
    let Ok(input) = std::env::var("SMARTCROP_SAMPLE_VIDEO") else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let request = ClipRequest {
        input: input.into(),
        output: dir.path().join("split.mp4"),
        start: 1.0,
        end: 4.0,
        options: ClipOptions {
            portrait: true,
            split: true,
            ..Default::default()
        },
    };

    let output = processor(dir.path()).generate(&request).await.unwrap();
    assert_eq!(
        output.stages,
        vec![Stage::Cut, Stage::Portrait, Stage::Split]
    );
    assert!(output.fallback_reason.is_none());
}

#[tokio::test]
#[ignore]
async fn test_portrait_with_captions() {
    let Ok(input) = std::env::var("SMARTCROP_SAMPLE_VIDEO") else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let srt = dir.path().join("source.srt");
    tokio::fs::write(
        &srt,
        "1\n00:00:00,500 --> 00:00:02,000\nFirst line\n\n2\n00:00:02,000 --> 00:00:03,500\nSecond line\n",
    )
    .await
    .unwrap();

    let request = ClipRequest {
        input: input.into(),
        output: dir.path().join("captioned.mp4"),
        start: 1.0,
        end: 4.0,
        options: ClipOptions {
            portrait: true,
            caption: Some(srt),
            ..Default::default()
        },
    };

    let output = processor(dir.path()).generate(&request).await.unwrap();
    assert_eq!(
        output.stages,
        vec![Stage::Cut, Stage::Portrait, Stage::Caption]
    );
    assert!(output.path.exists());
}
