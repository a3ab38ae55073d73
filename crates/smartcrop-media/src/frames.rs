//! Frame sampling for face detection.
//!
//! FFmpeg decodes the clip at a fixed sample rate into JPEG files inside a
//! temporary directory. The directory lives as long as the returned
//! [`SampledFrames`].

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::smart_crop::SampledFrame;

const FRAME_PREFIX: &str = "frame_";
const FRAME_EXTENSION: &str = "jpg";

/// Sampled frames backed by a temporary directory.
#[derive(Debug)]
pub struct SampledFrames {
    dir: TempDir,
    frames: Vec<SampledFrame>,
}

impl SampledFrames {
    pub fn frames(&self) -> &[SampledFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Directory holding the frame images.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Sample `input` at `sample_fps` frames per second.
///
/// Frames at or past `duration` are dropped so every timestamp lies inside
/// `[0, duration)`. Temporary files go to `work_dir` when given, the system
/// temp directory otherwise. FFmpeg runs through `runner`, so its timeout
/// and cancellation apply.
pub async fn sample_frames(
    runner: &FfmpegRunner,
    input: impl AsRef<Path>,
    sample_fps: f64,
    duration: f64,
    work_dir: Option<&Path>,
) -> MediaResult<SampledFrames> {
    let input = input.as_ref();
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }
    if !(sample_fps.is_finite() && sample_fps > 0.0) {
        return Err(MediaError::invalid_config(format!(
            "sample rate {} must be positive",
            sample_fps
        )));
    }

    let mut builder = tempfile::Builder::new();
    builder.prefix("smartcrop-frames-");
    let dir = match work_dir {
        Some(work_dir) => builder.tempdir_in(work_dir)?,
        None => builder.tempdir()?,
    };

    let pattern = dir
        .path()
        .join(format!("{}%06d.{}", FRAME_PREFIX, FRAME_EXTENSION));
    let cmd = FfmpegCommand::new(input, &pattern)
        .video_filter(format!("fps={}", sample_fps))
        .jpeg_quality(3);
    runner.run(&cmd).await?;

    let paths = list_frames(dir.path()).await?;
    let frames = index_frames(paths, sample_fps, duration);

    info!(
        frames = frames.len(),
        sample_fps,
        dir = %dir.path().display(),
        "Sampled frames for detection"
    );

    Ok(SampledFrames { dir, frames })
}

/// Frame image files in name order.
async fn list_frames(dir: &Path) -> MediaResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut paths = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_frame = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(FRAME_PREFIX))
            && path.extension().and_then(|e| e.to_str()) == Some(FRAME_EXTENSION);
        if is_frame {
            paths.push(path);
        }
    }

    // Zero-padded names sort in frame order
    paths.sort();
    debug!("Found {} frame files in {}", paths.len(), dir.display());
    Ok(paths)
}

/// Assign indices and timestamps, dropping frames at or past the clip end.
fn index_frames(paths: Vec<PathBuf>, sample_fps: f64, duration: f64) -> Vec<SampledFrame> {
    paths
        .into_iter()
        .enumerate()
        .map(|(i, path)| SampledFrame::new(i as u64, i as f64 / sample_fps, path))
        .take_while(|frame| frame.timestamp < duration)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_frames() {
        let paths: Vec<PathBuf> = (1..=5)
            .map(|i| PathBuf::from(format!("frame_{:06}.jpg", i)))
            .collect();
        let frames = index_frames(paths, 2.0, 1.6);

        let timestamps: Vec<f64> = frames.iter().map(|f| f.timestamp).collect();
        assert_eq!(timestamps, vec![0.0, 0.5, 1.0, 1.5]);
        assert_eq!(frames[3].index, 3);
        assert_eq!(frames[0].path, PathBuf::from("frame_000001.jpg"));
    }

    #[test]
    fn test_frame_at_clip_end_dropped() {
        // fps=1 on a 5 s clip often decodes a sixth image at t=5
        let paths: Vec<PathBuf> = (1..=6)
            .map(|i| PathBuf::from(format!("frame_{:06}.jpg", i)))
            .collect();
        let frames = index_frames(paths, 1.0, 5.0);

        assert_eq!(frames.len(), 5);
        assert!(frames.iter().all(|f| f.timestamp < 5.0));
    }

    #[tokio::test]
    async fn test_list_frames_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["frame_000002.jpg", "frame_000001.jpg", "notes.txt", "frame_000003.png"] {
            tokio::fs::write(dir.path().join(name), b"x").await.unwrap();
        }

        let paths = list_frames(dir.path()).await.unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["frame_000001.jpg", "frame_000002.jpg"]);
    }

    #[tokio::test]
    async fn test_missing_input() {
        let result =
            sample_frames(&FfmpegRunner::new(), "/nonexistent/clip.mp4", 1.0, 10.0, None).await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_cancelled_runner_stops_sampling() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        tokio::fs::write(&input, b"not a video").await.unwrap();

        let (tx, rx) = tokio::sync::watch::channel(false);
        tx.send(true).unwrap();
        let runner = FfmpegRunner::new().with_cancel(rx);

        let result = sample_frames(&runner, &input, 1.0, 10.0, Some(dir.path())).await;
        assert!(matches!(result, Err(MediaError::Cancelled)));
    }
}
