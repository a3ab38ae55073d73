//! FFprobe video information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Geometry and timing of a source video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoMeta {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    /// Duration in seconds
    pub duration: f64,
}

impl VideoMeta {
    /// Build metadata, rejecting values no crop geometry can be computed from.
    pub fn new(width: u32, height: u32, fps: f64, duration: f64) -> MediaResult<Self> {
        let meta = Self {
            width,
            height,
            fps,
            duration,
        };
        meta.validate()?;
        Ok(meta)
    }

    pub fn validate(&self) -> MediaResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MediaError::invalid_metadata(format!(
                "frame size {}x{}",
                self.width, self.height
            )));
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(MediaError::invalid_metadata(format!("frame rate {}", self.fps)));
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(MediaError::invalid_metadata(format!(
                "duration {}",
                self.duration
            )));
        }
        Ok(())
    }
}

/// Subset of `ffprobe -of json` we ask for.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

/// Read frame size, rate and duration of the first video stream.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<VideoMeta> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=codec_type,width,height,avg_frame_rate,r_frame_rate,duration:format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("ffprobe exited with {}", output.status),
            stderr: Some(String::from_utf8_lossy(&output.stderr).into_owned()),
        });
    }

    parse_probe_output(&output.stdout)
}

/// Extract metadata from FFprobe's JSON output.
fn parse_probe_output(stdout: &[u8]) -> MediaResult<VideoMeta> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::invalid_metadata("no video stream found"))?;

    // Container duration first, stream duration as a fallback
    let duration = probe
        .format
        .duration
        .as_deref()
        .or(video_stream.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let fps = video_stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| video_stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(0.0);

    VideoMeta::new(
        video_stream.width.unwrap_or(0),
        video_stream.height.unwrap_or(0),
        fps,
        duration,
    )
}

/// `30000/1001` or `29.97`; zero and undefined rates are `None`.
fn parse_frame_rate(s: &str) -> Option<f64> {
    let rate = if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den <= 0.0 {
            return None;
        }
        num / den
    } else {
        s.parse().ok()?
    };
    (rate > 0.0).then_some(rate)
}
