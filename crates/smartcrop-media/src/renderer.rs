//! Clip rendering through the FFmpeg CLI.
//!
//! # Entry points
//!
//! - [`cut_segment`] - cut the requested time range out of the source
//! - [`render_crop_plan`] - execute a smart-crop plan as a filter script
//! - [`render_portrait`] - static 9:16 crop, the fallback when smart crop fails
//! - [`render_split_halves`] - left and right halves side by side

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use smartcrop_models::CropPlan;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filter_graph::FilterScript;
use crate::smart_crop::OutputGeometry;

/// Horizontal placement of a static portrait crop.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortraitPosition {
    #[default]
    Center,
    Left,
    Right,
    /// 0.0 is the left edge, 1.0 the right edge
    Custom(f64),
}

impl PortraitPosition {
    /// FFmpeg expression for the crop's left edge.
    pub fn crop_x_expr(&self, crop_width: u32) -> String {
        match self {
            PortraitPosition::Center => format!("(in_w-{})/2", crop_width),
            PortraitPosition::Left => "0".to_string(),
            PortraitPosition::Right => format!("in_w-{}", crop_width),
            PortraitPosition::Custom(pos) => {
                format!("(in_w-{})*{:.2}", crop_width, pos.clamp(0.0, 1.0))
            }
        }
    }
}

impl FromStr for PortraitPosition {
    type Err = MediaError;

    /// `center`, `left`, `right` or a fraction in `[0, 1]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "center" => Ok(PortraitPosition::Center),
            "left" => Ok(PortraitPosition::Left),
            "right" => Ok(PortraitPosition::Right),
            other => match other.parse::<f64>() {
                Ok(pos) if (0.0..=1.0).contains(&pos) => Ok(PortraitPosition::Custom(pos)),
                _ => Err(MediaError::invalid_config(format!(
                    "unknown portrait position '{}'",
                    s
                ))),
            },
        }
    }
}

/// Video filter for a static portrait crop.
pub fn portrait_filter(position: PortraitPosition, output: &OutputGeometry) -> String {
    format!(
        "scale=-1:{h},crop={w}:{h}:{x}:0",
        w = output.width,
        h = output.height,
        x = position.crop_x_expr(output.width)
    )
}

/// Filter graph placing the left and right halves side by side.
pub fn split_halves_filter(output: &OutputGeometry) -> String {
    let half = output.width / 2;
    format!(
        "[0:v]crop=iw/2:ih:0:0[left];\
         [0:v]crop=iw/2:ih:iw/2:0[right];\
         [left]scale={half}:{h}[left2];\
         [right]scale={half}:{h}[right2];\
         [left2][right2]hstack=inputs=2[out]",
        half = half,
        h = output.height
    )
}

/// Cut `[start, end)` out of `input`, transcoding to H.264/AAC.
pub async fn cut_segment(
    runner: &FfmpegRunner,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    start_secs: f64,
    end_secs: f64,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();
    let duration = end_secs - start_secs;
    if !(duration > 0.0) || start_secs < 0.0 {
        return Err(MediaError::invalid_config(format!(
            "invalid time range {:.3}s..{:.3}s",
            start_secs, end_secs
        )));
    }
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    info!(
        "Cutting segment: {} -> {} (start: {:.2}s, duration: {:.2}s)",
        input.display(),
        output.display(),
        start_secs,
        duration
    );

    let cmd = FfmpegCommand::new(input, output)
        .seek(start_secs)
        .duration(duration)
        .h264()
        .encode_quality("fast", 23)
        .audio_codec("aac");
    runner.run(&cmd).await
}

/// Execute a crop plan on `input`.
///
/// The filter graph goes through a script file, since keyframed plans
/// easily exceed command-line length limits. Audio is copied when present.
pub async fn render_crop_plan(
    runner: &FfmpegRunner,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    plan: &CropPlan,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    let script = plan.to_filter_script();
    let mut script_file = tempfile::Builder::new()
        .prefix("smartcrop-graph-")
        .suffix(".txt")
        .tempfile()?;
    script_file.write_all(script.as_bytes())?;
    script_file.flush()?;

    info!(
        segments = plan.segments.len(),
        script_bytes = script.len(),
        "Rendering crop plan: {} -> {}",
        input.display(),
        output.display()
    );

    let cmd = FfmpegCommand::new(input, output)
        .filter_complex_script(script_file.path())
        .map("[out]")
        .map("0:a?")
        .h264()
        .audio_codec("copy");
    runner.run(&cmd).await
}

/// Static 9:16 crop of `input`.
pub async fn render_portrait(
    runner: &FfmpegRunner,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    position: PortraitPosition,
    geometry: &OutputGeometry,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    info!(
        ?position,
        "Rendering portrait: {} -> {}",
        input.display(),
        output.display()
    );

    let cmd = FfmpegCommand::new(input, output)
        .video_filter(portrait_filter(position, geometry))
        .h264()
        .audio_codec("aac");
    runner.run(&cmd).await
}

/// Left and right halves of `input` side by side.
pub async fn render_split_halves(
    runner: &FfmpegRunner,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    geometry: &OutputGeometry,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    info!(
        "Rendering split halves: {} -> {}",
        input.display(),
        output.display()
    );

    let cmd = FfmpegCommand::new(input, output)
        .filter_complex(split_halves_filter(geometry))
        .map("[out]")
        .map("0:a?")
        .h264()
        .audio_codec("aac");
    runner.run(&cmd).await
}
