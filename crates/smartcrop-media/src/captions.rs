//! Subtitle burn-in for finished clips.
//!
//! Captions come from a local SRT file covering the whole source. The cues
//! inside the clip range are shifted to clip time, written to a new SRT and
//! burned into the video with FFmpeg's `subtitles` filter.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// One subtitle cue, times in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    pub start: f64,
    pub end: f64,
    /// Cue lines joined with spaces
    pub text: String,
}

/// Parse SRT text.
///
/// Sequence numbers are optional and ignored. Multi-line cue text is joined
/// into one line. Cues without text are dropped.
pub fn parse_srt(content: &str) -> MediaResult<Vec<SubtitleCue>> {
    let mut cues = Vec::new();
    let mut current: Option<SubtitleCue> = None;

    for (line_no, raw) in content.lines().enumerate() {
        let line = raw.trim_start_matches('\u{feff}').trim();

        if line.is_empty() {
            push_cue(&mut cues, current.take());
            continue;
        }

        if let Some((start, end)) = line.split_once("-->") {
            push_cue(&mut cues, current.take());
            let start = parse_srt_time(start.trim()).ok_or_else(|| bad_time(line_no, line))?;
            let end = parse_srt_time(end.trim()).ok_or_else(|| bad_time(line_no, line))?;
            current = Some(SubtitleCue {
                start,
                end,
                text: String::new(),
            });
            continue;
        }

        // Sequence numbers and stray lines before a time line are skipped
        if let Some(cue) = current.as_mut() {
            if !cue.text.is_empty() {
                cue.text.push(' ');
            }
            cue.text.push_str(line);
        }
    }
    push_cue(&mut cues, current);

    Ok(cues)
}

fn push_cue(cues: &mut Vec<SubtitleCue>, cue: Option<SubtitleCue>) {
    if let Some(cue) = cue.filter(|c| !c.text.is_empty()) {
        cues.push(cue);
    }
}

fn bad_time(line_no: usize, line: &str) -> MediaError {
    MediaError::invalid_subtitles(format!("line {}: bad time range '{}'", line_no + 1, line))
}

/// `HH:MM:SS,mmm` (or with `.`) to seconds.
fn parse_srt_time(s: &str) -> Option<f64> {
    let s = s.replacen(',', ".", 1);
    let mut parts = s.split(':');
    let (h, m, sec) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let h: u64 = h.parse().ok()?;
    let m: u64 = m.parse().ok()?;
    let sec: f64 = sec.parse().ok()?;
    if m >= 60 || !(0.0..60.0).contains(&sec) {
        return None;
    }
    Some((h * 3600 + m * 60) as f64 + sec)
}

/// Seconds to `HH:MM:SS,mmm`.
fn format_srt_time(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let (h, rem) = (total_ms / 3_600_000, total_ms % 3_600_000);
    let (m, rem) = (rem / 60_000, rem % 60_000);
    let (s, ms) = (rem / 1000, rem % 1000);
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// Cues overlapping `[start, end)`, shifted so the clip starts at 0.
///
/// Overlapping cues (common in auto-generated captions) are trimmed so only
/// one shows at a time: a cue ends where the next one starts. Times are
/// clamped to the clip.
pub fn cut_cues(cues: &[SubtitleCue], start: f64, end: f64) -> Vec<SubtitleCue> {
    let mut kept: Vec<SubtitleCue> = Vec::new();

    for cue in cues.iter().filter(|c| c.end > start && c.start < end) {
        if let Some(prev) = kept.last_mut() {
            if cue.start < prev.end {
                prev.end = cue.start;
            }
        }
        kept.push(cue.clone());
    }

    let length = end - start;
    kept.into_iter()
        .map(|cue| SubtitleCue {
            start: (cue.start - start).max(0.0),
            end: (cue.end - start).min(length),
            text: cue.text,
        })
        .filter(|cue| cue.end > cue.start)
        .collect()
}

/// Serialize cues as SRT, numbered from 1.
pub fn format_srt(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_srt_time(cue.start),
            format_srt_time(cue.end),
            cue.text
        );
    }
    out
}

/// Cut the SRT at `input` to `[start, end)` and write it to `output`.
///
/// Returns the number of cues written.
pub async fn cut_srt(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    start: f64,
    end: f64,
) -> MediaResult<usize> {
    let input = input.as_ref();
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    let content = tokio::fs::read_to_string(input).await?;
    let cues = cut_cues(&parse_srt(&content)?, start, end);
    tokio::fs::write(output.as_ref(), format_srt(&cues)).await?;

    debug!(
        "Cut {} to {:.2}s..{:.2}s ({} cues)",
        input.display(),
        start,
        end,
        cues.len()
    );
    Ok(cues.len())
}

/// Look of burned-in captions, as ASS style overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    pub font_size: u32,
    pub font_name: String,
    pub bold: bool,
    /// Distance from the bottom edge
    pub margin_v: u32,
    pub outline: u32,
    pub shadow: u32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_size: 12,
            font_name: "Roboto-Regular".to_string(),
            bold: true,
            margin_v: 40,
            outline: 2,
            shadow: 1,
        }
    }
}

impl CaptionStyle {
    /// `force_style` value, bottom-centered.
    pub fn force_style(&self) -> String {
        format!(
            "Fontsize={},Fontname={},Bold={},MarginV={},Outline={},Shadow={},Alignment=2",
            self.font_size,
            self.font_name,
            u8::from(self.bold),
            self.margin_v,
            self.outline,
            self.shadow
        )
    }
}

/// Video filter burning `srt` in with `style`.
pub fn subtitles_filter(srt: &Path, style: &CaptionStyle) -> String {
    format!(
        "subtitles=filename='{}':force_style='{}'",
        escape_filter_path(srt),
        style.force_style()
    )
}

fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

/// Burn the cues of `srt` into `input`.
pub async fn render_captions(
    runner: &FfmpegRunner,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    srt: impl AsRef<Path>,
    style: &CaptionStyle,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();
    let srt = srt.as_ref();
    if !srt.exists() {
        return Err(MediaError::FileNotFound(srt.to_path_buf()));
    }

    info!(
        "Burning captions: {} + {} -> {}",
        input.display(),
        srt.display(),
        output.display()
    );

    let cmd = FfmpegCommand::new(input, output)
        .video_filter(subtitles_filter(srt, style))
        .h264()
        .encode_quality("fast", 23)
        .audio_codec("aac");
    runner.run(&cmd).await
}
