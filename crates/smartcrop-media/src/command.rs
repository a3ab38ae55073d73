//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// Stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// One FFmpeg invocation.
///
/// Arguments land as `-y -hide_banner -loglevel <level> <input opts> -i <input>
/// <output opts> <output>`.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    input_opts: Vec<String>,
    output_opts: Vec<String>,
    log_level: &'static str,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_opts: Vec::new(),
            output_opts: Vec::new(),
            log_level: "error",
        }
    }

    /// Option applied to the input (placed before `-i`).
    pub fn input_option(mut self, flag: &str, value: impl Into<String>) -> Self {
        self.input_opts.push(flag.to_string());
        self.input_opts.push(value.into());
        self
    }

    /// Option applied to the output (placed after `-i`).
    pub fn option(mut self, flag: &str, value: impl Into<String>) -> Self {
        self.output_opts.push(flag.to_string());
        self.output_opts.push(value.into());
        self
    }

    /// Start reading the input at `seconds` (input seek).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_option("-ss", format!("{:.3}", seconds))
    }

    /// Read at most `seconds` of input.
    pub fn duration(self, seconds: f64) -> Self {
        self.input_option("-t", format!("{:.3}", seconds))
    }

    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.option("-vf", filter)
    }

    pub fn filter_complex(self, graph: impl Into<String>) -> Self {
        self.option("-filter_complex", graph)
    }

    /// Read the filter graph from a file instead of the command line.
    pub fn filter_complex_script(self, script: impl AsRef<Path>) -> Self {
        let script = script.as_ref().to_string_lossy().into_owned();
        self.option("-filter_complex_script", script)
    }

    /// Map a stream specifier or filter output label.
    pub fn map(self, spec: impl Into<String>) -> Self {
        self.option("-map", spec)
    }

    /// Encode video with libx264.
    pub fn h264(self) -> Self {
        self.option("-c:v", "libx264")
    }

    /// libx264 preset and constant rate factor.
    pub fn encode_quality(self, preset: &str, crf: u8) -> Self {
        self.option("-preset", preset).option("-crf", crf.to_string())
    }

    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.option("-c:a", codec)
    }

    /// JPEG quality for image outputs (2 best, 31 worst).
    pub fn jpeg_quality(self, quality: u8) -> Self {
        self.option("-q:v", quality.to_string())
    }

    pub fn log_level(mut self, level: &'static str) -> Self {
        self.log_level = level;
        self
    }

    pub fn build_args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["-y", "-hide_banner", "-loglevel", self.log_level]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.extend(self.input_opts.iter().cloned());
        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().into_owned());
        args.extend(self.output_opts.iter().cloned());
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

/// Runner for FFmpeg commands with timeout and cancellation.
#[derive(Debug, Default)]
pub struct FfmpegRunner {
    /// Cancellation signal receiver
    cancel_rx: Option<watch::Receiver<bool>>,
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Whether the cancel flag has already been raised.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Run an FFmpeg command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        if self.is_cancelled() {
            return Err(MediaError::Cancelled);
        }
        check_ffmpeg()?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr_handle = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut reader = BufReader::new(stderr).lines();
                let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
                while let Ok(Some(line)) = reader.next_line().await {
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                Vec::from(tail).join("\n")
            })
        });

        let result = self.wait_for_completion(&mut child).await;

        let stderr = match stderr_handle {
            Some(handle) => handle.await.ok().filter(|s| !s.is_empty()),
            None => None,
        };

        match result {
            Err(MediaError::FfmpegFailed {
                message, exit_code, ..
            }) => Err(MediaError::ffmpeg_failed(message, stderr, exit_code)),
            other => other,
        }
    }

    /// Wait for child process with cancellation and timeout.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<()> {
        let cancelled = wait_cancelled(self.cancel_rx.clone());
        let timeout = async {
            match self.timeout_secs {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending::<()>().await,
            }
        };

        let outcome = tokio::select! {
            status = child.wait() => WaitOutcome::Exited(status),
            _ = timeout => WaitOutcome::TimedOut,
            _ = cancelled => WaitOutcome::Cancelled,
        };

        let status = match outcome {
            WaitOutcome::Exited(status) => status?,
            WaitOutcome::TimedOut => {
                let secs = self.timeout_secs.unwrap_or_default();
                warn!("FFmpeg timed out after {} seconds, killing process", secs);
                let _ = child.kill().await;
                return Err(MediaError::Timeout(secs));
            }
            WaitOutcome::Cancelled => {
                info!("FFmpeg cancelled, killing process");
                let _ = child.kill().await;
                return Err(MediaError::Cancelled);
            }
        };

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                None,
                status.code(),
            ))
        }
    }
}

enum WaitOutcome {
    Exited(std::io::Result<std::process::ExitStatus>),
    TimedOut,
    Cancelled,
}

/// Resolve once the cancel flag flips to true; never resolves without a receiver.
async fn wait_cancelled(cancel_rx: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = cancel_rx else {
        return std::future::pending().await;
    };
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender dropped without cancelling
            return std::future::pending().await;
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let args = FfmpegCommand::new("input.mp4", "output.mp4")
            .seek(10.0)
            .duration(30.0)
            .h264()
            .encode_quality("fast", 23)
            .build_args();

        assert_eq!(
            args,
            [
                "-y", "-hide_banner", "-loglevel", "error", "-ss", "10.000", "-t", "30.000",
                "-i", "input.mp4", "-c:v", "libx264", "-preset", "fast", "-crf", "23",
                "output.mp4",
            ]
        );
    }

    #[test]
    fn test_log_level_override() {
        let args = FfmpegCommand::new("a.mp4", "b.mp4")
            .log_level("warning")
            .build_args();
        assert_eq!(args[3], "warning");
    }

    #[test]
    fn test_filter_script_mapping() {
        let args = FfmpegCommand::new("in.mp4", "out.mp4")
            .filter_complex_script("/tmp/graph.txt")
            .map("[out]")
            .map("0:a?")
            .build_args();

        let joined = args.join(" ");
        assert!(joined.contains("-filter_complex_script /tmp/graph.txt -map [out] -map 0:a?"));
    }

    #[tokio::test]
    async fn test_cancelled_runner_does_not_spawn() {
        let (tx, rx) = watch::channel(false);
        let runner = FfmpegRunner::new().with_cancel(rx);
        assert!(!runner.is_cancelled());

        tx.send(true).unwrap();
        assert!(runner.is_cancelled());
        let cmd = FfmpegCommand::new("in.mp4", "out.mp4");
        assert!(matches!(runner.run(&cmd).await, Err(MediaError::Cancelled)));
    }

    #[tokio::test]
    async fn test_wait_cancelled_resolves_on_flag() {
        let (tx, rx) = watch::channel(false);
        let waiter = tokio::spawn(wait_cancelled(Some(rx)));
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
