//! Worker configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use smartcrop_media::SmartCropConfig;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Smart-crop pipeline tunables
    pub smart_crop: SmartCropConfig,
    /// Work directory for intermediate files
    pub work_dir: PathBuf,
    /// Timeout for a single FFmpeg invocation
    pub ffmpeg_timeout: Duration,
    /// Prometheus listener address; metrics are not exported when unset
    pub metrics_addr: Option<SocketAddr>,
    /// Emit JSON logs instead of human-readable ones
    pub log_json: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            smart_crop: SmartCropConfig::default(),
            work_dir: std::env::temp_dir().join("smartcrop"),
            ffmpeg_timeout: Duration::from_secs(1800), // 30 minutes
            metrics_addr: None,
            log_json: false,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> WorkerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let mut smart_crop = defaults.smart_crop;

        if let Some(fps) = parse(&lookup, "SMARTCROP_SAMPLE_FPS")? {
            smart_crop.sample_fps = fps;
        }
        if let Some(ms) = parse(&lookup, "SMARTCROP_DETECTION_TIMEOUT_MS")? {
            smart_crop.detection_timeout = Duration::from_millis(ms);
        }
        if let Some(retries) = parse(&lookup, "SMARTCROP_DETECTION_RETRIES")? {
            smart_crop.detection_retries = retries;
        }
        if let Some(parallel) = parse(&lookup, "SMARTCROP_MAX_PARALLEL_DETECTIONS")? {
            smart_crop.max_parallel_detections = parallel;
        }
        smart_crop
            .validate()
            .map_err(|e| WorkerError::config_error(e.to_string()))?;

        Ok(Self {
            smart_crop,
            work_dir: lookup("SMARTCROP_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            ffmpeg_timeout: parse(&lookup, "SMARTCROP_FFMPEG_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.ffmpeg_timeout),
            metrics_addr: parse(&lookup, "METRICS_ADDR")?,
            log_json: lookup("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }
}

fn parse<F, T>(lookup: &F, key: &str) -> WorkerResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| WorkerError::config_error(format!("{} has invalid value '{}'", key, raw))),
        _ => Ok(None),
    }
}
