//! Clip generation worker binary.
//!
//! ```text
//! smartcrop-worker <input> <output> <start> <end> [--smart-crop] [--portrait[=POS]] [--split]
//!                  [--caption=SRT]
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use smartcrop_detector_client::{DetectorClientConfig, HttpFaceDetector};
use smartcrop_worker::{parse_timecode, ClipOptions, ClipProcessor, ClipRequest, WorkerConfig};

const USAGE: &str = "usage: smartcrop-worker <input> <output> <start> <end> \
                     [--smart-crop] [--portrait[=center|left|right|0.0-1.0]] [--split] \
                     [--caption=<srt>]";

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    init_tracing(config.log_json);

    if let Err(e) = run(config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("smartcrop=info".parse().expect("static directive"));

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run(config: WorkerConfig) -> anyhow::Result<()> {
    let request = parse_args(std::env::args().skip(1).collect())?;

    if let Some(addr) = config.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to install Prometheus exporter")?;
        info!("Metrics exported on {}", addr);
    }

    info!("Starting smartcrop-worker");
    info!("Worker config: {:?}", config);

    // Client retries run inside the context's per-frame detection timeout
    let detector_config =
        DetectorClientConfig::from_env().fit_within(config.smart_crop.detection_timeout);
    let detector =
        HttpFaceDetector::new(detector_config).context("failed to create detector client")?;
    if request.options.smart_crop && !detector.health_check().await? {
        // Per-frame failures degrade to empty frames, so the clip still renders.
        tracing::warn!(
            "Detector at {} is not healthy; smart crop will likely fall back",
            detector.config().base_url
        );
    }

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            let _ = cancel_tx.send(true);
        }
    });

    let processor = ClipProcessor::new(config, Arc::new(detector)).with_cancel(cancel_rx);
    let output = processor.generate(&request).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn parse_args(args: Vec<String>) -> anyhow::Result<ClipRequest> {
    let mut positional = Vec::new();
    let mut options = ClipOptions::default();

    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => bail!(USAGE),
            "--smart-crop" => options.smart_crop = true,
            "--split" => options.split = true,
            "--portrait" => options.portrait = true,
            other if other.starts_with("--portrait=") => {
                options.portrait = true;
                options.portrait_position = other["--portrait=".len()..].parse()?;
            }
            other if other.starts_with("--caption=") => {
                options.caption = Some(PathBuf::from(&other["--caption=".len()..]));
            }
            other if other.starts_with("--") => bail!("unknown flag {}\n{}", other, USAGE),
            _ => positional.push(arg),
        }
    }

    let [input, output, start, end]: [String; 4] = positional
        .try_into()
        .map_err(|_| anyhow::anyhow!(USAGE))?;

    Ok(ClipRequest {
        input: PathBuf::from(input),
        output: PathBuf::from(output),
        start: parse_timecode(&start)?,
        end: parse_timecode(&end)?,
        options,
    })
}
