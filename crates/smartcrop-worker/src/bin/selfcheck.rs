use std::path::Path;

use smartcrop_detector_client::HttpFaceDetector;
use smartcrop_media::{check_ffmpeg, check_ffprobe};
use smartcrop_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env()?;

    println!(
        "smartcrop-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_workdir(&config.work_dir).await?;

    let ffmpeg = check_ffmpeg()?;
    let ffprobe = check_ffprobe()?;
    println!("smartcrop-selfcheck: ffmpeg={} ffprobe={}", ffmpeg.display(), ffprobe.display());

    let detector = HttpFaceDetector::from_env()?;
    if !detector.health_check().await? {
        anyhow::bail!(
            "detector service at {} is not healthy",
            detector.config().base_url
        );
    }

    println!("smartcrop-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}
