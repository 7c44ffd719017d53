//! Audio transcoding via an external ffmpeg invocation

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

pub const TARGET_CODEC: &str = "aac";
pub const TARGET_BITRATE: &str = "160k";

/// File extension of the target container.
pub const TARGET_EXT: &str = "m4a";

/// Re-encodes a downloaded file to the target codec. A trait so the pipeline
/// can run in tests without ffmpeg installed.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, src: &Path, dest: &Path) -> Result<()>;
}

pub struct FfmpegTranscoder;

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, src: &Path, dest: &Path) -> Result<()> {
        debug!("Transcoding {} -> {}", src.display(), dest.display());

        let status = Command::new("ffmpeg")
            .args(["-y", "-hide_banner", "-loglevel", "error"])
            .arg("-i")
            .arg(src)
            .args(["-c:a", TARGET_CODEC, "-b:a", TARGET_BITRATE])
            .arg(dest)
            .status()
            .await
            .context("Failed to spawn ffmpeg")?;

        if !status.success() {
            bail!("ffmpeg exited with {status}");
        }
        Ok(())
    }
}
