//! Per-track download pipeline
//!
//! skip-check -> stream download -> transcode -> tag/artwork -> ledger
//! commit, with partial-artifact cleanup when any stage fails after the
//! output file was opened. The ledger and the filesystem are two
//! independently-fallible sources of truth about completion; disagreements
//! are reconciled by trusting the filesystem.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::TrackError;
use crate::spotify::client::MetadataSource;
use crate::spotify::models::TrackDescriptor;
use crate::spotify::stream::{AudioSource, EMPTY_READ_LIMIT};
use crate::sync::ledger::Ledger;
use crate::sync::naming::{file_complete, render_template, with_collision_suffix};
use crate::sync::transcode::Transcoder;
use crate::utils::tags::Tagger;

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    /// Ledger and filesystem both report completion; nothing was done.
    Skipped,
    /// The track was downloaded; carries the "artist - title" display name.
    Downloaded(String),
}

pub struct PipelineOptions {
    pub output_dir: PathBuf,
    pub template: String,
    pub extension: String,
}

pub struct TrackPipeline<'a> {
    meta: &'a dyn MetadataSource,
    audio: &'a dyn AudioSource,
    transcoder: &'a dyn Transcoder,
    tagger: &'a dyn Tagger,
    ledger: &'a Ledger,
    options: PipelineOptions,
}

impl<'a> TrackPipeline<'a> {
    pub fn new(
        meta: &'a dyn MetadataSource,
        audio: &'a dyn AudioSource,
        transcoder: &'a dyn Transcoder,
        tagger: &'a dyn Tagger,
        ledger: &'a Ledger,
        options: PipelineOptions,
    ) -> Self {
        Self {
            meta,
            audio,
            transcoder,
            tagger,
            ledger,
            options,
        }
    }

    /// Run the full pipeline for one requested track id.
    pub async fn process(&self, requested_id: &str) -> Result<TrackOutcome, TrackError> {
        let descriptor =
            self.meta
                .track_info(requested_id)
                .await
                .map_err(|source| TrackError::Metadata {
                    track_id: requested_id.to_string(),
                    source,
                })?;

        // The canonical id is authoritative from here on.
        let filename = render_template(
            &self.options.template,
            &descriptor,
            requested_id,
            &self.options.extension,
        );
        let target = self.options.output_dir.join(&filename);

        let ledger_has = self.ledger.exists(&descriptor.id)?;
        let complete = file_complete(&target);

        let path = match (ledger_has, complete) {
            (true, true) => {
                debug!("Already downloaded: {}", descriptor.display_name());
                return Ok(TrackOutcome::Skipped);
            }
            (true, false) => {
                // The ledger claims completion but the file is gone or
                // empty; trust the filesystem and heal the ledger.
                self.ledger.remove(&descriptor.id)?;
                target
            }
            // An unrelated file already owns the canonical name.
            (false, true) => with_collision_suffix(&target),
            (false, false) => target,
        };

        if !descriptor.playable {
            return Err(TrackError::NotPlayable(descriptor.display_name()));
        }

        match self.fetch_and_finish(&descriptor, &path).await {
            Ok(()) => Ok(TrackOutcome::Downloaded(descriptor.display_name())),
            Err(err) => {
                if fs::try_exists(&path).await.unwrap_or(false) {
                    if let Err(cleanup) = fs::remove_file(&path).await {
                        warn!("Failed to remove partial file {}: {cleanup}", path.display());
                    }
                }
                Err(err)
            }
        }
    }

    async fn fetch_and_finish(
        &self,
        descriptor: &TrackDescriptor,
        path: &Path,
    ) -> Result<(), TrackError> {
        let name = descriptor.display_name();

        self.download(descriptor, path)
            .await
            .map_err(|source| TrackError::Stream {
                name: name.clone(),
                source,
            })?;

        self.write_lyrics(descriptor, path).await;

        self.convert_in_place(path)
            .await
            .map_err(|source| TrackError::Transcode {
                name: name.clone(),
                source,
            })?;

        let artwork = match &descriptor.artwork_url {
            Some(url) => Some(self.meta.artwork(url).await.map_err(|source| {
                TrackError::Tagging {
                    name: name.clone(),
                    source,
                }
            })?),
            None => None,
        };
        self.tagger
            .write_tags(path, descriptor, artwork.as_deref())
            .map_err(|source| TrackError::Tagging {
                name: name.clone(),
                source,
            })?;

        let final_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.ledger.record(&descriptor.id, &final_name)?;
        Ok(())
    }

    /// Copy the audio byte stream into `path`, tolerating transient empty
    /// reads until [`EMPTY_READ_LIMIT`] consecutive ones signal end-of-data.
    async fn download(&self, descriptor: &TrackDescriptor, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create download directory")?;
        }

        // A zero-byte leftover from a crashed run blocks exclusive create.
        if fs::try_exists(path).await.unwrap_or(false) {
            fs::remove_file(path)
                .await
                .context("Failed to remove stale partial file")?;
        }

        let mut stream = self.audio.open(&descriptor.id).await?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;

        let mut empty_reads: u32 = 0;
        while empty_reads < EMPTY_READ_LIMIT {
            let chunk = stream.next_chunk().await?;
            if chunk.is_empty() {
                empty_reads += 1;
            } else {
                empty_reads = 0;
                file.write_all(&chunk)
                    .await
                    .context("Failed to write audio data")?;
            }
        }
        file.flush().await.context("Failed to flush audio file")?;

        debug!("Downloaded raw audio: {}", path.display());
        Ok(())
    }

    /// Best-effort lyrics sidecar; failures are logged and swallowed.
    async fn write_lyrics(&self, descriptor: &TrackDescriptor, path: &Path) {
        let lrc_path = path.with_extension("lrc");
        match self.meta.lyrics(&descriptor.id).await {
            Ok(text) => {
                if let Err(err) = fs::write(&lrc_path, text).await {
                    warn!(
                        "Failed to write lyrics for {}: {err}",
                        descriptor.display_name()
                    );
                }
            }
            Err(err) => debug!("No lyrics for {}: {err:#}", descriptor.display_name()),
        }
    }

    /// Re-encode the file at `path` to the target codec. The staged
    /// pre-transcode input is removed whether transcoding succeeded or not.
    async fn convert_in_place(&self, path: &Path) -> Result<()> {
        let staged = path.with_extension("tmp");
        fs::rename(path, &staged)
            .await
            .context("Failed to stage file for transcoding")?;

        let result = self.transcoder.transcode(&staged, path).await;

        if fs::try_exists(&staged).await.unwrap_or(false) {
            let _ = fs::remove_file(&staged).await;
        }
        result
    }
}
