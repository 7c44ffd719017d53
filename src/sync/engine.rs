//! Batch orchestration over the saved-tracks list

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use crate::spotify::models::SavedTrack;
use crate::sync::pipeline::{TrackOutcome, TrackPipeline};

/// Accumulated results of one run; consumed once by the notifier.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Display names of downloaded tracks. Pure skips add nothing.
    pub downloaded: Vec<String>,
    /// Human-readable descriptions of per-track failures.
    pub errors: Vec<String>,
}

/// Run the pipeline over every candidate saved track, sequentially.
///
/// Only items with a non-empty title and id are considered. A failing track
/// is recorded and the batch moves on; nothing here aborts the run.
pub async fn run_batch(pipeline: &TrackPipeline<'_>, tracks: &[SavedTrack]) -> BatchReport {
    let candidates: Vec<(&str, &str)> = tracks
        .iter()
        .filter_map(|track| {
            let name = track.name.as_deref().filter(|n| !n.is_empty())?;
            let id = track.id.as_deref().filter(|i| !i.is_empty())?;
            Some((name, id))
        })
        .collect();

    let progress = ProgressBar::new(candidates.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut report = BatchReport::default();
    for (name, id) in candidates {
        info!("Checking {name}");
        match pipeline.process(id).await {
            Ok(TrackOutcome::Downloaded(title)) => {
                info!("Downloaded {name}");
                report.downloaded.push(title);
            }
            Ok(TrackOutcome::Skipped) => {
                info!("Skipping {name}");
            }
            Err(err) => {
                error!("Error when downloading {name}: {err}");
                report.errors.push(err.to_string());
            }
        }
        progress.inc(1);
        progress.set_message(name.to_string());
    }
    progress.finish_with_message("Done");

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::client::MetadataSource;
    use crate::spotify::models::TrackDescriptor;
    use crate::spotify::stream::{AudioSource, AudioStream};
    use crate::sync::ledger::Ledger;
    use crate::sync::pipeline::PipelineOptions;
    use crate::sync::transcode::Transcoder;
    use crate::utils::tags::Tagger;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::path::Path;

    struct FakeMeta {
        fail_id: &'static str,
    }

    #[async_trait]
    impl MetadataSource for FakeMeta {
        async fn track_info(&self, track_id: &str) -> Result<TrackDescriptor> {
            if track_id == self.fail_id {
                return Err(anyhow!("metadata endpoint returned garbage"));
            }
            Ok(TrackDescriptor {
                requested_id: track_id.to_string(),
                id: track_id.to_string(),
                artists: vec!["Artist".to_string()],
                album: "Album".to_string(),
                title: format!("Song {track_id}"),
                release_year: "2020".to_string(),
                disc_number: 1,
                track_number: 1,
                artwork_url: None,
                playable: true,
                duration_ms: 1000,
            })
        }

        async fn lyrics(&self, _track_id: &str) -> Result<String> {
            Err(anyhow!("no lyrics"))
        }

        async fn artwork(&self, _url: &str) -> Result<Bytes> {
            Ok(Bytes::new())
        }
    }

    struct OneChunkAudio;

    struct OneChunkStream {
        sent: bool,
    }

    #[async_trait]
    impl AudioStream for OneChunkStream {
        async fn next_chunk(&mut self) -> Result<Bytes> {
            if self.sent {
                Ok(Bytes::new())
            } else {
                self.sent = true;
                Ok(Bytes::from_static(b"audio"))
            }
        }
    }

    #[async_trait]
    impl AudioSource for OneChunkAudio {
        async fn open(&self, _track_id: &str) -> Result<Box<dyn AudioStream>> {
            Ok(Box::new(OneChunkStream { sent: false }))
        }
    }

    struct CopyTranscoder;

    #[async_trait]
    impl Transcoder for CopyTranscoder {
        async fn transcode(&self, src: &Path, dest: &Path) -> Result<()> {
            std::fs::copy(src, dest)?;
            Ok(())
        }
    }

    struct OkTagger;

    impl Tagger for OkTagger {
        fn write_tags(
            &self,
            _path: &Path,
            _descriptor: &TrackDescriptor,
            _artwork: Option<&[u8]>,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn saved(name: &str, id: &str) -> SavedTrack {
        SavedTrack {
            name: Some(name.to_string()),
            id: Some(id.to_string()),
            artists: Vec::new(),
        }
    }

    #[tokio::test]
    async fn one_failing_track_does_not_abort_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path());
        let meta = FakeMeta { fail_id: "t3" };
        let audio = OneChunkAudio;
        let pipeline = TrackPipeline::new(
            &meta,
            &audio,
            &CopyTranscoder,
            &OkTagger,
            &ledger,
            PipelineOptions {
                output_dir: dir.path().to_path_buf(),
                template: "{song_name}.{ext}".to_string(),
                extension: "m4a".to_string(),
            },
        );

        let tracks: Vec<SavedTrack> = (1..=5).map(|n| saved(&format!("Track {n}"), &format!("t{n}"))).collect();
        let report = run_batch(&pipeline, &tracks).await;

        assert_eq!(report.downloaded.len(), 4);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("t3"));
        // Tracks after the failure were still attempted.
        assert!(dir.path().join("Song t4.m4a").exists());
        assert!(dir.path().join("Song t5.m4a").exists());
    }

    #[tokio::test]
    async fn items_without_title_or_id_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path());
        let meta = FakeMeta { fail_id: "" };
        let audio = OneChunkAudio;
        let pipeline = TrackPipeline::new(
            &meta,
            &audio,
            &CopyTranscoder,
            &OkTagger,
            &ledger,
            PipelineOptions {
                output_dir: dir.path().to_path_buf(),
                template: "{song_name}.{ext}".to_string(),
                extension: "m4a".to_string(),
            },
        );

        let tracks = vec![
            SavedTrack {
                name: None,
                id: Some("t1".to_string()),
                artists: Vec::new(),
            },
            SavedTrack {
                name: Some("Nameless".to_string()),
                id: Some(String::new()),
                artists: Vec::new(),
            },
            saved("Real", "t2"),
        ];
        let report = run_batch(&pipeline, &tracks).await;

        assert_eq!(report.downloaded.len(), 1);
        assert!(report.errors.is_empty());
    }
}
