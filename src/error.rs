//! Error taxonomy for the sync run
//!
//! Config errors are the only fatal class; everything under [`TrackError`]
//! is caught at the batch boundary and reported per track.

use std::path::PathBuf;
use thiserror::Error;

/// Startup/configuration failures. These abort the process with a non-zero
/// exit code.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0} not found")]
    NotFound(PathBuf),

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in config file {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("config key `{0}` is missing or empty")]
    MissingKey(&'static str),

    #[error("could not determine the home directory")]
    NoHome,
}

/// Per-track failures. A single track's error never aborts the batch.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("failed to query metadata for track {track_id}: {source}")]
    Metadata {
        track_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("song is not playable: {0}")]
    NotPlayable(String),

    #[error("stream error for {name}: {source}")]
    Stream {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to transcode {name}: {source}")]
    Transcode {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("unable to write metadata for {name}, ensure ffmpeg is installed and added to your PATH")]
    Tagging {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Failures of the completion ledger's backing store.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("track {0} is already recorded in the ledger")]
    Duplicate(String),

    #[error("ledger database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to create ledger directory: {0}")]
    Io(#[from] std::io::Error),
}
