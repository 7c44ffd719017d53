//! spotiload - sync your saved Spotify tracks to a local music library

pub mod config;
pub mod error;
pub mod notify;
pub mod spotify;
pub mod sync;
pub mod utils;
