//! Spotify-facing collaborators: session, Web API client, audio transport

pub mod auth;
pub mod client;
pub mod models;
pub mod stream;

pub use auth::AuthContext;
pub use client::{MetadataSource, SpotifyClient};
pub use stream::{AudioSource, AudioStream, HttpAudioSource};
