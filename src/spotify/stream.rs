//! Audio byte-stream transport
//!
//! The provider's audio delivery is opaque to the pipeline: anything that can
//! open a chunked byte stream for a canonical track id fits behind
//! [`AudioSource`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, Fuse};
use futures::StreamExt;
use tracing::debug;

use super::auth::AuthContext;

/// Consecutive empty reads treated as end-of-stream.
///
/// The transport occasionally yields a transient zero-length read mid-stream;
/// treating the first one as terminal truncates the download. TODO: validate
/// against the real transport whether a single empty read is in fact a
/// reliable end-of-data signal.
pub const EMPTY_READ_LIMIT: u32 = 5;

/// Content-delivery endpoint for raw audio fetches.
const STREAM_URL: &str = "https://spclient.wg.spotify.com/audio/v2/track";

/// A chunked audio byte stream. An empty chunk signals (possibly transient)
/// end-of-data; see [`EMPTY_READ_LIMIT`].
#[async_trait]
pub trait AudioStream: Send {
    async fn next_chunk(&mut self) -> Result<Bytes>;
}

/// Opens audio streams by canonical track id.
#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn open(&self, track_id: &str) -> Result<Box<dyn AudioStream>>;
}

/// HTTP-backed audio source using the session's bearer token.
pub struct HttpAudioSource<'a> {
    auth: &'a AuthContext,
    base_url: String,
}

impl<'a> HttpAudioSource<'a> {
    pub fn new(auth: &'a AuthContext) -> Self {
        Self {
            auth,
            base_url: STREAM_URL.to_string(),
        }
    }
}

#[async_trait]
impl AudioSource for HttpAudioSource<'_> {
    async fn open(&self, track_id: &str) -> Result<Box<dyn AudioStream>> {
        let url = format!("{}/{}", self.base_url, track_id);
        debug!("Opening audio stream: {url}");

        let response = self
            .auth
            .http()
            .get(&url)
            .bearer_auth(self.auth.bearer())
            .send()
            .await
            .context("Failed to open audio stream")?
            .error_for_status()
            .context("Audio stream request rejected")?;

        Ok(Box::new(HttpAudioStream::new(
            response.bytes_stream().boxed(),
        )))
    }
}

struct HttpAudioStream {
    inner: Fuse<BoxStream<'static, reqwest::Result<Bytes>>>,
}

impl HttpAudioStream {
    /// The download loop reads past the first empty chunk, so the transport
    /// is fused; a completed stream must never be polled again.
    fn new(inner: BoxStream<'static, reqwest::Result<Bytes>>) -> Self {
        Self {
            inner: inner.fuse(),
        }
    }
}

#[async_trait]
impl AudioStream for HttpAudioStream {
    async fn next_chunk(&mut self) -> Result<Bytes> {
        match self.inner.next().await {
            Some(chunk) => chunk.context("Failed to read audio chunk"),
            None => Ok(Bytes::new()),
        }
    }
}
