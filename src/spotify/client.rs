//! Spotify Web API client: saved-tracks listing, track metadata, lyrics,
//! artwork

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::Write as _;
use tracing::debug;

use super::auth::AuthContext;
use super::models::{
    LyricsBody, LyricsResponse, SavedTrack, SavedTracksPage, TrackDescriptor, TracksResponse,
};

const SAVED_TRACKS_URL: &str = "https://api.spotify.com/v1/me/tracks";
const TRACKS_URL: &str = "https://api.spotify.com/v1/tracks";
const LYRICS_URL: &str = "https://spclient.wg.spotify.com/color-lyrics/v2/track";

/// Saved-tracks page size; the listing advances by this offset until a short
/// page comes back.
const PAGE_LIMIT: usize = 50;

/// Track metadata operations the pipeline depends on. Split out as a trait
/// so the pipeline can be driven by fakes in tests.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Resolve a requested track id into a full descriptor. The descriptor's
    /// canonical id may differ from the requested one.
    async fn track_info(&self, track_id: &str) -> Result<TrackDescriptor>;

    /// Rendered lyrics for a canonical id, or an error when none exist.
    async fn lyrics(&self, track_id: &str) -> Result<String>;

    /// Raw artwork bytes from an album image URL.
    async fn artwork(&self, url: &str) -> Result<Bytes>;
}

pub struct SpotifyClient<'a> {
    auth: &'a AuthContext,
}

impl<'a> SpotifyClient<'a> {
    pub fn new(auth: &'a AuthContext) -> Self {
        Self { auth }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.auth
            .http()
            .get(url)
            .bearer_auth(self.auth.bearer())
            .header("Accept-Language", "en")
            .header(reqwest::header::ACCEPT, "application/json")
            .header("app-platform", "WebPlayer")
    }

    /// Album images live on a public CDN; the fetch carries no session
    /// headers.
    fn artwork_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.auth.http().get(url)
    }

    /// Fetch the full saved-tracks list, page by page.
    pub async fn saved_tracks(&self) -> Result<Vec<SavedTrack>> {
        let mut songs = Vec::new();
        let mut offset = 0usize;
        loop {
            debug!("Fetching saved tracks at offset {offset}");
            let page: SavedTracksPage = self
                .get(SAVED_TRACKS_URL)
                .query(&[("limit", PAGE_LIMIT), ("offset", offset)])
                .send()
                .await
                .context("Failed to fetch saved tracks")?
                .error_for_status()
                .context("Saved tracks request rejected")?
                .json()
                .await
                .context("Failed to parse saved tracks response")?;

            offset += PAGE_LIMIT;
            let count = page.items.len();
            songs.extend(page.items.into_iter().filter_map(|item| item.track));
            if count < PAGE_LIMIT {
                break;
            }
        }
        Ok(songs)
    }
}

#[async_trait]
impl MetadataSource for SpotifyClient<'_> {
    async fn track_info(&self, track_id: &str) -> Result<TrackDescriptor> {
        let url = format!("{TRACKS_URL}?ids={track_id}&market=from_token");
        debug!("Fetching track metadata: {url}");

        let response: TracksResponse = self
            .get(&url)
            .send()
            .await
            .context("Failed to fetch track metadata")?
            .error_for_status()
            .context("Track metadata request rejected")?
            .json()
            .await
            .context("Failed to parse track metadata response")?;

        let info = response
            .tracks
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("empty tracks response for {track_id}"))?;

        Ok(TrackDescriptor::from_info(track_id, info))
    }

    async fn lyrics(&self, track_id: &str) -> Result<String> {
        let url = format!("{LYRICS_URL}/{track_id}");
        debug!("Fetching lyrics: {url}");

        let response: LyricsResponse = self
            .get(&url)
            .send()
            .await
            .context("Failed to fetch lyrics")?
            .error_for_status()
            .context("Lyrics request rejected")?
            .json()
            .await
            .context("Failed to parse lyrics response")?;

        render_lyrics(&response.lyrics)
    }

    async fn artwork(&self, url: &str) -> Result<Bytes> {
        let response = self
            .artwork_request(url)
            .send()
            .await
            .context("Failed to fetch artwork")?;

        if !response.status().is_success() {
            bail!("Artwork not found (status {})", response.status());
        }

        response.bytes().await.context("Failed to read artwork response")
    }
}

/// Render lyrics in the `.lrc` sidecar format: plain lines when unsynced,
/// `[mm:ss.xx]words` when line-synced.
pub fn render_lyrics(lyrics: &LyricsBody) -> Result<String> {
    match lyrics.sync_type.as_str() {
        "UNSYNCED" => {
            let mut out = String::new();
            for line in &lyrics.lines {
                out.push_str(&line.words);
                out.push('\n');
            }
            Ok(out)
        }
        "LINE_SYNCED" => {
            let mut out = String::new();
            for line in &lyrics.lines {
                let ms: u64 = line.start_time_ms.parse().unwrap_or(0);
                let minutes = ms / 60_000;
                let seconds = (ms % 60_000) / 1_000;
                let millis = (ms % 1_000).to_string();
                let hundredths: String = millis.chars().take(2).collect();
                writeln!(out, "[{minutes:02}:{seconds:02}.{hundredths:0>2}]{}", line.words)?;
            }
            Ok(out)
        }
        other => bail!("unsupported lyrics sync type: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::models::LyricsLine;

    fn body(sync_type: &str, lines: &[(&str, &str)]) -> LyricsBody {
        LyricsBody {
            sync_type: sync_type.to_string(),
            lines: lines
                .iter()
                .map(|(ts, words)| LyricsLine {
                    start_time_ms: ts.to_string(),
                    words: words.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn renders_unsynced_lyrics_as_plain_lines() {
        let out = render_lyrics(&body("UNSYNCED", &[("0", "first"), ("0", "second")])).unwrap();
        assert_eq!(out, "first\nsecond\n");
    }

    #[test]
    fn renders_line_synced_timestamps() {
        let out = render_lyrics(&body(
            "LINE_SYNCED",
            &[("75500", "one"), ("61230", "two"), ("5", "three")],
        ))
        .unwrap();
        assert_eq!(out, "[01:15.50]one\n[01:01.23]two\n[00:00.05]three\n");
    }

    #[test]
    fn unknown_sync_type_is_an_error() {
        assert!(render_lyrics(&body("WORD_SYNCED", &[])).is_err());
    }

    #[test]
    fn artwork_request_carries_no_session_headers() {
        let auth = crate::spotify::AuthContext::with_token("secret").unwrap();
        let client = SpotifyClient::new(&auth);

        let api = client.get(TRACKS_URL).build().unwrap();
        assert!(api.headers().contains_key(reqwest::header::AUTHORIZATION));
        assert!(api.headers().contains_key("app-platform"));

        let artwork = client
            .artwork_request("https://i.scdn.co/image/cover")
            .build()
            .unwrap();
        assert!(!artwork.headers().contains_key(reqwest::header::AUTHORIZATION));
        assert!(!artwork.headers().contains_key("app-platform"));
    }
}
