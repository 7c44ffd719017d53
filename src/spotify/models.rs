//! Spotify Web API response models

use serde::Deserialize;

/// One page of the saved-tracks listing.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedTracksPage {
    #[serde(default)]
    pub items: Vec<SavedItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavedItem {
    /// Can be null for tracks removed from the catalog.
    pub track: Option<SavedTrack>,
}

/// Track stub from the saved-tracks listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavedTrack {
    pub name: Option<String>,
    pub id: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

/// Response of the track metadata endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TracksResponse {
    #[serde(default)]
    pub tracks: Vec<TrackInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    pub album: AlbumInfo,
    #[serde(default)]
    pub disc_number: u32,
    #[serde(default)]
    pub track_number: u32,
    #[serde(default)]
    pub is_playable: bool,
    #[serde(default)]
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumInfo {
    pub name: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub images: Vec<ImageInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageInfo {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

// Color-lyrics endpoint models

#[derive(Debug, Clone, Deserialize)]
pub struct LyricsResponse {
    pub lyrics: LyricsBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LyricsBody {
    #[serde(rename = "syncType")]
    pub sync_type: String,
    #[serde(default)]
    pub lines: Vec<LyricsLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LyricsLine {
    #[serde(rename = "startTimeMs", default)]
    pub start_time_ms: String,
    #[serde(default)]
    pub words: String,
}

/// Everything the pipeline needs to know about one track.
///
/// `id` is the canonical identifier returned by the metadata service; it is
/// authoritative for ledger, filename and stream operations even when it
/// differs from the id originally requested.
#[derive(Debug, Clone)]
pub struct TrackDescriptor {
    pub requested_id: String,
    pub id: String,
    pub artists: Vec<String>,
    pub album: String,
    pub title: String,
    pub release_year: String,
    pub disc_number: u32,
    pub track_number: u32,
    pub artwork_url: Option<String>,
    pub playable: bool,
    pub duration_ms: u64,
}

impl TrackDescriptor {
    pub fn from_info(requested_id: &str, info: TrackInfo) -> Self {
        let artwork_url = info
            .album
            .images
            .iter()
            .max_by_key(|image| image.width.unwrap_or(0))
            .map(|image| image.url.clone());
        let release_year = info
            .album
            .release_date
            .split('-')
            .next()
            .unwrap_or_default()
            .to_string();

        Self {
            requested_id: requested_id.to_string(),
            id: info.id,
            artists: info.artists.into_iter().map(|a| a.name).collect(),
            album: info.album.name,
            title: info.name,
            release_year,
            disc_number: info.disc_number,
            track_number: info.track_number,
            artwork_url,
            playable: info.is_playable,
            duration_ms: info.duration_ms,
        }
    }

    /// "artist - title", as reported in logs and notifications.
    pub fn display_name(&self) -> String {
        let artist = self.artists.first().map(String::as_str).unwrap_or("");
        format!("{} - {}", artist, self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_picks_widest_artwork_and_year() {
        let info = TrackInfo {
            id: "canonical".to_string(),
            name: "Song".to_string(),
            artists: vec![ArtistRef {
                name: "Artist".to_string(),
            }],
            album: AlbumInfo {
                name: "Album".to_string(),
                release_date: "1997-05-21".to_string(),
                images: vec![
                    ImageInfo {
                        url: "small".to_string(),
                        width: Some(64),
                        height: Some(64),
                    },
                    ImageInfo {
                        url: "large".to_string(),
                        width: Some(640),
                        height: Some(640),
                    },
                ],
            },
            disc_number: 1,
            track_number: 3,
            is_playable: true,
            duration_ms: 1000,
        };

        let descriptor = TrackDescriptor::from_info("requested", info);
        assert_eq!(descriptor.id, "canonical");
        assert_eq!(descriptor.requested_id, "requested");
        assert_eq!(descriptor.artwork_url.as_deref(), Some("large"));
        assert_eq!(descriptor.release_year, "1997");
        assert_eq!(descriptor.display_name(), "Artist - Song");
    }
}
