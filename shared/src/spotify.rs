//! Shapes of the third-party streaming API payloads we accept as play
//! history, and their conversion into [`PlayRecord`]s.
//!
//! Only the fields the globe needs are modelled; everything else in the
//! responses is ignored by serde.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::PlayRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyArtist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackAlbum {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedTrack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    pub album: TrackAlbum,
    pub duration_ms: u32,
    pub uri: String,
    #[serde(default)]
    pub popularity: u8,
    #[serde(default)]
    pub preview_url: Option<String>,
}

/// One entry of `GET /me/player/recently-played`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayHistoryItem {
    pub track: DetailedTrack,
    pub played_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cursors {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentlyPlayedResponse {
    pub items: Vec<PlayHistoryItem>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub cursors: Option<Cursors>,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub href: String,
}

/// One entry of `GET /playlists/{id}/tracks`. `track` is null for removed
/// or local-only tracks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTrackItem {
    #[serde(default)]
    pub track: Option<DetailedTrack>,
    pub added_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTracksResponse {
    pub items: Vec<PlaylistTrackItem>,
}

impl DetailedTrack {
    /// Build a record for a play of this track at `played_at` (RFC 3339).
    /// Tracks without a name carry nothing worth showing and are skipped.
    pub fn to_play_record(&self, played_at: &str) -> Option<PlayRecord> {
        if self.name.trim().is_empty() {
            return None;
        }

        Some(PlayRecord {
            track_id: self.id.clone(),
            track_name: self.name.clone(),
            artist_name: self
                .artists
                .first()
                .map(|a| a.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            album_id: self.album.id.clone(),
            album_name: self.album.name.clone(),
            cover_art_url: self.album.images.first().map(|i| i.url.clone()),
            // Genres live on the artist endpoint; not fetched per track.
            genre_tags: Vec::new(),
            played_at: parse_timestamp(played_at),
            duration_ms: self.duration_ms,
            popularity: self.popularity.min(100),
            uri: self.uri.clone(),
            preview_url: self.preview_url.clone(),
        })
    }
}

impl RecentlyPlayedResponse {
    /// Records in response order. Repeated plays of one track are all kept.
    pub fn into_play_records(self) -> Vec<PlayRecord> {
        self.items
            .iter()
            .filter_map(|item| item.track.to_play_record(&item.played_at))
            .collect()
    }
}

impl PlaylistTracksResponse {
    /// Records in playlist order, using the time the track was added as its
    /// play time.
    pub fn into_play_records(self) -> Vec<PlayRecord> {
        self.items
            .iter()
            .filter_map(|item| {
                item.track
                    .as_ref()
                    .and_then(|t| t.to_play_record(&item.added_at))
            })
            .collect()
    }
}

/// Parse an RFC 3339 timestamp (fractional seconds optional). Unparsable
/// input maps to the Unix epoch so one bad item can't drop a whole batch.
pub fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_default()
}
