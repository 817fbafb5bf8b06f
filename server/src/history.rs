use std::path::{Path, PathBuf};

use globe_shared::spotify::{PlaylistTracksResponse, RecentlyPlayedResponse};
use globe_shared::PlayRecord;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("failed to read history file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unrecognised history payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("history contains no playable tracks")]
    Empty,
}

/// Accepted history bodies. Tried in order; the streaming-API shapes are
/// told apart by `played_at` vs `added_at` on their items.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HistoryPayload {
    RecentlyPlayed(RecentlyPlayedResponse),
    Playlist(PlaylistTracksResponse),
    Records(Vec<PlayRecord>),
}

impl HistoryPayload {
    pub fn into_records(self) -> Vec<PlayRecord> {
        match self {
            HistoryPayload::RecentlyPlayed(r) => r.into_play_records(),
            HistoryPayload::Playlist(p) => p.into_play_records(),
            HistoryPayload::Records(records) => records,
        }
    }
}

/// Decode any accepted payload. An empty result is not an error here.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<PlayRecord>, HistoryError> {
    let payload: HistoryPayload = serde_json::from_slice(bytes)?;
    Ok(payload.into_records())
}

/// Decode a payload that is about to become the globe's history.
pub fn parse_history(bytes: &[u8]) -> Result<Vec<PlayRecord>, HistoryError> {
    let records = parse_records(bytes)?;
    if records.is_empty() {
        return Err(HistoryError::Empty);
    }
    Ok(records)
}

pub async fn load_history(path: &Path) -> Result<Vec<PlayRecord>, HistoryError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| HistoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_history(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RECORDS: &str = r#"[
        {"trackId":"a","trackName":"One","artistName":"X","albumId":"al","albumName":"Al",
         "playedAt":"2024-05-01T12:00:00Z","durationMs":1000,"uri":"spotify:track:a"},
        {"trackId":"b","trackName":"Two","artistName":"Y","albumId":"al","albumName":"Al",
         "genreTags":["jazz"],"playedAt":"2024-05-01T11:00:00Z","durationMs":2000,
         "popularity":40,"uri":"spotify:track:b"}
    ]"#;

    const RECENTLY_PLAYED: &str = r#"{"items":[{"played_at":"2024-05-01T12:00:00Z","track":{
        "id":"a","name":"One","artists":[{"id":"x","name":"X"}],
        "album":{"id":"al","name":"Al","images":[]},"duration_ms":1000,"uri":"spotify:track:a"}}],
        "limit":50,"href":"https://api.spotify.com/v1/me/player/recently-played"}"#;

    const PLAYLIST: &str = r#"{"items":[{"added_at":"2024-05-01T12:00:00Z","track":{
        "id":"p","name":"Listed","artists":[{"id":"x","name":"X"}],
        "album":{"id":"al","name":"Al","images":[]},"duration_ms":1000,"uri":"spotify:track:p"}}]}"#;

    #[test]
    fn parses_plain_record_array() {
        let records = parse_history(RECORDS.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].genre_tags, vec!["jazz"]);
        assert_eq!(records[1].popularity, 40);
    }

    #[test]
    fn parses_recently_played_response() {
        let records = parse_history(RECENTLY_PLAYED.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].track_id, "a");
        assert_eq!(records[0].artist_name, "X");
    }

    #[test]
    fn parses_playlist_response() {
        let records = parse_history(PLAYLIST.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].track_id, "p");
    }

    #[test]
    fn empty_history_is_rejected() {
        assert!(matches!(parse_history(b"[]"), Err(HistoryError::Empty)));
        assert!(matches!(
            parse_history(br#"{"items":[]}"#),
            Err(HistoryError::Empty)
        ));
        assert!(parse_records(b"[]").unwrap().is_empty());
    }

    #[test]
    fn garbage_is_a_json_error() {
        assert!(matches!(parse_history(b"{\"nope\":1}"), Err(HistoryError::Json(_))));
        assert!(matches!(parse_history(b"not json"), Err(HistoryError::Json(_))));
    }

    #[tokio::test]
    async fn loads_history_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RECORDS.as_bytes()).unwrap();
        let records = load_history(file.path()).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn missing_history_file_is_io_error() {
        let err = load_history(Path::new("/nonexistent/history.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, HistoryError::Io { .. }));
    }
}
