//! Song library data types shared by the service, the API and the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of a locally stored song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSong {
    pub artist: String,
    pub artist_slug: String,
    pub title: String,
    pub song_slug: String,
    pub key: String,
    pub has_chords: bool,
    pub has_tab: bool,
    /// Newest modification time among the stored files
    pub updated_at: Option<DateTime<Utc>>,
}

/// Full saved song: summary plus whatever payloads exist on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDetail {
    pub summary: SavedSong,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chords_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_json: Option<serde_json::Value>,
}

/// One artist directory and how many songs it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSummary {
    pub name: String,
    pub slug: String,
    pub song_count: usize,
}

/// The query a search response answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub artist: String,
    pub title: String,
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub rating: f64,
    pub votes: i64,
    pub score: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Chord and tab hits, each list best-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: SearchQuery,
    pub chords: Vec<SearchResult>,
    pub tabs: Vec<SearchResult>,
}

/// Instructs the library to fetch and persist a song.
///
/// Missing IDs are resolved by searching; a chord sheet is mandatory, a tab
/// is best effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chord_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<i64>,
}

/// Popularity score used to rank hits.
pub fn popularity_score(rating: f64, votes: i64) -> f64 {
    if votes > 0 {
        rating * (votes as f64).ln()
    } else {
        rating
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_request_camel_case() {
        let json = r#"{"artist":"Queen","title":"Bohemian Rhapsody","chordId":12}"#;
        let req: DownloadRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.chord_id, Some(12));
        assert!(req.tab_id.is_none());
    }

    #[test]
    fn test_song_detail_omits_missing_payloads() {
        let detail = SongDetail {
            summary: SavedSong {
                artist: "Queen".into(),
                artist_slug: "Queen".into(),
                title: "Bohemian Rhapsody".into(),
                song_slug: "Bohemian_Rhapsody".into(),
                key: String::new(),
                has_chords: true,
                has_tab: false,
                updated_at: None,
            },
            chords_html: Some("<html></html>".into()),
            tab_html: None,
            song_json: None,
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["summary"]["songSlug"], "Bohemian_Rhapsody");
        assert_eq!(json["chordsHtml"], "<html></html>");
        assert!(json.get("tabHtml").is_none());
        assert!(json.get("songJson").is_none());
    }

    #[test]
    fn test_popularity_score() {
        assert_eq!(popularity_score(4.5, 0), 4.5);
        assert_eq!(popularity_score(4.5, 1), 0.0);
        let score = popularity_score(4.0, 100);
        assert!((score - 4.0 * 100f64.ln()).abs() < 1e-9);
    }
}
