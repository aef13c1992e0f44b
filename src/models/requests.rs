//! Request DTOs for the song API
//!
//! Defines the structure of incoming HTTP request bodies. The download body
//! is [`crate::songs::DownloadRequest`], shared with the CLI.

use serde::Deserialize;

/// Request body for POST /api/search
///
/// # Fields
/// - `artist`: Optional artist name used to filter hits
/// - `title`: Song title to search for (required)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_deserialize() {
        let json = r#"{"artist": "Queen", "title": "Bohemian Rhapsody"}"#;
        let req: SearchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.artist, "Queen");
        assert_eq!(req.title, "Bohemian Rhapsody");
    }

    #[test]
    fn test_search_request_missing_fields_default_to_empty() {
        let req: SearchRequest = serde_json::from_str("{}").unwrap();
        assert!(req.artist.is_empty());
        assert!(req.title.is_empty());
    }
}
