//! Upstream Module
//!
//! The tablature site the library downloads from, behind the [`TabSource`]
//! trait so the song service can be exercised without network access.

mod ultimate_guitar;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use ultimate_guitar::{UltimateGuitarClient, UltimateGuitarConfig};

// == Tab Type ==
/// Kind of document on the tab site, with the site's numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabType {
    Video,
    Tabs,
    Chords,
    Bass,
    Pro,
    Ukulele,
}

impl TabType {
    /// Numeric code used in the site's `type[]` query parameter.
    pub fn code(self) -> u32 {
        match self {
            TabType::Video => 100,
            TabType::Tabs => 200,
            TabType::Chords => 300,
            TabType::Bass => 400,
            TabType::Pro => 500,
            TabType::Ukulele => 800,
        }
    }

    /// Human readable label, also used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            TabType::Video => "Video",
            TabType::Tabs => "Tabs",
            TabType::Chords => "Chords",
            TabType::Bass => "Bass",
            TabType::Pro => "Official",
            TabType::Ukulele => "Ukulele",
        }
    }
}

impl fmt::Display for TabType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// == Search Params ==
/// A title search restricted to one document type.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub title: String,
    pub tab_type: TabType,
    pub page: u32,
}

impl SearchParams {
    pub fn new(title: impl Into<String>, tab_type: TabType) -> Self {
        Self {
            title: title.into(),
            tab_type,
            page: 1,
        }
    }
}

// == Tab Hit ==
/// One search hit as returned by the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabHit {
    pub id: i64,
    pub song_name: String,
    pub artist_name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub votes: i64,
}

// == Tab Document ==
/// Full tab or chord sheet fetched by ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabDocument {
    pub id: i64,
    pub song_name: String,
    pub artist_name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "tonality_name", default)]
    pub tonality: Option<String>,
    #[serde(default)]
    pub capo: i64,
    #[serde(default)]
    pub difficulty: Option<String>,
}

// == Upstream Error ==
/// Failures talking to the tab site.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Connection, TLS or timeout failure
    #[error("upstream request failed: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("upstream returned {status} for {context}")]
    Status { status: u16, context: String },

    /// Body did not match the expected shape
    #[error("upstream response could not be decoded: {0}")]
    Decode(String),

    /// Search returned nothing usable
    #[error("no {kind} results for {artist} - {title}")]
    NoResults {
        kind: String,
        artist: String,
        title: String,
    },
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Network(err.to_string())
        }
    }
}

// == Tab Source Trait ==
/// Search and fetch operations against a tablature site.
#[async_trait]
pub trait TabSource: Send + Sync {
    /// Runs a title search for one document type.
    async fn search(&self, params: &SearchParams) -> Result<Vec<TabHit>, UpstreamError>;

    /// Fetches a full document by ID.
    async fn fetch_tab(&self, id: i64) -> Result<TabDocument, UpstreamError>;
}
