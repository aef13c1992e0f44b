//! Songs Module
//!
//! The local song library: folder naming, the on-disk layout, downloads from
//! the tab site and `song.json` post-processing.

mod model;
mod render;
mod repository;
mod service;
mod slug;
mod songify;

use thiserror::Error;

use crate::upstream::UpstreamError;

pub use model::{
    popularity_score, ArtistSummary, DownloadRequest, SavedSong, SearchQuery, SearchResponse,
    SearchResult, SongDetail,
};
pub use render::{escape_html, tab_to_html};
pub use repository::SongRepository;
pub use service::{SongService, CHORDS_FILE, TAB_FILE};
pub use slug::{slugify, unsanitize_name, PLACEHOLDER_SLUG};
pub use songify::{Songify, SONG_JSON_FILE};

// == Song Error ==
/// Failures of song library operations.
#[derive(Error, Debug)]
pub enum SongError {
    /// The song directory does not exist
    #[error("song not found")]
    NotFound,

    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// The tab site failed or had nothing to offer
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The song.json converter failed
    #[error("{0}")]
    Songify(String),

    /// Filesystem failure
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}
