//! The song library as seen by the HTTP layer.

use async_trait::async_trait;

use super::{
    ArtistSummary, DownloadRequest, SavedSong, SearchResponse, SongDetail, SongError,
};

/// Listing, reading, downloading and deleting songs.
#[async_trait]
pub trait SongRepository: Send + Sync {
    /// All saved songs ordered by artist, then title.
    async fn list_songs(&self) -> Result<Vec<SavedSong>, SongError>;

    /// Artists with at least one saved song, ordered by name.
    async fn list_artists(&self) -> Result<Vec<ArtistSummary>, SongError>;

    /// Summary and payloads of one song; [`SongError::NotFound`] when the
    /// directory does not exist.
    async fn get_song(&self, artist_slug: &str, song_slug: &str)
        -> Result<SongDetail, SongError>;

    /// Ranked chord and tab hits for a title, optionally narrowed to an artist.
    async fn search(&self, artist: &str, title: &str) -> Result<SearchResponse, SongError>;

    /// Fetches and stores the song, returning the stored detail.
    async fn download(&self, req: DownloadRequest) -> Result<SongDetail, SongError>;

    /// Removes a song directory, and its artist directory once empty.
    async fn delete(&self, artist_slug: &str, song_slug: &str) -> Result<(), SongError>;
}
