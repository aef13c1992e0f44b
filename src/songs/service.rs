//! Filesystem-backed song library.
//!
//! Layout: `<songs_dir>/<artist_slug>/<song_slug>/{chords.html, tab.html, song.json}`,
//! any subset of which may exist.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::fs;
use tracing::{info, warn};

use super::render::tab_to_html;
use super::songify::{Songify, SONG_JSON_FILE};
use super::{
    popularity_score, slugify, unsanitize_name, ArtistSummary, DownloadRequest, SavedSong,
    SearchQuery, SearchResponse, SearchResult, SongDetail, SongError, SongRepository,
};
use crate::upstream::{SearchParams, TabDocument, TabSource, TabType, UpstreamError};

/// Chord sheet file name.
pub const CHORDS_FILE: &str = "chords.html";

/// Tab file name.
pub const TAB_FILE: &str = "tab.html";

/// Fields of `song.json` that override the slug-derived summary.
#[derive(Debug, Default, Deserialize)]
struct SongMeta {
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    key: String,
}

/// Song library rooted at a songs directory.
#[derive(Clone)]
pub struct SongService {
    songs_dir: PathBuf,
    source: Arc<dyn TabSource>,
    songify: Option<Songify>,
}

impl SongService {
    // == Constructor ==
    /// Opens the library, creating `songs_dir` if needed.
    pub async fn open(
        songs_dir: impl Into<PathBuf>,
        source: Arc<dyn TabSource>,
    ) -> Result<Self, SongError> {
        let songs_dir = songs_dir.into();
        if songs_dir.as_os_str().is_empty() {
            return Err(SongError::Validation(
                "songs directory must be provided".to_string(),
            ));
        }
        fs::create_dir_all(&songs_dir).await?;

        Ok(Self {
            songs_dir,
            source,
            songify: None,
        })
    }

    /// Enables `song.json` generation after each chord download.
    pub fn with_songify(mut self, songify: Option<Songify>) -> Self {
        self.songify = songify;
        self
    }

    pub fn songs_dir(&self) -> &Path {
        &self.songs_dir
    }

    /// Directory of one song. Slugs must already be validated.
    pub fn song_path(&self, artist_slug: &str, song_slug: &str) -> PathBuf {
        self.songs_dir.join(artist_slug).join(song_slug)
    }

    /// Files currently stored for a song, in chords, tab, json order.
    pub async fn stored_files(&self, artist_slug: &str, song_slug: &str) -> Vec<PathBuf> {
        let base = self.song_path(artist_slug, song_slug);
        let mut files = Vec::new();
        for name in [CHORDS_FILE, TAB_FILE, SONG_JSON_FILE] {
            let path = base.join(name);
            if fs::metadata(&path).await.is_ok() {
                files.push(path);
            }
        }
        files
    }

    // == Summary ==
    async fn read_summary(&self, artist_slug: &str, song_slug: &str) -> Result<SavedSong, SongError> {
        let base = self.song_path(artist_slug, song_slug);
        match fs::metadata(&base).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(SongError::NotFound),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(SongError::NotFound),
            Err(e) => return Err(e.into()),
        }

        let mut summary = SavedSong {
            artist: unsanitize_name(artist_slug),
            artist_slug: artist_slug.to_string(),
            title: unsanitize_name(song_slug),
            song_slug: song_slug.to_string(),
            key: String::new(),
            has_chords: false,
            has_tab: false,
            updated_at: None,
        };

        if let Some(modified) = modified_at(&base.join(CHORDS_FILE)).await {
            summary.has_chords = true;
            summary.updated_at = newest(summary.updated_at, modified);
        }

        if let Some(modified) = modified_at(&base.join(TAB_FILE)).await {
            summary.has_tab = true;
            summary.updated_at = newest(summary.updated_at, modified);
        }

        let json_path = base.join(SONG_JSON_FILE);
        if let Some(modified) = modified_at(&json_path).await {
            summary.updated_at = newest(summary.updated_at, modified);
            if let Ok(data) = fs::read(&json_path).await {
                if let Ok(meta) = serde_json::from_slice::<SongMeta>(&data) {
                    if !meta.title.is_empty() {
                        summary.title = meta.title;
                    }
                    if !meta.artist.is_empty() {
                        summary.artist = meta.artist;
                    }
                    if !meta.key.is_empty() {
                        summary.key = meta.key;
                    }
                }
            }
        }

        Ok(summary)
    }

    async fn scan_artist_directory(&self, artist_slug: &str) -> Result<Vec<SavedSong>, SongError> {
        let mut entries = fs::read_dir(self.songs_dir.join(artist_slug)).await?;
        let mut songs = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let song_slug = entry.file_name().to_string_lossy().into_owned();
            if let Ok(summary) = self.read_summary(artist_slug, &song_slug).await {
                songs.push(summary);
            }
        }

        Ok(songs)
    }

    // == Search ==
    async fn search_by_type(
        &self,
        artist: &str,
        title: &str,
        tab_type: TabType,
    ) -> Result<Vec<SearchResult>, UpstreamError> {
        let hits = self
            .source
            .search(&SearchParams::new(title, tab_type))
            .await?;

        let wanted_artist = artist.to_lowercase();
        let mut matches: Vec<SearchResult> = hits
            .into_iter()
            .filter(|hit| artist.is_empty() || hit.artist_name.to_lowercase() == wanted_artist)
            .map(|hit| SearchResult {
                id: hit.id,
                score: popularity_score(hit.rating, hit.votes),
                title: hit.song_name,
                artist: hit.artist_name,
                rating: hit.rating,
                votes: hit.votes,
                kind: hit.kind,
            })
            .collect();

        matches.sort_by(rank);
        Ok(matches)
    }

    async fn find_best(
        &self,
        artist: &str,
        title: &str,
        tab_type: TabType,
    ) -> Result<SearchResult, UpstreamError> {
        self.search_by_type(artist, title, tab_type)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::NoResults {
                kind: tab_type.label().to_lowercase(),
                artist: artist.to_string(),
                title: title.to_string(),
            })
    }

    // == Download ==
    async fn write_tab(&self, doc: &TabDocument, dest: &Path) -> Result<(), SongError> {
        fs::write(dest, tab_to_html(doc)).await?;
        info!("Saved tab {} to {}", doc.id, dest.display());

        if dest.file_name().is_some_and(|name| name == CHORDS_FILE) {
            if let Some(songify) = &self.songify {
                songify.run(dest).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SongRepository for SongService {
    async fn list_songs(&self) -> Result<Vec<SavedSong>, SongError> {
        let mut entries = fs::read_dir(&self.songs_dir).await?;
        let mut songs = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let artist_slug = entry.file_name().to_string_lossy().into_owned();
            songs.extend(self.scan_artist_directory(&artist_slug).await?);
        }

        songs.sort_by(|a, b| a.artist.cmp(&b.artist).then_with(|| a.title.cmp(&b.title)));
        Ok(songs)
    }

    async fn list_artists(&self) -> Result<Vec<ArtistSummary>, SongError> {
        let songs = self.list_songs().await?;

        let mut by_slug: BTreeMap<String, ArtistSummary> = BTreeMap::new();
        for song in songs {
            by_slug
                .entry(song.artist_slug.clone())
                .or_insert_with(|| ArtistSummary {
                    name: song.artist.clone(),
                    slug: song.artist_slug.clone(),
                    song_count: 0,
                })
                .song_count += 1;
        }

        let mut artists: Vec<ArtistSummary> = by_slug.into_values().collect();
        artists.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.slug.cmp(&b.slug)));
        Ok(artists)
    }

    async fn get_song(&self, artist_slug: &str, song_slug: &str) -> Result<SongDetail, SongError> {
        check_segment(artist_slug)?;
        check_segment(song_slug)?;

        let summary = self.read_summary(artist_slug, song_slug).await?;
        let base = self.song_path(artist_slug, song_slug);

        let chords_html = fs::read_to_string(base.join(CHORDS_FILE)).await.ok();
        let tab_html = fs::read_to_string(base.join(TAB_FILE)).await.ok();
        let song_json = match fs::read(base.join(SONG_JSON_FILE)).await {
            Ok(data) => match serde_json::from_slice(&data) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Ignoring invalid {} for {}/{}: {}", SONG_JSON_FILE, artist_slug, song_slug, e);
                    None
                }
            },
            Err(_) => None,
        };

        Ok(SongDetail {
            summary,
            chords_html,
            tab_html,
            song_json,
        })
    }

    async fn search(&self, artist: &str, title: &str) -> Result<SearchResponse, SongError> {
        let artist = artist.trim();
        let title = title.trim();
        if title.is_empty() {
            return Err(SongError::Validation(
                "title is required for search".to_string(),
            ));
        }

        let chords = self.search_by_type(artist, title, TabType::Chords).await?;
        let tabs = self.search_by_type(artist, title, TabType::Tabs).await?;

        Ok(SearchResponse {
            query: SearchQuery {
                artist: artist.to_string(),
                title: title.to_string(),
            },
            chords,
            tabs,
        })
    }

    async fn download(&self, req: DownloadRequest) -> Result<SongDetail, SongError> {
        let artist = req.artist.trim();
        let title = req.title.trim();
        if artist.is_empty() || title.is_empty() {
            return Err(SongError::Validation(
                "both artist and title are required".to_string(),
            ));
        }

        let chord_id = match req.chord_id.filter(|id| *id > 0) {
            Some(id) => id,
            None => self.find_best(artist, title, TabType::Chords).await?.id,
        };
        let tab_id = match req.tab_id.filter(|id| *id > 0) {
            Some(id) => Some(id),
            None => self
                .find_best(artist, title, TabType::Tabs)
                .await
                .ok()
                .map(|best| best.id),
        };

        let artist_slug = slugify(artist);
        let song_slug = slugify(title);
        let base = self.song_path(&artist_slug, &song_slug);

        // Nothing touches the disk until the chord sheet is in hand.
        let chords = self.source.fetch_tab(chord_id).await?;
        fs::create_dir_all(&base).await?;
        self.write_tab(&chords, &base.join(CHORDS_FILE)).await?;

        if let Some(tab_id) = tab_id {
            let tab = self.source.fetch_tab(tab_id).await?;
            self.write_tab(&tab, &base.join(TAB_FILE)).await?;
        }

        self.get_song(&artist_slug, &song_slug).await
    }

    async fn delete(&self, artist_slug: &str, song_slug: &str) -> Result<(), SongError> {
        check_segment(artist_slug)?;
        check_segment(song_slug)?;

        let base = self.song_path(artist_slug, song_slug);
        match fs::metadata(&base).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(SongError::NotFound),
            Err(e) => return Err(e.into()),
        }

        fs::remove_dir_all(&base).await?;
        info!("Deleted {}", base.display());

        let artist_dir = self.songs_dir.join(artist_slug);
        if let Ok(mut entries) = fs::read_dir(&artist_dir).await {
            if let Ok(None) = entries.next_entry().await {
                let _ = fs::remove_dir(&artist_dir).await;
            }
        }

        Ok(())
    }
}

/// Rejects path segments that could leave the songs directory.
fn check_segment(segment: &str) -> Result<(), SongError> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
    {
        return Err(SongError::Validation(format!(
            "invalid path segment '{}'",
            segment
        )));
    }
    Ok(())
}

/// Best first: higher score, then higher rating.
fn rank(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.rating.total_cmp(&a.rating))
}

async fn modified_at(path: &Path) -> Option<DateTime<Utc>> {
    let meta = fs::metadata(path).await.ok()?;
    meta.modified().ok().map(DateTime::<Utc>::from)
}

fn newest(current: Option<DateTime<Utc>>, candidate: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match current {
        Some(existing) if existing >= candidate => Some(existing),
        _ => Some(candidate),
    }
}
