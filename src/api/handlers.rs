//! API Handlers
//!
//! HTTP request handlers for each song library endpoint.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{CacheStore, ARTISTS_LIST_KEY, SONGS_LIST_KEY};
use crate::error::{ApiError, Result};
use crate::models::{HealthResponse, SearchRequest};
use crate::songs::{DownloadRequest, SearchResponse, SongDetail, SongError, SongRepository};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Song library
    pub repo: Arc<dyn SongRepository>,
    /// Serialized list responses
    pub cache: Arc<RwLock<CacheStore<Value>>>,
    /// Bumped on every library write, under the cache write lock
    generation: Arc<AtomicU64>,
}

impl AppState {
    /// Creates a new AppState with an empty list cache.
    pub fn new(repo: Arc<dyn SongRepository>, cache_ttl: Duration) -> Self {
        Self {
            repo,
            cache: Arc::new(RwLock::new(CacheStore::new(cache_ttl))),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Drops every cached list after the library changed.
    async fn invalidate_lists(&self) {
        let mut cache = self.cache.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        cache.invalidate(SONGS_LIST_KEY);
        cache.invalidate(ARTISTS_LIST_KEY);
    }

    /// Serves `key` from the cache, loading and caching it on a miss.
    ///
    /// A load that overlapped a write is returned but not cached.
    async fn cached<T, F, Fut>(&self, key: &str, load: F) -> Result<Json<Value>>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, SongError>>,
    {
        if let Some(hit) = self.cache.read().await.get(key) {
            return Ok(Json(hit));
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let fresh = load().await?;
        let value = serde_json::to_value(fresh).map_err(|e| ApiError::Internal(e.to_string()))?;

        let mut cache = self.cache.write().await;
        if self.generation.load(Ordering::SeqCst) == generation {
            cache.set(key, value.clone());
        }
        Ok(Json(value))
    }
}

/// Handler for GET /api/health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /api/songs
///
/// All saved songs sorted by artist then title; cached.
pub async fn list_songs_handler(State(state): State<AppState>) -> Result<Json<Value>> {
    let repo = state.repo.clone();
    state
        .cached(SONGS_LIST_KEY, || async move { repo.list_songs().await })
        .await
}

/// Handler for GET /api/artists
pub async fn list_artists_handler(State(state): State<AppState>) -> Result<Json<Value>> {
    let repo = state.repo.clone();
    state
        .cached(ARTISTS_LIST_KEY, || async move { repo.list_artists().await })
        .await
}

/// Handler for GET /api/songs/:artist/:song
pub async fn get_song_handler(
    State(state): State<AppState>,
    Path((artist, song)): Path<(String, String)>,
) -> Result<Json<SongDetail>> {
    let detail = state.repo.get_song(&artist, &song).await?;
    Ok(Json(detail))
}

/// Handler for POST /api/search
pub async fn search_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>> {
    let Json(req) = payload?;
    let results = state.repo.search(&req.artist, &req.title).await?;
    Ok(Json(results))
}

/// Handler for POST /api/songs
///
/// Downloads and stores a song, then invalidates the cached lists.
pub async fn download_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Json<SongDetail>> {
    let Json(req) = payload?;
    let detail = state.repo.download(req).await?;

    state.invalidate_lists().await;
    info!(
        "Downloaded {}/{}",
        detail.summary.artist_slug, detail.summary.song_slug
    );
    Ok(Json(detail))
}

/// Handler for DELETE /api/songs/:artist/:song
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((artist, song)): Path<(String, String)>,
) -> Result<StatusCode> {
    state.repo.delete(&artist, &song).await?;

    state.invalidate_lists().await;
    Ok(StatusCode::NO_CONTENT)
}

/// Fallback for unknown routes.
pub async fn not_found_handler() -> ApiError {
    ApiError::NotFound("route".to_string())
}
