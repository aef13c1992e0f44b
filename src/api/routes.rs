//! API Routes
//!
//! Configures the Axum router with all song library endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    delete_handler, download_handler, get_song_handler, health_handler, list_artists_handler,
    list_songs_handler, not_found_handler, search_handler, AppState,
};
use crate::middleware::Pipeline;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/health` - Health check
/// - `GET /api/songs` - List saved songs
/// - `POST /api/songs` - Download a song from the tab site
/// - `GET /api/songs/:artist/:song` - Song detail with stored content
/// - `DELETE /api/songs/:artist/:song` - Remove a saved song
/// - `GET /api/artists` - Artists with song counts
/// - `POST /api/search` - Search the tab site
///
/// Every route, including the 404 fallback, runs inside `pipeline`.
pub fn create_router(state: AppState, pipeline: Pipeline) -> Router {
    let routes = Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/songs", get(list_songs_handler).post(download_handler))
        .route(
            "/api/songs/:artist/:song",
            get(get_song_handler).delete(delete_handler),
        )
        .route("/api/artists", get(list_artists_handler))
        .route("/api/search", post(search_handler))
        .fallback(not_found_handler)
        .with_state(state);

    pipeline.apply(routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{CorsConfig, RateLimiter, RequestTimeout, TimeoutPolicy};
    use crate::songs::SongService;
    use crate::upstream::{SearchParams, TabDocument, TabHit, TabSource, UpstreamError};
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    /// Tab site with nothing on it.
    struct EmptySource;

    #[async_trait]
    impl TabSource for EmptySource {
        async fn search(&self, _params: &SearchParams) -> Result<Vec<TabHit>, UpstreamError> {
            Ok(Vec::new())
        }

        async fn fetch_tab(&self, id: i64) -> Result<TabDocument, UpstreamError> {
            Err(UpstreamError::Status {
                status: 404,
                context: format!("tab {}", id),
            })
        }
    }

    async fn create_test_app() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let service = SongService::open(dir.path().join("songs"), Arc::new(EmptySource))
            .await
            .unwrap();
        let state = AppState::new(Arc::new(service), Duration::from_secs(300));
        let pipeline = Pipeline::new(
            CorsConfig::new(["http://localhost:3000"]),
            RateLimiter::shared(100, Duration::from_secs(60)),
            RequestTimeout::new(Duration::from_secs(30), TimeoutPolicy::Detach),
        );
        (dir, create_router(state, pipeline))
    }

    async fn send(app: Router, method: &str, uri: &str) -> axum::response::Response {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (_dir, app) = create_test_app().await;

        let response = send(app, "GET", "/api/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_empty_library_lists() {
        let (_dir, app) = create_test_app().await;

        let songs = send(app.clone(), "GET", "/api/songs").await;
        assert_eq!(songs.status(), StatusCode::OK);

        let artists = send(app, "GET", "/api/artists").await;
        assert_eq!(artists.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_song_is_404() {
        let (_dir, app) = create_test_app().await;

        let response = send(app, "GET", "/api/songs/Nobody/Nothing").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (_dir, app) = create_test_app().await;

        let response = send(app, "GET", "/api/nope").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["content-type"], "application/json");
    }

    #[tokio::test]
    async fn test_preflight_short_circuits() {
        let (_dir, app) = create_test_app().await;

        let response = send(app, "OPTIONS", "/api/songs").await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response
            .headers()
            .contains_key("access-control-allow-methods"));
    }
}
