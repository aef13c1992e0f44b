//! Middleware Module
//!
//! The request pipeline wrapped around the API routes, outermost first:
//!
//! 1. CORS headers and `OPTIONS` preflight short-circuit
//! 2. Panic recovery (500 JSON)
//! 3. Per-client rate limiting (429)
//! 4. Access logging (method, path, status, latency)
//! 5. Handler deadline (504)
//!
//! Logging wraps the deadline so a timed-out request is recorded with the 504
//! the client actually received.

pub mod cors;
pub mod rate_limit;
pub mod recover;
pub mod timeout;

use axum::{middleware::from_fn_with_state, Router};
use tower::ServiceBuilder;
use tower_http::{
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::Level;

pub use cors::CorsConfig;
pub use rate_limit::{RateLimiter, SharedRateLimiter};
pub use timeout::{RequestTimeout, TimeoutPolicy};

use crate::config::Config;

/// Shared pieces of the request pipeline.
#[derive(Clone)]
pub struct Pipeline {
    pub cors: CorsConfig,
    pub rate_limiter: SharedRateLimiter,
    pub timeout: RequestTimeout,
}

impl Pipeline {
    pub fn new(cors: CorsConfig, rate_limiter: SharedRateLimiter, timeout: RequestTimeout) -> Self {
        Self {
            cors,
            rate_limiter,
            timeout,
        }
    }

    /// Builds the pipeline from configuration with a fresh limiter.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CorsConfig::new(config.allowed_origins.iter().cloned()),
            RateLimiter::shared(config.rate_limit, config.rate_window()),
            RequestTimeout::new(config.request_timeout(), config.timeout_policy),
        )
    }

    /// Wraps every route of `router` in the pipeline.
    pub fn apply(self, router: Router) -> Router {
        router.layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(self.cors, cors::cors))
                .layer(recover::layer())
                .layer(from_fn_with_state(self.rate_limiter, rate_limit::rate_limit))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(LatencyUnit::Millis),
                        ),
                )
                .layer(from_fn_with_state(self.timeout, timeout::timeout)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
        routing::get,
    };
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tower::ServiceExt;

    /// Log sink shared with a test subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(Level::INFO)
            .with_ansi(false)
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    fn app(limit: u32, timeout: Duration) -> Router {
        app_with(limit, RequestTimeout::new(timeout, TimeoutPolicy::Detach))
    }

    fn app_with(limit: u32, timeout: RequestTimeout) -> Router {
        let routes = Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route(
                "/boom",
                get(|| async {
                    if true {
                        panic!("handler exploded");
                    }
                    "unreachable"
                }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    "late"
                }),
            );

        Pipeline::new(
            CorsConfig::new(["http://localhost:3000"]),
            RateLimiter::shared(limit, Duration::from_secs(60)),
            timeout,
        )
        .apply(routes)
    }

    async fn send(app: Router, method: &str, uri: &str) -> Response {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_rejections_still_carry_cors_headers() {
        let app = app(1, Duration::from_secs(30));

        assert_eq!(send(app.clone(), "GET", "/ok").await.status(), StatusCode::OK);

        let limited = send(app, "GET", "/ok").await;
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            limited.headers()["access-control-allow-origin"],
            "http://localhost:3000"
        );
    }

    #[tokio::test]
    async fn test_preflight_is_not_rate_limited() {
        let app = app(1, Duration::from_secs(30));

        for _ in 0..5 {
            let response = send(app.clone(), "OPTIONS", "/ok").await;
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }
        assert_eq!(send(app, "GET", "/ok").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_panic_behind_timeout_is_recovered() {
        let app = app(100, Duration::from_secs(30));

        let response = send(app, "GET", "/boom").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_handler_times_out() {
        let app = app(100, Duration::from_secs(1));

        let response = send(app, "GET", "/slow").await;

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    async fn access_log_for_timeout(policy: TimeoutPolicy) -> String {
        let (logs, _guard) = capture_logs();
        let app = app_with(100, RequestTimeout::new(Duration::from_secs(1), policy));

        let response = send(app, "GET", "/slow").await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

        logs.contents()
            .lines()
            .filter(|line| line.contains("finished processing request"))
            .map(str::to_owned)
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test(start_paused = true)]
    async fn test_access_log_records_timeout_when_aborted() {
        let access = access_log_for_timeout(TimeoutPolicy::Abort).await;

        assert_eq!(access.lines().count(), 1);
        assert!(access.contains("status=504"));
        assert!(access.contains("latency="));
    }

    #[tokio::test(start_paused = true)]
    async fn test_access_log_records_timeout_when_detached() {
        let access = access_log_for_timeout(TimeoutPolicy::Detach).await;

        assert_eq!(access.lines().count(), 1);
        assert!(access.contains("status=504"));
        assert!(!access.contains("status=200"));
    }
}
