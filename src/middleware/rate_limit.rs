//! Per-client request limiting.
//!
//! Each client has one reference instant, the time of its last admitted
//! request. A request arriving more than a window after that instant resets
//! the count to one; otherwise it counts against the limit. Steady traffic
//! therefore never reopens the window. This is not a rolling log.
//!
//! Client identity comes from `X-Forwarded-For` when present, which any
//! client can set. Behind an untrusted proxy (or none) the limit is therefore
//! advisory, not an anti-abuse control.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

/// Header consulted before the peer address.
pub const FORWARDED_FOR: &str = "x-forwarded-for";

// == Visitor ==
#[derive(Debug, Clone, Copy)]
struct Visitor {
    /// Last admitted request; anchors both the window and the idle sweep
    last_seen: Instant,
    count: u32,
}

// == Rate Limiter ==
/// Request counters keyed by client.
#[derive(Debug)]
pub struct RateLimiter {
    visitors: HashMap<String, Visitor>,
    limit: u32,
    window: Duration,
}

/// Limiter shared between the middleware and its sweep task.
pub type SharedRateLimiter = Arc<Mutex<RateLimiter>>;

impl RateLimiter {
    /// Allows `limit` requests per client per `window`.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            visitors: HashMap::new(),
            limit,
            window,
        }
    }

    pub fn shared(limit: u32, window: Duration) -> SharedRateLimiter {
        Arc::new(Mutex::new(Self::new(limit, window)))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    // == Admit ==
    /// Records a request and decides whether it may proceed.
    pub fn admit(&mut self, client: &str) -> bool {
        self.admit_at(client, Instant::now())
    }

    /// [`admit`](Self::admit) against an explicit clock reading.
    ///
    /// Denied requests do not count and do not refresh the visitor.
    pub fn admit_at(&mut self, client: &str, now: Instant) -> bool {
        let Some(visitor) = self.visitors.get_mut(client) else {
            self.visitors.insert(
                client.to_string(),
                Visitor {
                    last_seen: now,
                    count: 1,
                },
            );
            return true;
        };

        if now.saturating_duration_since(visitor.last_seen) > self.window {
            visitor.last_seen = now;
            visitor.count = 1;
            return true;
        }

        if visitor.count >= self.limit {
            return false;
        }

        visitor.count += 1;
        visitor.last_seen = now;
        true
    }

    // == Sweep ==
    /// Drops visitors idle for more than twice the window.
    ///
    /// Returns the number of visitors removed.
    pub fn sweep_idle(&mut self) -> usize {
        self.sweep_idle_at(Instant::now())
    }

    pub fn sweep_idle_at(&mut self, now: Instant) -> usize {
        let cutoff = self.window * 2;
        let before = self.visitors.len();
        self.visitors
            .retain(|_, v| now.saturating_duration_since(v.last_seen) <= cutoff);
        before - self.visitors.len()
    }

    /// Admitted requests in the client's current window.
    pub fn visitor_count(&self, client: &str) -> Option<u32> {
        self.visitors.get(client).map(|v| v.count)
    }

    /// Number of tracked clients.
    pub fn client_count(&self) -> usize {
        self.visitors.len()
    }
}

/// Key identifying the client of a request.
///
/// The raw `X-Forwarded-For` value when non-empty, else the peer IP when the
/// server was started with connect info, else `unknown`.
pub fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rejects over-limit clients with 429 before any handler runs.
pub async fn rate_limit(
    State(limiter): State<SharedRateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request);
    let allowed = limiter.lock().await.admit(&client);

    if !allowed {
        warn!("Rate limit exceeded for {}", client);
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response();
    }

    next.run(request).await
}
