//! Deadline for the inner handler chain.
//!
//! The inner chain runs on its own task and races a timer. When the timer
//! wins the client gets 504 and the late response, if any, is discarded.
//! What happens to the still-running task depends on [`TimeoutPolicy`].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, warn, Instrument};

/// Fate of a handler that misses its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutPolicy {
    /// First response wins: the handler keeps running in the background and
    /// its work (disk writes, upstream calls) still happens.
    #[default]
    Detach,
    /// The handler task is aborted at its next await point.
    Abort,
}

impl FromStr for TimeoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detach" => Ok(TimeoutPolicy::Detach),
            "abort" => Ok(TimeoutPolicy::Abort),
            other => Err(format!("unknown timeout policy '{}'", other)),
        }
    }
}

impl fmt::Display for TimeoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutPolicy::Detach => f.write_str("detach"),
            TimeoutPolicy::Abort => f.write_str("abort"),
        }
    }
}

/// Deadline settings for [`timeout`].
#[derive(Debug, Clone, Copy)]
pub struct RequestTimeout {
    pub duration: Duration,
    pub policy: TimeoutPolicy,
}

impl RequestTimeout {
    pub fn new(duration: Duration, policy: TimeoutPolicy) -> Self {
        Self { duration, policy }
    }
}

/// Runs the rest of the chain with a deadline, answering 504 on overrun.
///
/// A panic in the handler task is re-raised here so the recovery layer
/// further out still converts it.
pub async fn timeout(
    State(config): State<RequestTimeout>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let handle = tokio::spawn(next.run(request).in_current_span());
    let abort = handle.abort_handle();

    match tokio::time::timeout(config.duration, handle).await {
        Ok(Ok(response)) => response,
        Ok(Err(join_err)) if join_err.is_panic() => std::panic::resume_unwind(join_err.into_panic()),
        Ok(Err(join_err)) => {
            error!("Handler task for {} {} failed: {}", method, path, join_err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Handler cancelled").into_response()
        }
        Err(_) => {
            warn!(
                "{} {} exceeded {:?}, policy={}",
                method, path, config.duration, config.policy
            );
            if config.policy == TimeoutPolicy::Abort {
                abort.abort();
            }
            (StatusCode::GATEWAY_TIMEOUT, "Request timed out").into_response()
        }
    }
}
