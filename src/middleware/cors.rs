//! CORS header injection and preflight handling.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

const ALLOW_HEADERS: &str = "Content-Type, Accept, Accept-Language, Content-Language, Range";
const ALLOW_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";
const MAX_AGE: &str = "86400";
const EXPOSE_HEADERS: &str = "Content-Length, Content-Type";

/// Exact-match origin allow-list.
#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    allowed_origins: Arc<HashSet<String>>,
}

impl CorsConfig {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_origins: Arc::new(origins.into_iter().map(Into::into).collect()),
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        self.allowed_origins.contains(origin)
    }

    /// Value for `Access-Control-Allow-Origin`.
    ///
    /// Allowed origins are reflected, requests without an Origin (non-browser
    /// clients) get `*`, and unknown origins get nothing.
    fn allow_origin(&self, origin: Option<&str>) -> Option<HeaderValue> {
        match origin {
            None => Some(HeaderValue::from_static("*")),
            Some(origin) if self.allows(origin) => HeaderValue::from_str(origin).ok(),
            Some(_) => None,
        }
    }
}

/// Sets CORS headers on every response; `OPTIONS` is answered with 204
/// without reaching the inner layers.
pub async fn cors(State(config): State<CorsConfig>, request: Request, next: Next) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned);

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    if let Some(value) = config.allow_origin(origin.as_deref()) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE));
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSE_HEADERS),
    );

    response
}
