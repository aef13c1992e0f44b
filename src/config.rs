//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::middleware::TimeoutPolicy;

/// Origins the bundled frontend is served from.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "https://resonance-lab.vercel.app",
    "https://www.resonance-lab.vercel.app",
    "http://localhost:3000",
    "http://localhost:3001",
];

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen address
    pub addr: String,
    /// Root of the song library
    pub songs_dir: PathBuf,
    /// Override for the songify script location
    pub songify_script: Option<String>,
    /// Lifetime of cached list responses in seconds
    pub cache_ttl: u64,
    /// Requests allowed per client per window
    pub rate_limit: u32,
    /// Rate limit window in seconds
    pub rate_window: u64,
    /// Handler deadline in seconds
    pub request_timeout: u64,
    /// What happens to handlers that miss the deadline
    pub timeout_policy: TimeoutPolicy,
    /// Exact-match CORS allow-list
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `ADDR` - Listen address; Go-style `:8080` is accepted (default: 0.0.0.0:8080)
    /// - `SONGS_DIR` - Song library directory (default: ../songs)
    /// - `SONGIFY_SCRIPT` - song.json converter script (default: discovered)
    /// - `CACHE_TTL` - List cache TTL in seconds (default: 300)
    /// - `RATE_LIMIT` - Requests per client per window (default: 100)
    /// - `RATE_WINDOW` - Rate limit window in seconds (default: 60)
    /// - `REQUEST_TIMEOUT` - Handler deadline in seconds (default: 30)
    /// - `TIMEOUT_POLICY` - `detach` or `abort` (default: detach)
    /// - `ALLOWED_ORIGINS` - Comma-separated CORS origins
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            addr: env::var("ADDR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(|v| normalize_addr(&v))
                .unwrap_or(defaults.addr),
            songs_dir: env::var("SONGS_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.songs_dir),
            songify_script: env::var("SONGIFY_SCRIPT").ok().filter(|v| !v.is_empty()),
            cache_ttl: parse_positive("CACHE_TTL").unwrap_or(defaults.cache_ttl),
            rate_limit: parse_positive("RATE_LIMIT").unwrap_or(defaults.rate_limit),
            rate_window: parse_positive("RATE_WINDOW").unwrap_or(defaults.rate_window),
            request_timeout: parse_positive("REQUEST_TIMEOUT").unwrap_or(defaults.request_timeout),
            timeout_policy: parse_env("TIMEOUT_POLICY").unwrap_or(defaults.timeout_policy),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| parse_origins(&v))
                .filter(|origins| !origins.is_empty())
                .unwrap_or(defaults.allowed_origins),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            songs_dir: PathBuf::from("..").join("songs"),
            songify_script: None,
            cache_ttl: 300,
            rate_limit: 100,
            rate_window: 60,
            request_timeout: 30,
            timeout_policy: TimeoutPolicy::Detach,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// [`parse_env`] for counts and durations, where zero means unset.
fn parse_positive<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr + Default + PartialEq,
{
    parse_env(key).filter(|v: &T| *v != T::default())
}

/// `:8080` listens on all interfaces, as Go's net/http does.
pub fn normalize_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    }
}

/// Anchors a relative directory at the current working directory.
pub fn absolute_dir(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
