//! Resonance Scraper - chord and tab library server
//!
//! Searches a tablature site, downloads chord sheets and tabs into per-song
//! directories, and serves the library over a small JSON API behind a
//! CORS, panic recovery, rate limit and timeout pipeline.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod songs;
pub mod tasks;
pub mod upstream;

pub use api::{create_router, AppState};
pub use config::Config;
pub use middleware::Pipeline;
pub use songs::{SongRepository, SongService};
pub use tasks::BackgroundTasks;
