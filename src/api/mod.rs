//! API Module
//!
//! HTTP handlers and routing for the song library REST API.
//!
//! # Endpoints
//! - `GET /api/health` - Health check
//! - `GET|POST /api/songs` - List saved songs, download a new one
//! - `GET|DELETE /api/songs/:artist/:song` - Read or remove one song
//! - `GET /api/artists` - Artists with song counts
//! - `POST /api/search` - Search the tab site

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
