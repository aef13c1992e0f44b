//! Cache Module
//!
//! Provides in-memory caching with TTL expiration for the list endpoints.

mod entry;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use store::CacheStore;

// == Public Constants ==
/// Cache key for the saved-song list
pub const SONGS_LIST_KEY: &str = "songs:list";

/// Cache key for the artist list
pub const ARTISTS_LIST_KEY: &str = "artists:list";
