//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Cache sweep: removes expired list-cache entries, once per TTL
//! - Visitor sweep: forgets idle rate-limit clients, once per window

mod cleanup;

pub use cleanup::{spawn_cache_sweep, spawn_visitor_sweep, BackgroundTasks};
