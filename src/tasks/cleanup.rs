//! Periodic Sweeps
//!
//! Background tasks that reclaim expired cache entries and idle rate-limit
//! visitors. Reads never depend on them; they only bound memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::middleware::SharedRateLimiter;

/// Spawns a task that removes expired cache entries every `interval`.
///
/// The write lock is held only for the sweep itself.
pub fn spawn_cache_sweep<V>(cache: Arc<RwLock<CacheStore<V>>>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("Starting cache sweep with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.write().await.cleanup_expired();

            if removed > 0 {
                info!("Cache sweep: removed {} expired entries", removed);
            } else {
                debug!("Cache sweep: no expired entries found");
            }
        }
    })
}

/// Spawns a task that drops visitors idle for over twice the window,
/// running once per window.
pub fn spawn_visitor_sweep(limiter: SharedRateLimiter) -> JoinHandle<()> {
    tokio::spawn(async move {
        let interval = limiter.lock().await.window();
        info!("Starting rate limit sweep with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = limiter.lock().await.sweep_idle();

            if removed > 0 {
                info!("Rate limit sweep: removed {} idle visitors", removed);
            } else {
                debug!("Rate limit sweep: no idle visitors");
            }
        }
    })
}

/// Owner of the background sweeps.
///
/// Tasks are aborted by [`shutdown`](Self::shutdown) or when this value is
/// dropped, so they never outlive the components they sweep.
#[derive(Debug, Default)]
pub struct BackgroundTasks {
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Aborts every task and waits for them to finish.
    pub async fn shutdown(mut self) {
        let handles = std::mem::take(&mut self.handles);
        for handle in &handles {
            handle.abort();
        }
        for handle in handles {
            let _ = handle.await;
        }
    }
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}
