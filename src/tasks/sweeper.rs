//! Expiry Sweep Task
//!
//! Background task that periodically evicts expired cache entries, so keys
//! that are never read again still release their memory.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a task that calls [`SharedCache::evict_expired`] every
/// `sweep_interval_secs` seconds, as configured through
/// [`CacheConfig::sweep_interval_secs`](crate::CacheConfig). An interval of
/// zero is treated as one second.
///
/// The task runs until aborted through the returned handle. Each sweep holds
/// the cache lock only for the duration of one eviction pass.
///
/// # Example
/// ```ignore
/// let config = CacheConfig::new(1000).with_sweep_interval(5);
/// let cache = Cache::with_config(config)?.threadsafe();
/// let sweeper = spawn_sweeper(cache.clone());
/// // Later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_sweeper(cache: SharedCache) -> JoinHandle<()> {
    let interval = Duration::from_secs(cache.sweep_interval_secs().max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweeper with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.evict_expired();

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}
