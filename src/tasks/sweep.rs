//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries, bounding
//! growth from keys that are never read again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{Payload, ResponseCache};

/// Spawns a background task that periodically purges expired entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between sweeps.
/// A failed sweep is logged and retried on the next tick.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache = ResponseCache::<String>::volatile(Duration::from_secs(300))?;
/// let sweep_handle = spawn_sweep_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<T: Payload>(cache: ResponseCache<T>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            backend = cache.backend_name(),
            "Starting expiry sweep task with interval of {:?}", interval
        );

        loop {
            tokio::time::sleep(interval).await;

            match cache.purge_expired().await {
                Ok(removed) if removed > 0 => {
                    info!("Expiry sweep: removed {} expired entries", removed)
                }
                Ok(_) => debug!("Expiry sweep: no expired entries found"),
                Err(e) => warn!(error = %e, "Expiry sweep failed"),
            }
        }
    })
}
