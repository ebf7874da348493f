//! Safety-net Sweep Task
//!
//! Background task that periodically purges expired entries and, when the
//! store is still above its cleanup threshold, runs the eviction sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{current_timestamp_ms, CacheStore};

/// Spawns a background task that periodically sweeps the cache.
///
/// Each run takes the same write lock as foreground mutations, so it never
/// interleaves with an insert.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_sweep_task(cache.store(), Duration::from_secs(3600));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task(store: Arc<RwLock<CacheStore>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting sweep task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let report = {
                let mut store = store.write().await;
                store.run_maintenance_at(current_timestamp_ms())
            };

            if report.expired > 0 || report.evicted > 0 {
                info!(
                    "Sweep: purged {} expired, evicted {} entries, freed {} bytes",
                    report.expired, report.evicted, report.freed_bytes
                );
            } else {
                debug!("Sweep: nothing to remove");
            }
        }
    })
}
