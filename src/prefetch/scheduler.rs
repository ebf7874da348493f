//! Prefetch Scheduler
//!
//! Background worker that turns predictions into cache entries. Cycles are
//! queued on a bounded channel and processed one at a time; fetches within a
//! cycle run concurrently and only touch the store lock for the final insert.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::cache::{current_timestamp_ms, CacheStore, EntryMetadata, Payload};
use crate::prediction::{DataFetcher, PredictionOracle, PredictionRequest};
use crate::prefetch::PredictionLedger;

/// Tag attached to every entry inserted by the prefetcher.
pub const PREFETCHED_TAG: &str = "prefetched";

#[derive(Debug, Error)]
pub enum PrefetchError {
    #[error("prefetch of '{key}' timed out after {timeout:?}")]
    Timeout { key: String, timeout: Duration },

    #[error("prefetch of '{key}' failed: {source:#}")]
    Fetch {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

/// One prefetch request: predict what follows `current_key` for `user_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchJob {
    pub user_id: String,
    pub current_key: String,
}

/// Outcome of one prefetch cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefetchReport {
    /// Candidates kept from the prediction, in oracle order
    pub predicted: Vec<String>,
    /// Candidates that were not cached and got a fetch task
    pub scheduled: Vec<String>,
    pub inserted: Vec<String>,
    /// Fetched, but another path inserted the key first
    pub discarded: Vec<String>,
    pub failed: Vec<String>,
}

// == Prefetch Context ==
/// Everything a cycle needs; shared by the worker and by direct callers.
#[derive(Clone)]
pub struct PrefetchContext {
    pub store: Arc<RwLock<CacheStore>>,
    pub oracle: Arc<dyn PredictionOracle>,
    pub fetcher: Arc<dyn DataFetcher>,
    pub ledger: Arc<Mutex<PredictionLedger>>,
    pub max_candidates: usize,
    pub fetch_timeout: Duration,
}

impl PrefetchContext {
    // == Run Cycle ==
    /// Predicts, filters, fetches and inserts. Never fails; every problem is
    /// logged and reflected in the report.
    pub async fn run_cycle(&self, job: &PrefetchJob) -> PrefetchReport {
        let mut report = PrefetchReport::default();
        let request = PredictionRequest::new(&job.user_id, &job.current_key, current_timestamp_ms());

        let predicted = match self.oracle.predict_next_items(&request).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(
                    "Prediction failed for user '{}' after '{}': {:#}",
                    job.user_id, job.current_key, e
                );
                return report;
            }
        };

        let mut seen = HashSet::new();
        report.predicted = predicted
            .into_iter()
            .take(self.max_candidates)
            .filter(|key| !key.is_empty() && seen.insert(key.clone()))
            .collect();

        let now = current_timestamp_ms();
        self.ledger
            .lock()
            .await
            .record(&job.user_id, &report.predicted, now);

        report.scheduled = {
            let mut store = self.store.write().await;
            store.record_predictions(report.predicted.len());
            report
                .predicted
                .iter()
                .filter(|key| !store.contains_live_at(key, now))
                .cloned()
                .collect()
        };

        let mut fetches = JoinSet::new();
        for key in &report.scheduled {
            let fetcher = Arc::clone(&self.fetcher);
            let key = key.clone();
            let timeout = self.fetch_timeout;
            fetches.spawn(async move {
                // Let foreground work run first
                tokio::task::yield_now().await;
                let result = fetch_with_timeout(fetcher.as_ref(), &key, timeout).await;
                (key, result)
            });
        }

        while let Some(joined) = fetches.join_next().await {
            let (key, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Prefetch task aborted: {}", e);
                    continue;
                }
            };

            let bytes = match result {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("{}", e);
                    report.failed.push(key);
                    continue;
                }
            };

            let inserted = self.store.write().await.insert_if_absent_at(
                key.clone(),
                Payload::Binary(bytes),
                EntryMetadata::audio().with_tag(PREFETCHED_TAG),
                current_timestamp_ms(),
            );
            match inserted {
                Ok(true) => report.inserted.push(key),
                Ok(false) => {
                    debug!("Prefetched '{}' already cached, discarding", key);
                    report.discarded.push(key);
                }
                Err(e) => {
                    warn!("Prefetched '{}' could not be stored: {}", key, e);
                    report.failed.push(key);
                }
            }
        }

        report
    }
}

async fn fetch_with_timeout(
    fetcher: &dyn DataFetcher,
    key: &str,
    timeout: Duration,
) -> Result<Vec<u8>, PrefetchError> {
    match tokio::time::timeout(timeout, fetcher.fetch(key)).await {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(source)) => Err(PrefetchError::Fetch {
            key: key.to_string(),
            source,
        }),
        Err(_) => Err(PrefetchError::Timeout {
            key: key.to_string(),
            timeout,
        }),
    }
}

enum Command {
    Cycle(PrefetchJob),
    Flush(oneshot::Sender<()>),
}

// == Prefetch Scheduler ==
/// Handle to the background worker. Dropping it stops the worker.
pub struct PrefetchScheduler {
    sender: mpsc::Sender<Command>,
    worker: JoinHandle<()>,
}

impl PrefetchScheduler {
    /// Spawns the worker on the current Tokio runtime.
    pub fn spawn(context: PrefetchContext, queue_depth: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel(queue_depth);

        let worker = tokio::spawn(async move {
            info!("Prefetch worker started with queue depth {}", queue_depth);
            while let Some(command) = receiver.recv().await {
                match command {
                    Command::Cycle(job) => {
                        let report = context.run_cycle(&job).await;
                        debug!(
                            "Prefetch cycle for '{}': predicted={}, scheduled={}, inserted={}, discarded={}, failed={}",
                            job.current_key,
                            report.predicted.len(),
                            report.scheduled.len(),
                            report.inserted.len(),
                            report.discarded.len(),
                            report.failed.len()
                        );
                    }
                    Command::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("Prefetch worker stopped");
        });

        Self { sender, worker }
    }

    /// Queues a cycle without waiting. Returns false if the queue is full or
    /// the worker is gone; the cycle is then skipped.
    pub fn schedule(&self, job: PrefetchJob) -> bool {
        match self.sender.try_send(Command::Cycle(job)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(Command::Cycle(job))) => {
                warn!(
                    "Prefetch queue full, skipping cycle for '{}'",
                    job.current_key
                );
                false
            }
            Err(_) => {
                warn!("Prefetch worker is not running");
                false
            }
        }
    }

    /// Waits until every cycle queued before this call has completed.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(Command::Flush(done)).await.is_ok() {
            let _ = wait.await;
        }
    }
}

impl Drop for PrefetchScheduler {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
