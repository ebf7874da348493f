//! Predictive Cache
//!
//! The consumer-facing cache: a [`CacheStore`] behind one mutation lock, the
//! behavior recorder, the prediction ledger and the prefetch worker, wired
//! together by [`CacheBuilder`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::behavior::{BehaviorRecorder, BehaviorUpdate, UserBehaviorProfile};
use crate::cache::{
    current_timestamp_ms, CacheStore, Category, EntryMetadata, Payload, StateExport,
    StatsSnapshot, SweepReport,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::prediction::{DataFetcher, PredictionOracle};
use crate::prefetch::{PredictionLedger, PrefetchContext, PrefetchJob, PrefetchScheduler};

// == Builder ==
/// Composition root for [`PredictiveCache`].
///
/// The oracle and the fetcher are required; `build` fails with
/// [`CacheError::Configuration`] when either is missing.
pub struct CacheBuilder {
    config: Config,
    oracle: Option<Arc<dyn PredictionOracle>>,
    fetcher: Option<Arc<dyn DataFetcher>>,
}

impl CacheBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            oracle: None,
            fetcher: None,
        }
    }

    pub fn oracle(mut self, oracle: Arc<dyn PredictionOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn DataFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Validates the configuration and starts the prefetch worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> Result<PredictiveCache> {
        self.config.validate()?;
        let oracle = self.oracle.ok_or_else(|| {
            CacheError::Configuration("a prediction oracle is required".to_string())
        })?;
        let fetcher = self.fetcher.ok_or_else(|| {
            CacheError::Configuration("a data fetcher is required".to_string())
        })?;
        tokio::runtime::Handle::try_current().map_err(|_| {
            CacheError::Configuration("the cache must be built inside a Tokio runtime".to_string())
        })?;

        let config = self.config;
        let store = Arc::new(RwLock::new(CacheStore::new(config.clone())));
        let ledger = Arc::new(Mutex::new(PredictionLedger::new(
            config.prediction_horizon_ms,
        )));
        let behavior = BehaviorRecorder::new(Arc::clone(&oracle), config.behavior_window_ms);
        let scheduler = PrefetchScheduler::spawn(
            PrefetchContext {
                store: Arc::clone(&store),
                oracle: Arc::clone(&oracle),
                fetcher,
                ledger: Arc::clone(&ledger),
                max_candidates: config.max_prefetch_candidates,
                fetch_timeout: Duration::from_millis(config.prefetch_timeout_ms),
            },
            config.prefetch_queue_depth,
        );

        info!(
            "Predictive cache ready: max_size={}B, max_entries={}",
            config.max_size_bytes, config.max_entries
        );

        Ok(PredictiveCache {
            store,
            oracle,
            behavior,
            ledger,
            scheduler,
            config,
        })
    }
}

// == Predictive Cache ==
pub struct PredictiveCache {
    store: Arc<RwLock<CacheStore>>,
    oracle: Arc<dyn PredictionOracle>,
    behavior: BehaviorRecorder,
    ledger: Arc<Mutex<PredictionLedger>>,
    scheduler: PrefetchScheduler,
    config: Config,
}

impl PredictiveCache {
    pub fn builder(config: Config) -> CacheBuilder {
        CacheBuilder::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle to the store, for the periodic sweep task.
    pub fn store(&self) -> Arc<RwLock<CacheStore>> {
        Arc::clone(&self.store)
    }

    // == Get ==
    /// Returns the payload of a live entry, touching it.
    ///
    /// Reading an audio entry with a `user_id` records a listen.
    pub async fn get(&self, key: &str, user_id: Option<&str>) -> Result<Payload> {
        let user_id = user_id.filter(|user_id| !user_id.is_empty());
        let personalization = self.personalization(user_id, key).await;
        let now = current_timestamp_ms();

        let (payload, category) = {
            let mut store = self.store.write().await;
            let entry = store.get_at(key, personalization, now)?;
            (entry.payload.clone(), entry.category)
        };

        if let (Category::Audio, Some(user_id)) = (category, user_id) {
            self.behavior.record_listen(user_id, key, now).await;
        }
        Ok(payload)
    }

    // == Set ==
    /// Stores a payload. Audio entries stored with a `user_id` queue a
    /// prefetch cycle; its outcome never affects this call.
    pub async fn set(
        &self,
        key: impl Into<String>,
        payload: impl Into<Payload>,
        metadata: EntryMetadata,
        user_id: Option<&str>,
    ) -> Result<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
        }

        let personalization = self.personalization(user_id, &key).await;
        let category = metadata.category;
        self.store.write().await.set_at(
            key.clone(),
            payload.into(),
            metadata,
            personalization,
            current_timestamp_ms(),
        )?;

        if let (Category::Audio, Some(user_id)) = (category, user_id) {
            self.scheduler.schedule(PrefetchJob {
                user_id: user_id.to_string(),
                current_key: key,
            });
        }
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    // == Behavior ==
    /// Merges a partial profile into the user's history and returns it.
    pub async fn record_user_behavior(
        &self,
        user_id: &str,
        update: BehaviorUpdate,
    ) -> Result<UserBehaviorProfile> {
        if user_id.is_empty() {
            return Err(CacheError::InvalidRequest("User id cannot be empty".to_string()));
        }
        Ok(self
            .behavior
            .record(user_id, update, current_timestamp_ms())
            .await)
    }

    pub async fn user_profile(&self, user_id: &str) -> Option<UserBehaviorProfile> {
        self.behavior.profile(user_id).await
    }

    // == Predictions ==
    /// Confirms that a predicted key was accessed within the prediction
    /// horizon. Returns true iff the confirmation was counted.
    pub async fn confirm_prediction(&self, user_id: &str, key: &str) -> bool {
        let confirmed = self
            .ledger
            .lock()
            .await
            .confirm(user_id, key, current_timestamp_ms());
        if confirmed {
            self.store.write().await.record_correct_prediction();
        }
        confirmed
    }

    /// Waits until every prefetch cycle queued so far has completed.
    pub async fn flush_prefetches(&self) {
        self.scheduler.flush().await;
    }

    // == Maintenance ==
    /// Runs the eviction sweep now, under the mutation lock.
    pub async fn sweep(&self) -> SweepReport {
        self.store.write().await.sweep()
    }

    // == Stats ==
    pub async fn get_stats(&self) -> StatsSnapshot {
        self.store.read().await.stats()
    }

    /// Configuration, stats and per-entry summaries. Payloads are omitted.
    pub async fn export_state(&self) -> StateExport {
        let store = self.store.read().await;
        StateExport {
            config: self.config.clone(),
            stats: store.stats(),
            entries: store.summaries_at(current_timestamp_ms()),
        }
    }

    /// Oracle affinity for the priority formula; 0 without a user or on error.
    async fn personalization(&self, user_id: Option<&str>, key: &str) -> f64 {
        let Some(user_id) = user_id else {
            return 0.0;
        };
        match self.oracle.personalized_score(user_id, key).await {
            Ok(score) if score.is_finite() => score.clamp(0.0, 1.0),
            Ok(_) => 0.0,
            Err(e) => {
                debug!("Personalized score unavailable for '{}': {:#}", key, e);
                0.0
            }
        }
    }
}
