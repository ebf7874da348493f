//! Behavior Recorder
//!
//! Accumulates bounded per-user history and forwards each merged profile to
//! the prediction model in the background.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::behavior::{BehaviorUpdate, ListenEvent, UserBehaviorProfile};
use crate::prediction::PredictionOracle;

/// Per-user profiles keyed by user id.
///
/// Each profile is capped and windowed, but users are never forgotten: the
/// map grows with the number of distinct users seen.
pub struct BehaviorRecorder {
    profiles: RwLock<HashMap<String, UserBehaviorProfile>>,
    oracle: Arc<dyn PredictionOracle>,
    behavior_window_ms: u64,
}

impl BehaviorRecorder {
    pub fn new(oracle: Arc<dyn PredictionOracle>, behavior_window_ms: u64) -> Self {
        Self {
            profiles: RwLock::new(HashMap::new()),
            oracle,
            behavior_window_ms,
        }
    }

    // == Record ==
    /// Merges `update` into the user's profile and returns the merged copy.
    ///
    /// The model update runs detached; its failure is only logged.
    pub async fn record(
        &self,
        user_id: &str,
        update: BehaviorUpdate,
        now: u64,
    ) -> UserBehaviorProfile {
        let (profile, _) = self.record_and_notify(user_id, update, now).await;
        profile
    }

    /// Shorthand for a single listen, used when a cached audio entry is read.
    pub async fn record_listen(&self, user_id: &str, song_id: &str, now: u64) {
        self.record(user_id, BehaviorUpdate::listen(ListenEvent::new(song_id, now)), now)
            .await;
    }

    /// Same as [`record`](Self::record), also handing back the model-update task.
    pub async fn record_and_notify(
        &self,
        user_id: &str,
        update: BehaviorUpdate,
        now: u64,
    ) -> (UserBehaviorProfile, JoinHandle<()>) {
        let window_start = now.saturating_sub(self.behavior_window_ms);
        let merged = {
            let mut profiles = self.profiles.write().await;
            let profile = profiles
                .entry(user_id.to_string())
                .or_insert_with(|| UserBehaviorProfile::new(user_id));
            profile.merge(update, window_start, now);
            profile.clone()
        };

        let oracle = Arc::clone(&self.oracle);
        let snapshot = merged.clone();
        let handle = tokio::spawn(async move {
            match oracle.update_model(&snapshot).await {
                Ok(()) => debug!("Model updated for user '{}'", snapshot.user_id),
                Err(e) => warn!("Model update failed for user '{}': {:#}", snapshot.user_id, e),
            }
        });

        (merged, handle)
    }

    pub async fn profile(&self, user_id: &str) -> Option<UserBehaviorProfile> {
        self.profiles.read().await.get(user_id).cloned()
    }

    pub async fn user_count(&self) -> usize {
        self.profiles.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::MAX_LISTEN_HISTORY;
    use crate::config::DAY_MS;
    use crate::test_support::MockOracle;

    const NOW: u64 = 100 * DAY_MS;

    #[tokio::test]
    async fn test_record_merges_and_notifies_model() {
        let oracle = Arc::new(MockOracle::default());
        let recorder = BehaviorRecorder::new(oracle.clone(), 30 * DAY_MS);

        let (profile, handle) = recorder
            .record_and_notify(
                "u1",
                BehaviorUpdate::listen(ListenEvent::new("song:1", NOW)),
                NOW,
            )
            .await;
        handle.await.unwrap();

        assert_eq!(profile.listen_history.len(), 1);
        assert_eq!(oracle.model_updates(), vec!["u1".to_string()]);
        assert_eq!(recorder.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_model_failure_does_not_propagate() {
        let oracle = Arc::new(MockOracle::failing());
        let recorder = BehaviorRecorder::new(oracle, 30 * DAY_MS);

        let (profile, handle) = recorder
            .record_and_notify(
                "u1",
                BehaviorUpdate {
                    search_history: vec!["ambient".to_string()],
                    ..BehaviorUpdate::default()
                },
                NOW,
            )
            .await;

        assert!(handle.await.is_ok(), "background task must not panic");
        assert_eq!(profile.search_history, vec!["ambient".to_string()]);
    }

    #[tokio::test]
    async fn test_listen_history_stays_capped_across_merges() {
        let recorder = BehaviorRecorder::new(Arc::new(MockOracle::default()), 30 * DAY_MS);

        for batch in 0..3u64 {
            let listens = (0..600u64)
                .map(|i| ListenEvent::new(format!("s{}", batch * 600 + i), NOW - 5_000 + batch * 600 + i))
                .collect();
            let profile = recorder
                .record(
                    "u1",
                    BehaviorUpdate {
                        listen_history: listens,
                        ..BehaviorUpdate::default()
                    },
                    NOW,
                )
                .await;
            assert!(profile.listen_history.len() <= MAX_LISTEN_HISTORY);
        }

        let profile = recorder.profile("u1").await.unwrap();
        assert_eq!(profile.listen_history.len(), MAX_LISTEN_HISTORY);
        assert_eq!(profile.listen_history[0].song_id, "s1799");
    }

    #[tokio::test]
    async fn test_history_outside_window_is_dropped() {
        let recorder = BehaviorRecorder::new(Arc::new(MockOracle::default()), DAY_MS);
        recorder.record_listen("u1", "ancient", NOW - 2 * DAY_MS).await;
        recorder.record_listen("u1", "recent", NOW).await;

        let profile = recorder.profile("u1").await.unwrap();
        assert_eq!(profile.listen_history.len(), 1);
        assert_eq!(profile.listen_history[0].song_id, "recent");
        assert!(recorder.profile("nobody").await.is_none());
    }
}
