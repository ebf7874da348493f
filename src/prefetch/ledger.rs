//! Prediction Ledger
//!
//! Remembers which keys were predicted for which user and when, so that an
//! external confirmation can be checked against the prediction horizon.

use std::collections::HashMap;

/// Most pending predictions kept per user; the oldest are dropped first.
pub const MAX_PENDING_PER_USER: usize = 256;

#[derive(Debug)]
pub struct PredictionLedger {
    /// user -> key -> predicted at (Unix milliseconds)
    pending: HashMap<String, HashMap<String, u64>>,
    horizon_ms: u64,
}

impl PredictionLedger {
    pub fn new(horizon_ms: u64) -> Self {
        Self {
            pending: HashMap::new(),
            horizon_ms,
        }
    }

    /// Records a batch of predictions; a repeated key refreshes its timestamp.
    ///
    /// Expired predictions are pruned first, and each user keeps at most
    /// [`MAX_PENDING_PER_USER`] pending keys.
    pub fn record(&mut self, user_id: &str, keys: &[String], now: u64) {
        self.prune(now);
        if keys.is_empty() {
            return;
        }
        let user = self.pending.entry(user_id.to_string()).or_default();
        for key in keys {
            user.insert(key.clone(), now);
        }

        if user.len() > MAX_PENDING_PER_USER {
            let mut by_age: Vec<(String, u64)> =
                user.iter().map(|(key, at)| (key.clone(), *at)).collect();
            by_age.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
            let excess = user.len() - MAX_PENDING_PER_USER;
            for (key, _) in by_age.into_iter().take(excess) {
                user.remove(&key);
            }
        }
    }

    /// Consumes a pending prediction. True iff `key` was predicted for
    /// `user_id` within the horizon and not confirmed before.
    pub fn confirm(&mut self, user_id: &str, key: &str, now: u64) -> bool {
        self.prune(now);
        let Some(user) = self.pending.get_mut(user_id) else {
            return false;
        };
        let confirmed = user.remove(key).is_some();
        if user.is_empty() {
            self.pending.remove(user_id);
        }
        confirmed
    }

    /// Drops predictions older than the horizon.
    pub fn prune(&mut self, now: u64) {
        let horizon = self.horizon_ms;
        self.pending.retain(|_, keys| {
            keys.retain(|_, predicted_at| now.saturating_sub(*predicted_at) <= horizon);
            !keys.is_empty()
        });
    }

    pub fn pending_count(&self) -> usize {
        self.pending.values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_confirm_consumes_prediction() {
        let mut ledger = PredictionLedger::new(1_000);
        ledger.record("u1", &keys(&["a", "b"]), 0);

        assert!(ledger.confirm("u1", "a", 10));
        assert!(!ledger.confirm("u1", "a", 10), "second confirmation is ignored");
        assert_eq!(ledger.pending_count(), 1);
    }

    #[test]
    fn test_confirm_rejects_other_user_and_unknown_key() {
        let mut ledger = PredictionLedger::new(1_000);
        ledger.record("u1", &keys(&["a"]), 0);

        assert!(!ledger.confirm("u2", "a", 10));
        assert!(!ledger.confirm("u1", "z", 10));
    }

    #[test]
    fn test_confirm_outside_horizon_fails() {
        let mut ledger = PredictionLedger::new(1_000);
        ledger.record("u1", &keys(&["a"]), 0);

        assert!(!ledger.confirm("u1", "a", 1_001));
        assert_eq!(ledger.pending_count(), 0);
    }

    #[test]
    fn test_expired_predictions_do_not_accumulate() {
        let mut ledger = PredictionLedger::new(1_000);
        for i in 0..10_000u64 {
            ledger.record("u1", &keys(&[&format!("song:{}", i)]), i * 10_000);
        }

        assert_eq!(ledger.pending_count(), 1);
    }

    #[test]
    fn test_pending_keys_capped_per_user() {
        let mut ledger = PredictionLedger::new(u64::MAX);
        for i in 0..(MAX_PENDING_PER_USER as u64 + 50) {
            ledger.record("u1", &keys(&[&format!("song:{}", i)]), i);
        }

        assert_eq!(ledger.pending_count(), MAX_PENDING_PER_USER);
        assert!(!ledger.confirm("u1", "song:0", 1_000), "oldest key was dropped");
        let newest = format!("song:{}", MAX_PENDING_PER_USER as u64 + 49);
        assert!(ledger.confirm("u1", &newest, 1_000));
    }

    #[test]
    fn test_record_refreshes_timestamp() {
        let mut ledger = PredictionLedger::new(1_000);
        ledger.record("u1", &keys(&["a"]), 0);
        ledger.record("u1", &keys(&["a"]), 900);

        assert!(ledger.confirm("u1", "a", 1_500));
    }
}
