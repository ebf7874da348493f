//! Cache Store Module
//!
//! Main cache engine: the entry table, size accounting, expiry and the
//! capacity-triggered eviction sweep. All methods take `&mut self`; callers
//! serialize access through a single lock.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::{
    current_timestamp_ms, CacheEntry, CacheStats, EntryMetadata, EntrySummary, EvictionPlanner,
    Payload, StatsSnapshot, SweepTarget,
};
use crate::config::Config;
use crate::error::{CacheError, Result};

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Expired entries purged before ranking
    pub expired: usize,
    /// Live entries removed to reach the target occupancy
    pub evicted: usize,
    pub freed_bytes: u64,
}

// == Cache Store ==
#[derive(Debug)]
pub struct CacheStore {
    /// Key-entry storage
    entries: HashMap<String, CacheEntry>,
    /// Sum of `size_bytes` over stored entries
    occupied_bytes: u64,
    planner: EvictionPlanner,
    /// Performance statistics
    stats: CacheStats,
    config: Config,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store. The configuration is expected to be validated.
    pub fn new(config: Config) -> Self {
        Self {
            entries: HashMap::new(),
            occupied_bytes: 0,
            planner: EvictionPlanner::new(config.weights.clone()),
            stats: CacheStats::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // == Set ==
    /// Stores a payload under `key`, overwriting any previous entry.
    ///
    /// Runs an eviction sweep first when the insert would push the store past
    /// its cleanup threshold or its hard limits.
    pub fn set(&mut self, key: String, payload: Payload, metadata: EntryMetadata) -> Result<()> {
        self.set_at(key, payload, metadata, 0.0, current_timestamp_ms())
    }

    /// [`set`](Self::set) at an explicit time, with a personalization score
    /// folded into the initial priority.
    pub fn set_at(
        &mut self,
        key: String,
        payload: Payload,
        metadata: EntryMetadata,
        personalization: f64,
        now: u64,
    ) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
        }

        let mut entry = CacheEntry::new(key.clone(), payload, metadata, now);
        if self.should_cleanup(entry.size_bytes) {
            let report = self.sweep_at(now);
            debug!(
                "Sweep before insert of '{}': expired={}, evicted={}, freed={}B",
                key, report.expired, report.evicted, report.freed_bytes
            );
        }

        entry.priority = self.planner.priority(&entry, personalization, now);
        let size = entry.size_bytes;
        if let Some(previous) = self.entries.insert(key, entry) {
            self.occupied_bytes = self.occupied_bytes.saturating_sub(previous.size_bytes);
        }
        self.occupied_bytes += size;

        Ok(())
    }

    /// Inserts only if no live entry exists for `key`.
    ///
    /// Returns `Ok(false)` when a live entry was already present and the
    /// payload was discarded.
    pub fn insert_if_absent_at(
        &mut self,
        key: String,
        payload: Payload,
        metadata: EntryMetadata,
        now: u64,
    ) -> Result<bool> {
        if self.contains_live_at(&key, now) {
            return Ok(false);
        }
        self.set_at(key, payload, metadata, 0.0, now)?;
        Ok(true)
    }

    // == Get ==
    /// Retrieves an entry by key, touching it on success.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Result<&CacheEntry> {
        self.get_at(key, 0.0, current_timestamp_ms())
    }

    /// [`get`](Self::get) at an explicit time, with the personalization score
    /// used to recompute the priority.
    pub fn get_at(&mut self, key: &str, personalization: f64, now: u64) -> Result<&CacheEntry> {
        let expired = self.entries.get(key).map(|entry| entry.is_expired_at(now));
        match expired {
            None => {
                self.stats.record_miss();
                return Err(CacheError::NotFound(key.to_string()));
            }
            Some(true) => {
                self.remove_entry(key);
                self.stats.record_expirations(1);
                self.stats.record_miss();
                return Err(CacheError::Expired(key.to_string()));
            }
            Some(false) => {}
        }

        let Some(entry) = self.entries.get_mut(key) else {
            self.stats.record_miss();
            return Err(CacheError::NotFound(key.to_string()));
        };
        entry.access_count += 1;
        entry.last_accessed_at = now;
        entry.priority = self.planner.priority(entry, personalization, now);
        self.stats.record_hit();

        Ok(&*entry)
    }

    /// True if a non-expired entry exists. Does not touch the entry or stats.
    pub fn contains_live_at(&self, key: &str, now: u64) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired_at(now))
            .unwrap_or(false)
    }

    pub fn contains_live(&self, key: &str) -> bool {
        self.contains_live_at(key, current_timestamp_ms())
    }

    // == Delete ==
    /// Removes an entry by key. Returns true iff an entry was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    /// Removes every entry. Cumulative stats are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.occupied_bytes = 0;
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let removed = self.entries.remove(key)?;
        self.occupied_bytes = self.occupied_bytes.saturating_sub(removed.size_bytes);
        Some(removed)
    }

    // == Capacity ==
    /// Whether inserting `incoming_size` bytes must be preceded by a sweep.
    pub fn should_cleanup(&self, incoming_size: u64) -> bool {
        self.size_ratio() > self.config.cleanup_threshold_ratio
            || self.occupied_bytes + incoming_size > self.config.max_size_bytes
            || self.entries.len() + 1 > self.config.max_entries
    }

    /// Whether the store currently sits above its cleanup threshold.
    pub fn is_over_threshold(&self) -> bool {
        let count_ratio = self.entries.len() as f64 / self.config.max_entries as f64;
        self.size_ratio() > self.config.cleanup_threshold_ratio
            || count_ratio > self.config.cleanup_threshold_ratio
    }

    fn size_ratio(&self) -> f64 {
        self.occupied_bytes as f64 / self.config.max_size_bytes as f64
    }

    // == Sweep ==
    /// Purges expired entries, then evicts live entries in ascending
    /// eviction-score order until both targets are met.
    pub fn sweep_at(&mut self, now: u64) -> SweepReport {
        let before = self.occupied_bytes;
        let expired = self.purge_expired_at(now);

        let target = SweepTarget {
            size_bytes: self.config.target_size_bytes(),
            entries: self.config.target_entries(),
        };
        let victims = self.planner.plan(self.entries.values(), target, now);
        for key in &victims {
            self.remove_entry(key);
        }
        self.stats.record_evictions(victims.len());

        SweepReport {
            expired,
            evicted: victims.len(),
            freed_bytes: before.saturating_sub(self.occupied_bytes),
        }
    }

    pub fn sweep(&mut self) -> SweepReport {
        self.sweep_at(current_timestamp_ms())
    }

    /// Periodic safety net: purge expired entries, and sweep only if the
    /// store is still above its cleanup threshold.
    pub fn run_maintenance_at(&mut self, now: u64) -> SweepReport {
        let expired = self.purge_expired_at(now);
        if !self.is_over_threshold() {
            return SweepReport {
                expired,
                ..SweepReport::default()
            };
        }
        let mut report = self.sweep_at(now);
        report.expired += expired;
        report
    }

    // == Purge Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn purge_expired_at(&mut self, now: u64) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }
        self.stats.record_expirations(expired_keys.len());
        expired_keys.len()
    }

    // == Predictions ==
    pub fn record_predictions(&mut self, count: usize) {
        self.stats.record_predictions(count);
    }

    pub fn record_correct_prediction(&mut self) {
        self.stats.record_correct_prediction();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(
            self.entries.len(),
            self.occupied_bytes,
            self.config.max_size_bytes,
        )
    }

    /// Per-entry diagnostics, highest priority first. Payloads are omitted.
    pub fn summaries_at(&self, now: u64) -> Vec<EntrySummary> {
        let mut summaries: Vec<EntrySummary> = self
            .entries
            .values()
            .map(|entry| EntrySummary::from_entry(entry, now))
            .collect();
        summaries.sort_by(|a, b| {
            b.priority
                .total_cmp(&a.priority)
                .then_with(|| a.key.cmp(&b.key))
        });
        summaries
    }

    pub fn occupied_bytes(&self) -> u64 {
        self.occupied_bytes
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
