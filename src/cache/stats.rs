//! Cache Statistics Module
//!
//! Tracks cumulative cache counters and derives the reported ratios.

use serde::Serialize;

// == Cache Stats ==
/// Cumulative counters. Never reset by `clear`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries removed by a capacity sweep
    pub evictions: u64,
    /// Number of entries removed because they expired
    pub expirations: u64,
    /// Number of keys returned by prediction calls
    pub predictions: u64,
    /// Number of predictions confirmed as accessed within the horizon
    pub correct_predictions: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits, self.hits + self.misses)
    }

    /// Returns correct_predictions / predictions, or 0.0 before any prediction.
    pub fn prediction_accuracy(&self) -> f64 {
        ratio(self.correct_predictions, self.predictions)
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn record_predictions(&mut self, count: usize) {
        self.predictions += count as u64;
    }

    pub fn record_correct_prediction(&mut self) {
        self.correct_predictions += 1;
    }

    // == Snapshot ==
    /// Combines the counters with the store's current occupancy.
    pub fn snapshot(
        &self,
        total_entries: usize,
        occupied_bytes: u64,
        max_size_bytes: u64,
    ) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            expirations: self.expirations,
            predictions: self.predictions,
            correct_predictions: self.correct_predictions,
            hit_rate: self.hit_rate(),
            prediction_accuracy: self.prediction_accuracy(),
            utilization_rate: if max_size_bytes == 0 {
                0.0
            } else {
                occupied_bytes as f64 / max_size_bytes as f64
            },
            total_entries,
            occupied_bytes,
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

// == Stats Snapshot ==
/// Point-in-time view returned by `get_stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub predictions: u64,
    pub correct_predictions: u64,
    pub hit_rate: f64,
    pub prediction_accuracy: f64,
    pub utilization_rate: f64,
    pub total_entries: usize,
    pub occupied_bytes: u64,
}
