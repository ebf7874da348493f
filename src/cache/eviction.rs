//! Eviction Planner Module
//!
//! Pure scoring logic: per-entry priority and the transient eviction score
//! used to rank victims during a sweep. Holds no state besides its weights.

use crate::cache::{CacheEntry, Category};
use crate::config::ScoringWeights;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

// == Eviction Planner ==
#[derive(Debug, Clone, Default)]
pub struct EvictionPlanner {
    weights: ScoringWeights,
}

/// Occupancy a sweep must reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepTarget {
    pub size_bytes: u64,
    pub entries: usize,
}

impl EvictionPlanner {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Fixed priority bonus for the kind of payload.
    pub fn category_weight(&self, category: Category) -> f64 {
        match category {
            Category::Audio => self.weights.audio_weight,
            Category::Image => self.weights.image_weight,
            Category::Metadata => self.weights.metadata_weight,
        }
    }

    // == Priority ==
    /// Computes the usefulness signal stored on the entry.
    ///
    /// `personalization` is the oracle's score for this key and user, 0 when
    /// unavailable.
    pub fn priority(&self, entry: &CacheEntry, personalization: f64, now: u64) -> f64 {
        let w = &self.weights;
        let frequency = ((entry.access_count + 1) as f64).ln() * w.frequency;
        let recency = if w.recency_window_days > 0.0 {
            (1.0 - entry.days_since_access(now) / w.recency_window_days).max(0.0) * w.recency
        } else {
            0.0
        };

        w.base
            + frequency
            + recency
            + self.category_weight(entry.category)
            + personalization.clamp(0.0, 1.0) * w.personalization
    }

    // == Eviction Score ==
    /// Ranks entries for removal; lower is evicted first. Never stored.
    pub fn eviction_score(&self, entry: &CacheEntry, now: u64) -> f64 {
        let w = &self.weights;
        let expiry_penalty = match entry.days_until_expiry(now) {
            Some(days) if days < w.imminent_expiry_days => w.imminent_expiry_penalty,
            _ => 0.0,
        };

        entry.priority
            - entry.days_since_access(now) * w.age_penalty_per_day
            - (entry.size_bytes as f64 / BYTES_PER_MB) * w.size_penalty_per_mb
            - expiry_penalty
    }

    // == Plan ==
    /// Picks the keys to remove so that occupancy falls to `target`.
    ///
    /// Entries are ranked by ascending eviction score, ties broken by older
    /// `last_accessed_at` then key. Removal stops as soon as both the byte
    /// and the entry-count targets are met.
    pub fn plan<'a, I>(&self, entries: I, target: SweepTarget, now: u64) -> Vec<String>
    where
        I: IntoIterator<Item = &'a CacheEntry>,
    {
        let mut ranked: Vec<(f64, &CacheEntry)> = entries
            .into_iter()
            .map(|entry| (self.eviction_score(entry, now), entry))
            .collect();

        let mut occupied: u64 = ranked.iter().map(|(_, entry)| entry.size_bytes).sum();
        let mut count = ranked.len();

        ranked.sort_by(|(score_a, a), (score_b, b)| {
            score_a
                .total_cmp(score_b)
                .then_with(|| a.last_accessed_at.cmp(&b.last_accessed_at))
                .then_with(|| a.key.cmp(&b.key))
        });

        let mut victims = Vec::new();
        for (_, entry) in ranked {
            if occupied <= target.size_bytes && count <= target.entries {
                break;
            }
            occupied = occupied.saturating_sub(entry.size_bytes);
            count -= 1;
            victims.push(entry.key.clone());
        }
        victims
    }
}
