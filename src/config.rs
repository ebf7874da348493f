//! Configuration Module
//!
//! Handles loading, validating and exposing the cache configuration.
//! Every value is fixed at construction; only the entry table and the
//! counters change at runtime.

use std::env;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{CacheError, Result};

/// One day in milliseconds.
pub const DAY_MS: u64 = 24 * 60 * 60 * 1000;

// == Scoring Weights ==
/// Named weights for the priority and eviction-score formulas.
///
/// Only the relative ordering these weights produce matters; all of them
/// can be overridden per cache instance.
#[derive(Debug, Clone, Serialize)]
pub struct ScoringWeights {
    /// Constant added to every priority
    pub base: f64,
    /// Multiplier on `ln(access_count + 1)`
    pub frequency: f64,
    /// Multiplier on the linear recency bonus
    pub recency: f64,
    /// Width of the recency window in days
    pub recency_window_days: f64,
    /// Category bonus for audio entries
    pub audio_weight: f64,
    /// Category bonus for image entries
    pub image_weight: f64,
    /// Category bonus for metadata entries
    pub metadata_weight: f64,
    /// Multiplier on the oracle's personalization score
    pub personalization: f64,
    /// Eviction penalty per day since last access
    pub age_penalty_per_day: f64,
    /// Eviction penalty per MiB of estimated size
    pub size_penalty_per_mb: f64,
    /// Eviction penalty for entries about to expire
    pub imminent_expiry_penalty: f64,
    /// Entries expiring within this many days get the expiry penalty
    pub imminent_expiry_days: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            base: 1.0,
            frequency: 0.3,
            recency: 0.2,
            recency_window_days: 7.0,
            audio_weight: 2.0,
            image_weight: 1.0,
            metadata_weight: 0.5,
            personalization: 0.3,
            age_penalty_per_day: 0.1,
            size_penalty_per_mb: 0.01,
            imminent_expiry_penalty: 2.0,
            imminent_expiry_days: 1.0,
        }
    }
}

// == Config ==
/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Soft bound on the summed estimated size of live entries, in bytes
    pub max_size_bytes: u64,
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Occupancy ratio above which a sweep runs before an insert
    pub cleanup_threshold_ratio: f64,
    /// Occupancy ratio a sweep drives the cache down to
    pub eviction_target_ratio: f64,
    /// How long a prediction stays eligible for confirmation
    pub prediction_horizon_ms: u64,
    /// How far back behavior history is retained
    pub behavior_window_ms: u64,
    /// Reserved for access-count based priority boosts
    pub min_access_threshold: u64,
    /// Upper bound on prefetch candidates taken from one prediction
    pub max_prefetch_candidates: usize,
    /// Timeout applied to each background prefetch fetch
    pub prefetch_timeout_ms: u64,
    /// Number of prefetch cycles that may wait for the worker
    pub prefetch_queue_depth: usize,
    /// Interval of the periodic safety-net sweep, in seconds
    pub sweep_interval_secs: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Base URL the binary's fetch adapter downloads prefetched keys from
    pub prefetch_origin: String,
    /// Scoring weights for priority and eviction
    pub weights: ScoringWeights,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_SIZE_BYTES` (default: 100 MiB)
    /// - `MAX_ENTRIES` (default: 1000)
    /// - `CLEANUP_THRESHOLD_RATIO` (default: 0.8)
    /// - `EVICTION_TARGET_RATIO` (default: 0.7)
    /// - `PREDICTION_HORIZON_MS` (default: 24h)
    /// - `BEHAVIOR_WINDOW_MS` (default: 30 days)
    /// - `MIN_ACCESS_THRESHOLD` (default: 3)
    /// - `MAX_PREFETCH_CANDIDATES` (default: 5)
    /// - `PREFETCH_TIMEOUT_MS` (default: 10000)
    /// - `PREFETCH_QUEUE_DEPTH` (default: 64)
    /// - `SWEEP_INTERVAL_SECS` (default: 3600)
    /// - `SERVER_PORT` (default: 3000)
    /// - `PREFETCH_ORIGIN` (default: http://127.0.0.1:8080/media)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size_bytes: env_or("MAX_SIZE_BYTES", defaults.max_size_bytes),
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            cleanup_threshold_ratio: env_or(
                "CLEANUP_THRESHOLD_RATIO",
                defaults.cleanup_threshold_ratio,
            ),
            eviction_target_ratio: env_or("EVICTION_TARGET_RATIO", defaults.eviction_target_ratio),
            prediction_horizon_ms: env_or("PREDICTION_HORIZON_MS", defaults.prediction_horizon_ms),
            behavior_window_ms: env_or("BEHAVIOR_WINDOW_MS", defaults.behavior_window_ms),
            min_access_threshold: env_or("MIN_ACCESS_THRESHOLD", defaults.min_access_threshold),
            max_prefetch_candidates: env_or(
                "MAX_PREFETCH_CANDIDATES",
                defaults.max_prefetch_candidates,
            ),
            prefetch_timeout_ms: env_or("PREFETCH_TIMEOUT_MS", defaults.prefetch_timeout_ms),
            prefetch_queue_depth: env_or("PREFETCH_QUEUE_DEPTH", defaults.prefetch_queue_depth),
            sweep_interval_secs: env_or("SWEEP_INTERVAL_SECS", defaults.sweep_interval_secs),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            prefetch_origin: env::var("PREFETCH_ORIGIN").unwrap_or(defaults.prefetch_origin),
            weights: defaults.weights,
        }
    }

    /// Convenience constructor for small caches, mostly used in tests.
    pub fn with_capacity(max_size_bytes: u64, max_entries: usize) -> Self {
        Self {
            max_size_bytes,
            max_entries,
            ..Self::default()
        }
    }

    /// Checks that the configuration is internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.max_size_bytes == 0 {
            return Err(CacheError::Configuration(
                "max_size_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_entries == 0 {
            return Err(CacheError::Configuration(
                "max_entries must be greater than zero".to_string(),
            ));
        }
        if !(self.cleanup_threshold_ratio > 0.0 && self.cleanup_threshold_ratio <= 1.0) {
            return Err(CacheError::Configuration(format!(
                "cleanup_threshold_ratio must be in (0, 1], got {}",
                self.cleanup_threshold_ratio
            )));
        }
        if !(self.eviction_target_ratio > 0.0
            && self.eviction_target_ratio < self.cleanup_threshold_ratio)
        {
            return Err(CacheError::Configuration(format!(
                "eviction_target_ratio must be in (0, cleanup_threshold_ratio), got {}",
                self.eviction_target_ratio
            )));
        }
        if self.max_prefetch_candidates == 0 || self.prefetch_queue_depth == 0 {
            return Err(CacheError::Configuration(
                "prefetch candidate count and queue depth must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Byte occupancy a sweep drives the cache down to.
    pub fn target_size_bytes(&self) -> u64 {
        (self.max_size_bytes as f64 * self.eviction_target_ratio) as u64
    }

    /// Entry count a sweep drives the cache down to.
    pub fn target_entries(&self) -> usize {
        (self.max_entries as f64 * self.eviction_target_ratio).floor() as usize
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_size_bytes: 100 * 1024 * 1024,
            max_entries: 1000,
            cleanup_threshold_ratio: 0.8,
            eviction_target_ratio: 0.7,
            prediction_horizon_ms: DAY_MS,
            behavior_window_ms: 30 * DAY_MS,
            min_access_threshold: 3,
            max_prefetch_candidates: 5,
            prefetch_timeout_ms: 10_000,
            prefetch_queue_depth: 64,
            sweep_interval_secs: 3600,
            server_port: 3000,
            prefetch_origin: "http://127.0.0.1:8080/media".to_string(),
            weights: ScoringWeights::default(),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
