//! Predictive Cache - a size-bounded content cache driven by user behavior
//!
//! Stores arbitrary payloads under string keys, ranks entries by a weighted
//! priority when evicting, records per-user listening behavior, and prefetches
//! the items a prediction oracle expects a user to request next.

pub mod api;
pub mod behavior;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod prediction;
pub mod predictive;
pub mod prefetch;
pub mod tasks;

#[cfg(test)]
mod test_support;

pub use api::{create_router, AppState};
pub use behavior::{BehaviorUpdate, ListenEvent, UserBehaviorProfile};
pub use cache::{Category, EntryMetadata, Payload, StateExport, StatsSnapshot};
pub use config::{Config, ScoringWeights};
pub use error::{CacheError, Result};
pub use prediction::{
    DataFetcher, FrequencyOracle, HttpFetcher, PredictionOracle, PredictionRequest,
};
pub use predictive::{CacheBuilder, PredictiveCache};
pub use tasks::spawn_sweep_task;
