//! Cache Module
//!
//! Bounded in-memory entry table with scored eviction and lazy expiry.

mod entry;
mod eviction;
mod export;
mod stats;
mod store;


// Re-export public types
pub use entry::{
    current_timestamp_ms, CacheEntry, Category, EntryMetadata, Payload, DEFAULT_SIZE_ESTIMATE,
};
pub use eviction::{EvictionPlanner, SweepTarget};
pub use export::{EntrySummary, StateExport};
pub use stats::{CacheStats, StatsSnapshot};
pub use store::{CacheStore, SweepReport};
