//! Diagnostic export of the cache state. Never carries payloads.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::cache::{CacheEntry, Category, StatsSnapshot};
use crate::config::Config;

/// Per-entry diagnostic row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySummary {
    pub key: String,
    pub size_bytes: u64,
    pub access_count: u64,
    pub priority: f64,
    pub category: Category,
    pub tags: BTreeSet<String>,
    pub age_ms: u64,
    /// None when the entry never expires
    pub expires_in_ms: Option<u64>,
}

impl EntrySummary {
    pub fn from_entry(entry: &CacheEntry, now: u64) -> Self {
        Self {
            key: entry.key.clone(),
            size_bytes: entry.size_bytes,
            access_count: entry.access_count,
            priority: entry.priority,
            category: entry.category,
            tags: entry.tags.clone(),
            age_ms: entry.age_ms(now),
            expires_in_ms: entry.ttl_remaining_ms(now),
        }
    }
}

/// Full diagnostic snapshot returned by `export_state`.
#[derive(Debug, Clone, Serialize)]
pub struct StateExport {
    pub config: Config,
    pub stats: StatsSnapshot,
    pub entries: Vec<EntrySummary>,
}
