//! Cache Entry Module
//!
//! Defines cache entries, their payloads and the metadata supplied on insert.

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::DAY_MS;

/// Size assumed for payloads that cannot be measured.
pub const DEFAULT_SIZE_ESTIMATE: u64 = 1024;

// == Category ==
/// Kind of media payload; drives the category weight in priority scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Audio,
    Image,
    #[default]
    Metadata,
}

// == Payload ==
/// Owned value stored in a cache entry.
#[derive(Clone)]
pub enum Payload {
    /// Text, sized as UTF-16 code units times two
    Text(String),
    /// Raw bytes, sized by length
    Binary(Vec<u8>),
    /// Structured data, sized by its serialized JSON length times two
    Structured(serde_json::Value),
    /// Arbitrary in-process value; cannot be measured
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Payload {
    /// Converts any serializable value into a structured payload.
    ///
    /// Returns `None` when the value cannot be represented as JSON.
    pub fn from_serializable<T: Serialize>(value: &T) -> Option<Self> {
        serde_json::to_value(value).ok().map(Payload::Structured)
    }

    /// Wraps an arbitrary value that is only ever read back in-process.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Payload::Opaque(Arc::new(value))
    }

    // == Size Estimation ==
    /// Estimates the in-memory footprint of the payload in bytes.
    ///
    /// Never fails: anything that cannot be measured is charged
    /// [`DEFAULT_SIZE_ESTIMATE`].
    pub fn estimated_size(&self) -> u64 {
        match self {
            Payload::Text(text) => text.encode_utf16().count() as u64 * 2,
            Payload::Binary(bytes) => bytes.len() as u64,
            Payload::Structured(value) => serde_json::to_vec(value)
                .map(|encoded| encoded.len() as u64 * 2)
                .unwrap_or(DEFAULT_SIZE_ESTIMATE),
            Payload::Opaque(_) => DEFAULT_SIZE_ESTIMATE,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Binary(bytes) => Some(bytes),
            Payload::Text(text) => Some(text.as_bytes()),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Structured(value) => Some(value),
            _ => None,
        }
    }

    /// Borrows an opaque payload as its concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Payload::Opaque(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Deserializes a structured payload into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Option<T> {
        self.as_json()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// JSON view of the payload, used by the HTTP surface.
    ///
    /// Binary and opaque payloads have no JSON form.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Payload::Text(text) => Some(serde_json::Value::String(text.clone())),
            Payload::Structured(value) => Some(value.clone()),
            Payload::Binary(_) | Payload::Opaque(_) => None,
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Payload::Binary(bytes) => write!(f, "Binary({} bytes)", bytes.len()),
            Payload::Structured(value) => f.debug_tuple("Structured").field(value).finish(),
            Payload::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Binary(value)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Structured(value)
    }
}

// == Entry Metadata ==
/// Caller-supplied description of an entry, given on every `set`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub category: Category,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Absolute expiration timestamp (Unix milliseconds)
    #[serde(default)]
    pub expires_at: Option<u64>,
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
}

impl EntryMetadata {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            ..Self::default()
        }
    }

    pub fn audio() -> Self {
        Self::new(Category::Audio)
    }

    pub fn image() -> Self {
        Self::new(Category::Image)
    }

    pub fn metadata() -> Self {
        Self::new(Category::Metadata)
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn expires_at(mut self, timestamp_ms: u64) -> Self {
        self.expires_at = Some(timestamp_ms);
        self
    }

    /// Sets the expiration relative to the current time.
    pub fn with_ttl_ms(self, ttl_ms: u64) -> Self {
        self.expires_at(current_timestamp_ms().saturating_add(ttl_ms))
    }

    pub fn depends_on(mut self, key: impl Into<String>) -> Self {
        self.dependencies.insert(key.into());
        self
    }
}

// == Cache Entry ==
/// A single cache entry with its payload and usage bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Payload,
    /// Estimated footprint, fixed at insertion
    pub size_bytes: u64,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Last successful read or insertion (Unix milliseconds)
    pub last_accessed_at: u64,
    pub access_count: u64,
    /// Usefulness signal, recomputed on insert and on every hit
    pub priority: f64,
    pub category: Category,
    pub tags: BTreeSet<String>,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
    pub dependencies: BTreeSet<String>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry at `now`. Priority starts at zero and is set by
    /// the store right after construction.
    pub fn new(key: String, payload: Payload, metadata: EntryMetadata, now: u64) -> Self {
        let size_bytes = payload.estimated_size();
        Self {
            key,
            payload,
            size_bytes,
            created_at: now,
            last_accessed_at: now,
            access_count: 0,
            priority: 0.0,
            category: metadata.category,
            tags: metadata.tags,
            expires_at: metadata.expires_at,
            dependencies: metadata.dependencies,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry has expired at `now`.
    ///
    /// An entry is expired once the current time reaches its expiration time.
    pub fn is_expired_at(&self, now: u64) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Fractional days elapsed since the last access.
    pub fn days_since_access(&self, now: u64) -> f64 {
        now.saturating_sub(self.last_accessed_at) as f64 / DAY_MS as f64
    }

    /// Fractional days left before expiry, None if the entry never expires.
    pub fn days_until_expiry(&self, now: u64) -> Option<f64> {
        self.expires_at
            .map(|expires| (expires as f64 - now as f64) / DAY_MS as f64)
    }

    /// Remaining TTL in milliseconds, `Some(0)` once expired.
    pub fn ttl_remaining_ms(&self, now: u64) -> Option<u64> {
        self.expires_at.map(|expires| expires.saturating_sub(now))
    }

    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
