//! Request DTOs for the cache HTTP surface
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::cache::{Category, EntryMetadata, Payload};

/// Maximum accepted key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Request body for the SET operation (PUT /set)
///
/// A JSON string value is stored as text; any other JSON value is stored
/// as structured data.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: serde_json::Value,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Optional TTL in milliseconds
    #[serde(default)]
    pub ttl_ms: Option<u64>,
    /// User on whose behalf the entry is stored; enables prefetch for audio
    #[serde(default)]
    pub user_id: Option<String>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} characters",
                MAX_KEY_LENGTH
            ));
        }
        if matches!(self.user_id.as_deref(), Some("")) {
            return Some("User id cannot be empty".to_string());
        }
        None
    }

    pub fn metadata(&self) -> EntryMetadata {
        let metadata = EntryMetadata {
            category: self.category,
            tags: self.tags.clone(),
            ..EntryMetadata::default()
        };
        match self.ttl_ms {
            Some(ttl_ms) => metadata.with_ttl_ms(ttl_ms),
            None => metadata,
        }
    }

    pub fn payload(&self) -> Payload {
        match &self.value {
            serde_json::Value::String(text) => Payload::Text(text.clone()),
            other => Payload::Structured(other.clone()),
        }
    }
}

/// Query string for GET /get/:key
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

impl GetQuery {
    /// Returns an error message if the query is invalid, None if valid.
    pub fn validate(&self) -> Option<String> {
        if matches!(self.user_id.as_deref(), Some("")) {
            return Some("User id cannot be empty".to_string());
        }
        None
    }
}

/// Request body for POST /predictions/confirm
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmPredictionRequest {
    pub user_id: String,
    pub key: String,
}
