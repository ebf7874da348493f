//! Response DTOs for the cache HTTP surface
//!
//! Defines the structure of outgoing HTTP response bodies. Stats and state
//! exports are served as the library's own serializable types.

use serde::Serialize;

use crate::behavior::UserBehaviorProfile;
use crate::cache::Payload;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// `text`, `json`, `binary` or `opaque`
    pub kind: String,
    /// JSON form of the value; absent for binary and opaque payloads
    pub value: Option<serde_json::Value>,
    pub size_bytes: u64,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, payload: &Payload) -> Self {
        let kind = match payload {
            Payload::Text(_) => "text",
            Payload::Structured(_) => "json",
            Payload::Binary(_) => "binary",
            Payload::Opaque(_) => "opaque",
        };
        Self {
            key: key.into(),
            kind: kind.to_string(),
            value: payload.to_json(),
            size_bytes: payload.estimated_size(),
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for POST /clear
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn new() -> Self {
        Self {
            message: "Cache cleared".to_string(),
        }
    }
}

impl Default for ClearResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response body for POST /behavior/:user_id
#[derive(Debug, Clone, Serialize)]
pub struct BehaviorResponse {
    pub user_id: String,
    pub listens: usize,
    pub searches: usize,
    pub playlist_interactions: usize,
    pub peak_hour: Option<u32>,
}

impl BehaviorResponse {
    pub fn from_profile(profile: &UserBehaviorProfile) -> Self {
        Self {
            user_id: profile.user_id.clone(),
            listens: profile.listen_history.len(),
            searches: profile.search_history.len(),
            playlist_interactions: profile.playlist_interactions.len(),
            peak_hour: profile.time_patterns.peak_hour,
        }
    }
}

/// Response body for POST /predictions/confirm
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmPredictionResponse {
    pub user_id: String,
    pub key: String,
    /// False when the key was not pending for this user within the horizon
    pub confirmed: bool,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_response_text() {
        let resp = GetResponse::new("test_key", &Payload::from("test_value"));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("test_key"));
        assert!(json.contains("test_value"));
        assert_eq!(resp.kind, "text");
    }

    #[test]
    fn test_get_response_binary_has_no_value() {
        let resp = GetResponse::new("blob", &Payload::Binary(vec![1, 2, 3]));
        assert_eq!(resp.kind, "binary");
        assert!(resp.value.is_none());
        assert_eq!(resp.size_bytes, 3);
    }

    #[test]
    fn test_set_and_delete_messages() {
        assert!(SetResponse::new("my_key").message.contains("successfully"));
        assert!(DeleteResponse::new("gone").message.contains("deleted"));
        assert_eq!(ClearResponse::default().message, "Cache cleared");
    }

    #[test]
    fn test_behavior_response_counts() {
        let mut profile = UserBehaviorProfile::new("u1");
        profile.search_history.push("lofi".to_string());
        let resp = BehaviorResponse::from_profile(&profile);
        assert_eq!(resp.searches, 1);
        assert_eq!(resp.listens, 0);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
