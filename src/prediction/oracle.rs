//! Seams to the external prediction model and to the media origin.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::behavior::UserBehaviorProfile;

// == Prediction Request ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRequest {
    pub user_id: String,
    pub current_key: String,
    /// Free-form context; always carries `time` (Unix milliseconds)
    pub context: HashMap<String, serde_json::Value>,
}

impl PredictionRequest {
    pub fn new(user_id: impl Into<String>, current_key: impl Into<String>, now: u64) -> Self {
        let mut context = HashMap::new();
        context.insert("time".to_string(), serde_json::Value::from(now));
        Self {
            user_id: user_id.into(),
            current_key: current_key.into(),
            context,
        }
    }
}

// == Prediction Oracle ==
/// Behavior-prediction model injected into the cache.
///
/// Errors are reported to the log by the caller and never reach a cache user.
#[async_trait]
pub trait PredictionOracle: Send + Sync {
    /// Keys likely to be requested next, highest confidence first.
    async fn predict_next_items(&self, request: &PredictionRequest) -> anyhow::Result<Vec<String>>;

    /// Feeds an updated behavior profile to the model.
    async fn update_model(&self, profile: &UserBehaviorProfile) -> anyhow::Result<()>;

    /// Global popularity of a key, in `[0, 1]`.
    async fn popularity_score(&self, key: &str) -> anyhow::Result<f64>;

    /// Affinity of a user for a key, in `[0, 1]`.
    async fn personalized_score(&self, user_id: &str, key: &str) -> anyhow::Result<f64>;
}

// == Data Fetcher ==
/// Loads the bytes of a predicted key for background prefetch.
#[async_trait]
pub trait DataFetcher: Send + Sync {
    async fn fetch(&self, key: &str) -> anyhow::Result<Vec<u8>>;
}
