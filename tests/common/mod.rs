//! Shared doubles for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use predictive_cache::{
    Config, DataFetcher, PredictionOracle, PredictionRequest, PredictiveCache,
    UserBehaviorProfile,
};

/// Oracle returning a fixed list of predictions.
#[derive(Default)]
pub struct ScriptedOracle {
    pub predictions: Vec<String>,
    pub fail: bool,
    pub updates: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn predicting(count: usize) -> Self {
        Self {
            predictions: (0..count).map(|i| format!("song:next:{}", i)).collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl PredictionOracle for ScriptedOracle {
    async fn predict_next_items(&self, _request: &PredictionRequest) -> anyhow::Result<Vec<String>> {
        if self.fail {
            return Err(anyhow!("model offline"));
        }
        Ok(self.predictions.clone())
    }

    async fn update_model(&self, profile: &UserBehaviorProfile) -> anyhow::Result<()> {
        if self.fail {
            return Err(anyhow!("model offline"));
        }
        self.updates.lock().unwrap().push(profile.user_id.clone());
        Ok(())
    }

    async fn popularity_score(&self, _key: &str) -> anyhow::Result<f64> {
        Ok(0.5)
    }

    async fn personalized_score(&self, _user_id: &str, _key: &str) -> anyhow::Result<f64> {
        if self.fail {
            return Err(anyhow!("model offline"));
        }
        Ok(0.5)
    }
}

/// Fetcher recording every key it was asked for.
#[derive(Default)]
pub struct RecordingFetcher {
    pub fetched: Mutex<Vec<String>>,
}

impl RecordingFetcher {
    pub fn fetched(&self) -> Vec<String> {
        let mut keys = self.fetched.lock().unwrap().clone();
        keys.sort();
        keys
    }
}

#[async_trait]
impl DataFetcher for RecordingFetcher {
    async fn fetch(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        self.fetched.lock().unwrap().push(key.to_string());
        Ok(key.as_bytes().to_vec())
    }
}

pub fn build_cache(
    config: Config,
    oracle: Arc<ScriptedOracle>,
    fetcher: Arc<RecordingFetcher>,
) -> PredictiveCache {
    PredictiveCache::builder(config)
        .oracle(oracle)
        .fetcher(fetcher)
        .build()
        .unwrap()
}
