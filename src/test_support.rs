//! Test doubles for the injected collaborators.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;

use crate::behavior::UserBehaviorProfile;
use crate::prediction::{DataFetcher, PredictionOracle, PredictionRequest};

#[derive(Default)]
pub struct MockOracle {
    predictions: Vec<String>,
    fail: bool,
    personalized: f64,
    updates: Mutex<Vec<String>>,
    prediction_calls: AtomicUsize,
}

impl MockOracle {
    pub fn with_predictions<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            predictions: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_personalized(mut self, score: f64) -> Self {
        self.personalized = score;
        self
    }

    pub fn model_updates(&self) -> Vec<String> {
        self.updates.lock().unwrap().clone()
    }

    pub fn prediction_calls(&self) -> usize {
        self.prediction_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PredictionOracle for MockOracle {
    async fn predict_next_items(&self, _request: &PredictionRequest) -> anyhow::Result<Vec<String>> {
        self.prediction_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("model unavailable"));
        }
        Ok(self.predictions.clone())
    }

    async fn update_model(&self, profile: &UserBehaviorProfile) -> anyhow::Result<()> {
        if self.fail {
            return Err(anyhow!("model unavailable"));
        }
        self.updates.lock().unwrap().push(profile.user_id.clone());
        Ok(())
    }

    async fn popularity_score(&self, _key: &str) -> anyhow::Result<f64> {
        Ok(0.0)
    }

    async fn personalized_score(&self, _user_id: &str, _key: &str) -> anyhow::Result<f64> {
        if self.fail {
            return Err(anyhow!("model unavailable"));
        }
        Ok(self.personalized)
    }
}

#[derive(Default)]
pub struct MockFetcher {
    calls: Mutex<Vec<String>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
}

impl MockFetcher {
    pub fn failing_on<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            failing: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }
}

#[async_trait]
impl DataFetcher for MockFetcher {
    async fn fetch(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        self.calls.lock().unwrap().push(key.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(key) {
            return Err(anyhow!("origin returned 503 for {}", key));
        }
        Ok(format!("bytes of {}", key).into_bytes())
    }
}
