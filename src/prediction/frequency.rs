//! Frequency Oracle
//!
//! A small built-in prediction model. It learns which song tends to follow
//! which from each user's listen history and how often each song is played.
//! Each `update_model` call replaces that user's contribution, so the full
//! bounded history can be resubmitted without double counting.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::behavior::UserBehaviorProfile;
use crate::prediction::{PredictionOracle, PredictionRequest};

/// Upper bound on keys returned by one prediction.
const MAX_PREDICTIONS: usize = 20;

#[derive(Debug, Default)]
struct UserModel {
    /// previous song -> next song -> count
    transitions: HashMap<String, HashMap<String, u64>>,
    plays: HashMap<String, u64>,
    total_plays: u64,
}

impl UserModel {
    fn from_profile(profile: &UserBehaviorProfile) -> Self {
        let mut model = Self::default();
        // History is newest first; walk it oldest first
        let chronological: Vec<&str> = profile
            .listen_history
            .iter()
            .rev()
            .map(|listen| listen.song_id.as_str())
            .collect();

        for song in &chronological {
            *model.plays.entry(song.to_string()).or_default() += 1;
            model.total_plays += 1;
        }
        for pair in chronological.windows(2) {
            if pair[0] != pair[1] {
                *model
                    .transitions
                    .entry(pair[0].to_string())
                    .or_default()
                    .entry(pair[1].to_string())
                    .or_default() += 1;
            }
        }
        model
    }
}

#[derive(Debug, Default)]
pub struct FrequencyOracle {
    users: RwLock<HashMap<String, UserModel>>,
}

impl FrequencyOracle {
    pub fn new() -> Self {
        Self::default()
    }

    fn global_plays(users: &HashMap<String, UserModel>) -> HashMap<&str, u64> {
        let mut plays: HashMap<&str, u64> = HashMap::new();
        for model in users.values() {
            for (song, count) in &model.plays {
                *plays.entry(song.as_str()).or_default() += count;
            }
        }
        plays
    }
}

/// Sorts by descending count, then key, and keeps the keys.
fn ranked(counts: HashMap<&str, u64>) -> Vec<String> {
    let mut ranked: Vec<(&str, u64)> = counts.into_iter().collect();
    ranked.sort_by(|(ka, a), (kb, b)| b.cmp(a).then_with(|| ka.cmp(kb)));
    ranked.into_iter().map(|(key, _)| key.to_string()).collect()
}

#[async_trait]
impl PredictionOracle for FrequencyOracle {
    async fn predict_next_items(&self, request: &PredictionRequest) -> anyhow::Result<Vec<String>> {
        let users = self.users.read().await;

        let mut successors: HashMap<&str, u64> = HashMap::new();
        for model in users.values() {
            if let Some(next) = model.transitions.get(&request.current_key) {
                for (song, count) in next {
                    *successors.entry(song.as_str()).or_default() += count;
                }
            }
        }

        let mut predictions = ranked(successors);
        let mut seen: HashSet<String> = predictions.iter().cloned().collect();
        seen.insert(request.current_key.clone());

        // Pad with globally popular songs
        for song in ranked(Self::global_plays(&users)) {
            if predictions.len() >= MAX_PREDICTIONS {
                break;
            }
            if seen.insert(song.clone()) {
                predictions.push(song);
            }
        }
        predictions.truncate(MAX_PREDICTIONS);

        debug!(
            "Predicted {} keys after '{}' for user '{}'",
            predictions.len(),
            request.current_key,
            request.user_id
        );
        Ok(predictions)
    }

    async fn update_model(&self, profile: &UserBehaviorProfile) -> anyhow::Result<()> {
        let model = UserModel::from_profile(profile);
        self.users.write().await.insert(profile.user_id.clone(), model);
        Ok(())
    }

    async fn popularity_score(&self, key: &str) -> anyhow::Result<f64> {
        let users = self.users.read().await;
        let plays = Self::global_plays(&users);
        let max = plays.values().copied().max().unwrap_or(0);
        if max == 0 {
            return Ok(0.0);
        }
        Ok(plays.get(key).copied().unwrap_or(0) as f64 / max as f64)
    }

    async fn personalized_score(&self, user_id: &str, key: &str) -> anyhow::Result<f64> {
        let users = self.users.read().await;
        let Some(model) = users.get(user_id) else {
            return Ok(0.0);
        };
        if model.total_plays == 0 {
            return Ok(0.0);
        }
        Ok(model.plays.get(key).copied().unwrap_or(0) as f64 / model.total_plays as f64)
    }
}
