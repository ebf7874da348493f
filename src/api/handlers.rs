//! API Handlers
//!
//! HTTP request handlers exposing the consumer API of the cache.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::behavior::BehaviorUpdate;
use crate::cache::{StateExport, StatsSnapshot};
use crate::error::{CacheError, Result};
use crate::models::{
    BehaviorResponse, ClearResponse, ConfirmPredictionRequest, ConfirmPredictionResponse,
    DeleteResponse, GetQuery, GetResponse, HealthResponse, SetRequest, SetResponse,
};
use crate::predictive::PredictiveCache;

/// Application state shared across all handlers.
///
/// The cache serializes its own mutations; handlers only hold an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<PredictiveCache>,
}

impl AppState {
    /// Creates a new AppState around a built cache.
    pub fn new(cache: PredictiveCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }
}

/// Handler for PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state
        .cache
        .set(
            req.key.clone(),
            req.payload(),
            req.metadata(),
            req.user_id.as_deref(),
        )
        .await?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<GetQuery>,
) -> Result<Json<GetResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let payload = state.cache.get(&key, query.user_id.as_deref()).await?;

    Ok(Json(GetResponse::new(key, &payload)))
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.cache.delete(&key).await {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.cache.clear().await;
    Json(ClearResponse::new())
}

/// Handler for POST /behavior/:user_id
pub async fn behavior_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(update): Json<BehaviorUpdate>,
) -> Result<Json<BehaviorResponse>> {
    let profile = state.cache.record_user_behavior(&user_id, update).await?;

    Ok(Json(BehaviorResponse::from_profile(&profile)))
}

/// Handler for POST /predictions/confirm
pub async fn confirm_prediction_handler(
    State(state): State<AppState>,
    Json(req): Json<ConfirmPredictionRequest>,
) -> Json<ConfirmPredictionResponse> {
    let confirmed = state.cache.confirm_prediction(&req.user_id, &req.key).await;

    Json(ConfirmPredictionResponse {
        user_id: req.user_id,
        key: req.key,
        confirmed,
    })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.cache.get_stats().await)
}

/// Handler for GET /state
pub async fn state_handler(State(state): State<AppState>) -> Json<StateExport> {
    Json(state.cache.export_state().await)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_support::{MockFetcher, MockOracle};

    fn state() -> AppState {
        let cache = PredictiveCache::builder(Config::default())
            .oracle(Arc::new(MockOracle::default()))
            .fetcher(Arc::new(MockFetcher::default()))
            .build()
            .unwrap();
        AppState::new(cache)
    }

    fn set_request(key: &str, value: serde_json::Value) -> SetRequest {
        serde_json::from_value(serde_json::json!({"key": key, "value": value})).unwrap()
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = state();

        let result = set_handler(
            State(state.clone()),
            Json(set_request("test_key", serde_json::json!("test_value"))),
        )
        .await;
        assert!(result.is_ok());

        let response = get_handler(
            State(state.clone()),
            Path("test_key".to_string()),
            Query(GetQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(response.value, Some(serde_json::json!("test_value")));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let result = get_handler(
            State(state()),
            Path("nonexistent".to_string()),
            Query(GetQuery::default()),
        )
        .await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_with_empty_user_is_invalid() {
        let state = state();
        set_handler(
            State(state.clone()),
            Json(set_request("song:1", serde_json::json!("v"))),
        )
        .await
        .unwrap();

        let result = get_handler(
            State(state.clone()),
            Path("song:1".to_string()),
            Query(GetQuery {
                user_id: Some(String::new()),
            }),
        )
        .await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
        assert!(state.cache.user_profile("").await.is_none());
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = state();
        set_handler(
            State(state.clone()),
            Json(set_request("to_delete", serde_json::json!(1))),
        )
        .await
        .unwrap();

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_ok());

        let result = delete_handler(State(state), Path("to_delete".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stats_handler_on_empty_cache() {
        let response = stats_handler(State(state())).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.hit_rate, 0.0);
        assert_eq!(response.prediction_accuracy, 0.0);
    }

    #[tokio::test]
    async fn test_behavior_handler() {
        let update: BehaviorUpdate =
            serde_json::from_str(r#"{"search_history": ["a", "b"]}"#).unwrap();
        let response = behavior_handler(State(state()), Path("u1".to_string()), Json(update))
            .await
            .unwrap();
        assert_eq!(response.searches, 2);
    }

    #[tokio::test]
    async fn test_confirm_unknown_prediction() {
        let response = confirm_prediction_handler(
            State(state()),
            Json(ConfirmPredictionRequest {
                user_id: "u1".to_string(),
                key: "song:1".to_string(),
            }),
        )
        .await;
        assert!(!response.confirmed);
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let result = set_handler(State(state()), Json(set_request("", serde_json::json!(1)))).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
