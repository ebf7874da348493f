//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    behavior_handler, clear_handler, confirm_prediction_handler, delete_handler, get_handler,
    health_handler, set_handler, state_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Store a value with optional metadata and user
/// - `GET /get/:key?user_id=` - Retrieve a value by key
/// - `DELETE /del/:key` - Delete a key
/// - `POST /clear` - Remove every entry
/// - `POST /behavior/:user_id` - Merge behavior into a user profile
/// - `POST /predictions/confirm` - Confirm a pending prediction
/// - `GET /stats` - Cache statistics
/// - `GET /state` - Configuration, stats and entry summaries
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/clear", post(clear_handler))
        .route("/behavior/:user_id", post(behavior_handler))
        .route("/predictions/confirm", post(confirm_prediction_handler))
        .route("/stats", get(stats_handler))
        .route("/state", get(state_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
