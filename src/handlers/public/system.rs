use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::handlers::AppState;

/// GET / - Service banner
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "type": "success",
        "message": "Shelter API",
        "data": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "environment": format!("{:?}", state.config.environment).to_lowercase(),
        }
    }))
}

/// GET /health - Store reachability
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.gateway.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "type": "success", "message": "healthy", "data": { "database": "up" } })),
        ),
        Err(e) => {
            tracing::warn!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "type": "error", "message": "database unavailable", "code": "unavailable" })),
            )
        }
    }
}
