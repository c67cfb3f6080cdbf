//! Read-only proxy to the configured Instagram business account

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use social_autopilot_adapters::graph::InstagramGraphClient;
use std::sync::Arc;

use super::AppState;
use super::error::{ApiError, ApiResult};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/instagram/test", get(test))
        .route("/api/instagram/media", get(media))
        .route("/api/instagram/insights", get(insights))
}

fn graph(state: &AppState) -> Result<Arc<InstagramGraphClient>, ApiError> {
    state.instagram.clone().ok_or_else(|| {
        ApiError::Upstream(Value::String(
            "Instagram Graph API is not configured".to_string(),
        ))
    })
}

async fn test(State(state): State<AppState>) -> ApiResult {
    let data = graph(&state)?.test().await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

async fn media(State(state): State<AppState>) -> ApiResult {
    let data = graph(&state)?.media().await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

async fn insights(State(state): State<AppState>) -> ApiResult {
    let data = graph(&state)?.insights().await?;
    Ok(Json(json!({ "success": true, "data": data })))
}
