use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use social_autopilot_domain::usecases::AutoReplyOutcome;
use social_autopilot_domain::{AutoReplyRules, IncomingComment};

use super::AppState;
use super::error::{ApiJson, ApiResult};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auto-reply/:client_id/enable", post(enable))
        .route("/api/auto-reply/:client_id/process", post(process))
        .route("/api/auto-reply/:client_id/history", get(history))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnableRequest {
    rules: Option<AutoReplyRules>,
}

async fn enable(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    ApiJson(request): ApiJson<EnableRequest>,
) -> ApiResult {
    state.auto_reply.enable(&client_id, request.rules).await?;
    Ok(Json(json!({ "success": true, "message": "Auto-reply enabled" })))
}

async fn process(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    ApiJson(comment): ApiJson<IncomingComment>,
) -> ApiResult {
    match state.auto_reply.process(&client_id, comment).await? {
        AutoReplyOutcome::Sent(record) => Ok(Json(json!({ "success": true, "reply": record.reply }))),
        AutoReplyOutcome::Disabled => Ok(Json(json!({
            "success": false,
            "message": "Auto-reply not enabled",
        }))),
    }
}

async fn history(State(state): State<AppState>, Path(client_id): Path<String>) -> ApiResult {
    let replies = state.auto_reply.history(&client_id).await?;
    Ok(Json(json!({ "success": true, "total": replies.len(), "replies": replies })))
}
