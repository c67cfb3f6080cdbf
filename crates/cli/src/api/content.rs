//! AI content endpoints

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use social_autopilot_domain::{
    CaptionRequest, HashtagsRequest, IdeasRequest, ReplyRequest, VariationsRequest,
};

use super::AppState;
use super::error::{ApiJson, ApiResult};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/ai/generate-caption", post(caption))
        .route("/api/ai/generate-variations", post(variations))
        .route("/api/ai/generate-hashtags", post(hashtags))
        .route("/api/ai/generate-reply", post(reply))
        .route("/api/ai/content-ideas", post(ideas))
        .route("/api/insights/:client_id/best-times", get(best_times))
}

async fn caption(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CaptionRequest>,
) -> ApiResult {
    let caption = state.content.caption(request).await?;
    Ok(Json(json!({ "success": true, "caption": caption })))
}

async fn variations(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VariationsRequest>,
) -> ApiResult {
    let variations = state.content.variations(request).await?;
    Ok(Json(json!({ "success": true, "variations": variations })))
}

async fn hashtags(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<HashtagsRequest>,
) -> ApiResult {
    let hashtags = state.content.hashtags(request).await?;
    Ok(Json(json!({ "success": true, "hashtags": hashtags })))
}

async fn reply(State(state): State<AppState>, ApiJson(request): ApiJson<ReplyRequest>) -> ApiResult {
    let reply = state.content.reply(request).await?;
    Ok(Json(json!({ "success": true, "reply": reply })))
}

async fn ideas(State(state): State<AppState>, ApiJson(request): ApiJson<IdeasRequest>) -> ApiResult {
    let ideas = state.content.ideas(request).await?;
    Ok(Json(json!({ "success": true, "ideas": ideas })))
}

async fn best_times(State(state): State<AppState>, Path(client_id): Path<String>) -> ApiResult {
    let recommendations = state.content.best_times(&client_id).await?;
    Ok(Json(json!({ "success": true, "recommendations": recommendations })))
}
