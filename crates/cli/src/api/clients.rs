use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use social_autopilot_domain::{ClientUpdate, ConnectRequest, NewClient, Platform};

use super::AppState;
use super::error::{ApiJson, ApiResult};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/clients", post(create).get(list))
        .route("/api/clients/:id", get(show).put(update).delete(remove))
        .route("/api/clients/:id/connect/:platform", post(connect))
        .route("/api/clients/:id/platforms", get(platforms))
}

async fn create(State(state): State<AppState>, ApiJson(request): ApiJson<NewClient>) -> ApiResult {
    let client = state.clients.create(request).await?;
    Ok(Json(json!({ "success": true, "client": client })))
}

async fn list(State(state): State<AppState>) -> ApiResult {
    let clients = state.clients.list().await?;
    Ok(Json(json!({ "success": true, "total": clients.len(), "clients": clients })))
}

async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let client = state.clients.get(&id).await?;
    Ok(Json(json!({ "success": true, "client": client })))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ClientUpdate>,
) -> ApiResult {
    let client = state.clients.update(&id, update).await?;
    Ok(Json(json!({ "success": true, "client": client })))
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.clients.delete(&id).await?;
    Ok(Json(json!({ "success": true, "message": "Client deleted" })))
}

async fn connect(
    State(state): State<AppState>,
    Path((id, platform)): Path<(String, String)>,
    ApiJson(request): ApiJson<ConnectRequest>,
) -> ApiResult {
    let platform = state.clients.connect(&id, &platform, request).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("{} connected", display_name(platform)),
    })))
}

async fn platforms(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let platforms = state.clients.platforms(&id).await?;
    Ok(Json(json!({ "success": true, "platforms": platforms })))
}

fn display_name(platform: Platform) -> &'static str {
    match platform {
        Platform::Facebook => "Facebook",
        Platform::Instagram => "Instagram",
        Platform::Twitter => "Twitter",
        Platform::Linkedin => "LinkedIn",
        Platform::Tiktok => "TikTok",
        Platform::Youtube => "YouTube",
    }
}
