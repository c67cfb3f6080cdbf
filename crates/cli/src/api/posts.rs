use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use social_autopilot_domain::{NewPost, PostUpdate};

use super::AppState;
use super::error::{ApiJson, ApiResult};

// `:id` is a client id for GET and a post id for PUT/DELETE
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/posts/schedule", post(schedule))
        .route("/api/posts/scheduled/:client_id", get(scheduled))
        .route("/api/posts/:id", get(for_client).put(update).delete(cancel))
        .route("/api/posts/:id/publish", post(publish))
}

async fn schedule(State(state): State<AppState>, ApiJson(request): ApiJson<NewPost>) -> ApiResult {
    let post = state.scheduler.schedule(request).await?;
    Ok(Json(json!({ "success": true, "post": post })))
}

async fn scheduled(State(state): State<AppState>, Path(client_id): Path<String>) -> ApiResult {
    let posts = state.scheduler.list_scheduled(&client_id).await?;
    Ok(Json(json!({ "success": true, "total": posts.len(), "posts": posts })))
}

async fn for_client(State(state): State<AppState>, Path(client_id): Path<String>) -> ApiResult {
    let posts = state.scheduler.list_for_client(&client_id).await?;
    Ok(Json(json!({ "success": true, "total": posts.len(), "posts": posts })))
}

async fn update(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    ApiJson(update): ApiJson<PostUpdate>,
) -> ApiResult {
    let post = state.scheduler.update(&post_id, update).await?;
    Ok(Json(json!({ "success": true, "post": post })))
}

async fn cancel(State(state): State<AppState>, Path(post_id): Path<String>) -> ApiResult {
    state.scheduler.cancel(&post_id).await?;
    Ok(Json(json!({ "success": true, "message": "Post cancelled" })))
}

async fn publish(State(state): State<AppState>, Path(post_id): Path<String>) -> ApiResult {
    let post = state.scheduler.publish_now(&post_id).await?;
    Ok(Json(json!({ "success": true, "post": post })))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{http, spawn, state};
    use serde_json::{Value, json};
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    async fn post_json(url: String, body: Value) -> reqwest::Response {
        http().post(url).json(&body).send().await.unwrap()
    }

    async fn get_json(url: String) -> Value {
        http().get(url).send().await.unwrap().json().await.unwrap()
    }

    async fn new_client(base: &str) -> String {
        let body: Value = post_json(format!("{}/api/clients", base), json!({ "name": "Acme" }))
            .await
            .json()
            .await
            .unwrap();
        body["client"]["id"].as_str().unwrap().to_string()
    }

    fn at_offset(seconds: i64) -> String {
        (OffsetDateTime::now_utc() + time::Duration::seconds(seconds))
            .format(&Rfc3339)
            .unwrap()
    }

    #[tokio::test]
    async fn test_past_post_is_published_by_next_tick() {
        let state = state();
        let base = spawn(state.clone()).await;
        let client_id = new_client(&base).await;

        let response = post_json(
            format!("{}/api/posts/schedule", base),
            json!({
                "clientId": client_id,
                "content": "Fresh roast today",
                "platforms": ["instagram", "twitter"],
                "scheduledTime": at_offset(-1),
            }),
        )
        .await;
        assert_eq!(response.status(), 200);

        let report = state.scheduler.tick().await.unwrap();
        assert_eq!(report.published.len(), 1);

        let body = get_json(format!("{}/api/posts/{}", base, client_id)).await;
        assert_eq!(body["total"], 1);
        let post = &body["posts"][0];
        assert_eq!(post["status"], "published");
        assert_eq!(post["results"].as_object().unwrap().len(), 2);
        assert_eq!(post["results"]["instagram"]["success"], true);

        let client = get_json(format!("{}/api/clients/{}", base, client_id)).await;
        assert_eq!(client["client"]["stats"]["totalPosts"], 1);
        assert_eq!(client["client"]["stats"]["scheduledPosts"], 0);
    }

    #[tokio::test]
    async fn test_schedule_reports_every_missing_field() {
        let base = spawn(state()).await;
        let client_id = new_client(&base).await;

        let response =
            post_json(format!("{}/api/posts/schedule", base), json!({ "clientId": client_id }))
                .await;
        assert_eq!(response.status(), 400);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["errors"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_schedule_for_unknown_client_is_404() {
        let base = spawn(state()).await;
        let response = post_json(
            format!("{}/api/posts/schedule", base),
            json!({
                "clientId": "client_0",
                "content": "hello",
                "platforms": ["facebook"],
                "scheduledTime": at_offset(3600),
            }),
        )
        .await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_update_cancel_and_double_publish() {
        let base = spawn(state()).await;
        let client_id = new_client(&base).await;

        let mut ids = Vec::new();
        for content in ["first", "second"] {
            let body: Value = post_json(
                format!("{}/api/posts/schedule", base),
                json!({
                    "clientId": client_id,
                    "content": content,
                    "platforms": ["facebook"],
                    "scheduledTime": at_offset(3600),
                }),
            )
            .await
            .json()
            .await
            .unwrap();
            ids.push(body["post"]["id"].as_str().unwrap().to_string());
        }

        let updated: Value = http()
            .put(format!("{}/api/posts/{}", base, ids[0]))
            .json(&json!({ "content": "first, edited" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(updated["post"]["content"], "first, edited");

        let cancelled = http()
            .delete(format!("{}/api/posts/{}", base, ids[0]))
            .send()
            .await
            .unwrap();
        assert_eq!(cancelled.status(), 200);

        let pending = get_json(format!("{}/api/posts/scheduled/{}", base, client_id)).await;
        assert_eq!(pending["total"], 1);

        let first = post_json(format!("{}/api/posts/{}/publish", base, ids[1]), json!({})).await;
        assert_eq!(first.status(), 200);
        let second = post_json(format!("{}/api/posts/{}/publish", base, ids[1]), json!({})).await;
        assert_eq!(second.status(), 404);
    }
}
