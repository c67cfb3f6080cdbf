//! OAuth account linking and the Instagram platform callbacks

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use social_autopilot_domain::unix_millis;
use social_autopilot_domain::usecases::CallbackOutcome;

use super::AppState;
use super::error::{ApiError, ApiResult};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/accounts/:user_id", get(accounts))
        .route("/api/auth/:platform", get(begin))
        .route("/api/auth/:platform/callback", get(callback))
        .route("/api/auth/:platform/deauthorize", post(deauthorize))
        .route("/api/auth/:platform/delete", post(data_deletion))
        .route("/api/auth/:platform/:user_id", delete(revoke))
}

#[derive(Debug, Default, Deserialize)]
struct BeginQuery {
    user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// 302, the status browsers expect from an OAuth hop
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

async fn begin(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    Query(query): Query<BeginQuery>,
) -> ApiResult<Response> {
    let url = state.oauth.begin(&platform, query.user_id.as_deref())?;
    tracing::debug!(platform = %platform, "Redirecting to authorize URL");
    Ok(found(&url))
}

async fn callback(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<Response> {
    let settings = format!("{}/settings", state.frontend_url);
    let failed = format!("{}?{}_error=true", settings, platform.to_ascii_lowercase());

    if let Some(error) = query.error {
        tracing::warn!(platform = %platform, error = %error, "Authorization denied by user");
        return Ok(found(&failed));
    }
    let Some(code) = query.code.filter(|c| !c.trim().is_empty()) else {
        return Err(ApiError::Validation(vec![
            "Authorization code not provided".to_string(),
        ]));
    };

    match state
        .oauth
        .complete(&platform, &code, query.state.as_deref())
        .await
    {
        Ok(outcome) => Ok(found(&connected_url(&settings, &outcome).unwrap_or(failed))),
        Err(e) => {
            tracing::warn!(platform = %platform, error = %e, "OAuth callback failed");
            Ok(found(&failed))
        }
    }
}

/// Settings page URL announcing the new account; tokens are never included
fn connected_url(settings: &str, outcome: &CallbackOutcome) -> Option<String> {
    let flag = format!("{}_connected", outcome.platform);
    let mut params = vec![
        (flag.as_str(), "true"),
        ("account_id", outcome.account_id.as_str()),
    ];
    if let Some(username) = &outcome.username {
        params.push(("username", username.as_str()));
    }
    Url::parse_with_params(settings, &params)
        .ok()
        .map(String::from)
}

async fn accounts(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult {
    let accounts = state.oauth.accounts(&user_id).await?;
    Ok(Json(json!({ "success": true, "total": accounts.len(), "accounts": accounts })))
}

async fn revoke(
    State(state): State<AppState>,
    Path((platform, user_id)): Path<(String, String)>,
) -> ApiResult {
    state.oauth.revoke(&platform, &user_id).await?;
    Ok(Json(json!({ "success": true, "message": "Account disconnected" })))
}

fn require_instagram(platform: &str) -> Result<(), ApiError> {
    if platform.eq_ignore_ascii_case("instagram") {
        Ok(())
    } else {
        Err(ApiError::NotFound("Route not found".to_string()))
    }
}

async fn deauthorize(Path(platform): Path<String>, body: Bytes) -> ApiResult {
    require_instagram(&platform)?;
    // the signed_request payload is not logged
    tracing::info!(bytes = body.len(), "Instagram deauthorize callback received");
    Ok(Json(json!({ "success": true })))
}

async fn data_deletion(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    body: Bytes,
) -> ApiResult {
    require_instagram(&platform)?;
    let confirmation_code = format!("deletion_{}", unix_millis(state.clock.now()));
    tracing::info!(
        bytes = body.len(),
        confirmation_code = %confirmation_code,
        "Instagram data deletion request received"
    );
    Ok(Json(json!({
        "success": true,
        "url": format!("{}/data-deletion", state.frontend_url),
        "confirmation_code": confirmation_code,
    })))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{FRONTEND, backends, http, spawn, state};
    use super::super::AppState;
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use social_autopilot_adapters::llm::StubGenerator;
    use social_autopilot_adapters::oauth::{InstagramProvider, OAuthApp, VendorUrls};
    use social_autopilot_domain::usecases::SchedulerConfig;
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn instagram_state(vendor: &str) -> AppState {
        let provider = InstagramProvider::with_urls(
            OAuthApp {
                client_id: "ig-app".to_string(),
                client_secret: SecretString::new("ig-secret".into()),
                redirect_uri: "http://localhost:4000/api/auth/instagram/callback".to_string(),
                timeout_secs: 5,
            },
            VendorUrls {
                authorize: format!("{}/authorize", vendor),
                token: format!("{}/token", vendor),
                api: vendor.to_string(),
            },
        )
        .unwrap();

        let mut backends = backends(Arc::new(StubGenerator::default()));
        backends.providers = vec![Arc::new(provider)];
        AppState::new(backends, SchedulerConfig::default(), FRONTEND)
    }

    fn location(response: &reqwest::Response) -> String {
        response.headers()["location"].to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_begin_redirects_with_user_as_state() {
        let base = spawn(instagram_state("http://vendor.test")).await;
        let response = http()
            .get(format!("{}/api/auth/instagram?user_id=u42", base))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 302);
        let target = location(&response);
        assert!(target.starts_with("http://vendor.test/authorize?"));
        assert!(target.contains("state=u42"));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_404() {
        let base = spawn(state()).await;
        let response = http()
            .get(format!("{}/api/auth/tiktok", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_callback_without_code_is_400() {
        let base = spawn(instagram_state("http://vendor.test")).await;
        let response = http()
            .get(format!("{}/api/auth/instagram/callback", base))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Authorization code not provided");
    }

    #[tokio::test]
    async fn test_failed_exchange_redirects_to_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error_type": "OAuthException",
                "error_message": "Invalid authorization code"
            })))
            .mount(&server)
            .await;

        let base = spawn(instagram_state(&server.uri())).await;
        let response = http()
            .get(format!("{}/api/auth/instagram/callback?code=bad&state=u42", base))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 302);
        assert_eq!(
            location(&response),
            format!("{}/settings?instagram_error=true", FRONTEND)
        );
    }

    #[tokio::test]
    async fn test_callback_stores_account_without_leaking_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/token"))
            .and(query_param("grant_type", "authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "short-token",
                "user_id": 17841
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/token"))
            .and(query_param("grant_type", "ig_exchange_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "long-token",
                "expires_in": 5184000
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/17841"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "17841",
                "username": "beanthere"
            })))
            .mount(&server)
            .await;

        let base = spawn(instagram_state(&server.uri())).await;
        let response = http()
            .get(format!("{}/api/auth/instagram/callback?code=good&state=u42", base))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 302);
        let target = location(&response);
        assert!(target.starts_with(&format!("{}/settings?instagram_connected=true", FRONTEND)));
        assert!(target.contains("account_id=17841"));
        assert!(target.contains("username=beanthere"));
        assert!(!target.contains("token"));

        let listed: Value = http()
            .get(format!("{}/api/auth/accounts/u42", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(listed["total"], 1);
        assert!(!listed.to_string().contains("long-token"));

        let revoked = http()
            .delete(format!("{}/api/auth/instagram/u42", base))
            .send()
            .await
            .unwrap();
        assert_eq!(revoked.status(), 200);
        let again = http()
            .delete(format!("{}/api/auth/instagram/u42", base))
            .send()
            .await
            .unwrap();
        assert_eq!(again.status(), 404);
    }

    #[tokio::test]
    async fn test_instagram_platform_callbacks() {
        let base = spawn(state()).await;

        let response = http()
            .post(format!("{}/api/auth/instagram/deauthorize", base))
            .form(&[("signed_request", "abc.def")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: Value = http()
            .post(format!("{}/api/auth/instagram/delete", base))
            .form(&[("signed_request", "abc.def")])
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["url"], format!("{}/data-deletion", FRONTEND));
        assert!(
            body["confirmation_code"]
                .as_str()
                .unwrap()
                .starts_with("deletion_")
        );
    }
}
