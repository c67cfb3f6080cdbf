//! OAuth 2.0 authorization-code adapters, one per vendor

pub mod facebook;
pub mod instagram;
pub mod tiktok;
pub mod twitter;
pub mod youtube;

pub use facebook::FacebookProvider;
pub use instagram::InstagramProvider;
pub use tiktok::TiktokProvider;
pub use twitter::TwitterProvider;
pub use youtube::YoutubeProvider;

use reqwest::{Client, Response, Url};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use social_autopilot_domain::OAuthError;
use std::time::Duration;

/// Registered app credentials for one vendor
pub struct OAuthApp {
    pub client_id: String,
    pub client_secret: SecretString,
    /// Callback registered with the vendor
    pub redirect_uri: String,
    pub timeout_secs: u64,
}

impl OAuthApp {
    /// Callback under `backend_url` for the given platform
    pub fn callback_for(backend_url: &str, platform: &str) -> String {
        format!(
            "{}/api/auth/{}/callback",
            backend_url.trim_end_matches('/'),
            platform
        )
    }
}

/// Vendor endpoints; overridable so tests can point at a mock server
#[derive(Debug, Clone)]
pub struct VendorUrls {
    pub authorize: String,
    pub token: String,
    pub api: String,
}

/// Shared plumbing every provider is built from
struct Vendor {
    app: OAuthApp,
    authorize: Url,
    token: String,
    api: String,
    http: Client,
}

impl Vendor {
    fn new(app: OAuthApp, urls: VendorUrls) -> Result<Self, OAuthError> {
        let authorize = Url::parse(&urls.authorize)
            .map_err(|e| OAuthError::Config(format!("Bad authorize URL: {}", e)))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(app.timeout_secs))
            .build()
            .map_err(|e| OAuthError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            app,
            authorize,
            token: urls.token,
            api: urls.api.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn authorize_url(&self, params: &[(&str, &str)]) -> String {
        let mut url = self.authorize.clone();
        url.query_pairs_mut().extend_pairs(params);
        url.into()
    }

    fn api(&self, path: &str) -> String {
        format!("{}{}", self.api, path)
    }
}

fn network(e: reqwest::Error) -> OAuthError {
    OAuthError::Network(e.to_string())
}

/// Decode a vendor response, turning non-2xx bodies into `fail`
async fn read_json<T: DeserializeOwned>(
    response: Response,
    fail: fn(String) -> OAuthError,
) -> Result<T, OAuthError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(fail(format!("{}: {}", status, body)));
    }
    response
        .json()
        .await
        .map_err(|e| fail(format!("Unexpected response: {}", e)))
}

/// Vendors return ids as strings or numbers
fn id_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
