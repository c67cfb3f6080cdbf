use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com/v18.0";

const PROFILE_FIELDS: &str = "name,username,profile_picture_url,followers_count,media_count";
const MEDIA_FIELDS: &str = "id,caption,media_type,media_url,thumbnail_url,permalink,timestamp,\
                            like_count,comments_count";
const INSIGHT_METRICS: &str = "impressions,reach,follower_count,profile_views";

#[derive(Debug, Error)]
pub enum GraphError {
    /// Non-2xx reply; the body is forwarded to the caller as-is
    #[error("Graph API returned {status}")]
    Upstream { status: u16, body: Value },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Instagram Graph not configured: {0}")]
    Config(String),
}

/// Business account the proxy reads from
pub struct GraphConfig {
    pub base_url: String,
    pub account_id: String,
    pub page_token: SecretString,
    pub timeout_secs: u64,
}

pub struct InstagramGraphClient {
    http: Client,
    base_url: String,
    account_id: String,
    page_token: SecretString,
}

impl InstagramGraphClient {
    pub fn new(config: GraphConfig) -> Result<Self, GraphError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GraphError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            account_id: config.account_id,
            page_token: config.page_token,
        })
    }

    /// Profile summary of the business account
    pub async fn test(&self) -> Result<Value, GraphError> {
        self.get("", &[("fields", PROFILE_FIELDS)]).await
    }

    pub async fn media(&self) -> Result<Value, GraphError> {
        self.get("/media", &[("fields", MEDIA_FIELDS)]).await
    }

    /// Daily account insights
    pub async fn insights(&self) -> Result<Value, GraphError> {
        self.get(
            "/insights",
            &[("metric", INSIGHT_METRICS), ("period", "day")],
        )
        .await
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, GraphError> {
        let url = format!("{}/{}{}", self.base_url, self.account_id, path);
        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("access_token", self.page_token.expose_secret())])
            .send()
            .await
            .map_err(|e| GraphError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GraphError::Network(e.to_string()))?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), path = path, "Graph API request failed");
            return Err(GraphError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}
