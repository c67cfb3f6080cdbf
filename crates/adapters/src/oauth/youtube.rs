//! Google OAuth for YouTube channels

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use social_autopilot_domain::{OAuthError, OAuthProfile, OAuthProvider, Platform, TokenSet};

use super::{OAuthApp, Vendor, VendorUrls, network, read_json};

const SCOPES: &str = "https://www.googleapis.com/auth/youtube.readonly \
                      https://www.googleapis.com/auth/youtube.upload";

pub struct YoutubeProvider {
    vendor: Vendor,
}

#[derive(Deserialize)]
struct AccessToken {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct Channels {
    #[serde(default)]
    items: Vec<Channel>,
}

#[derive(Deserialize)]
struct Channel {
    id: String,
    snippet: Option<Snippet>,
}

#[derive(Deserialize)]
struct Snippet {
    title: Option<String>,
}

impl YoutubeProvider {
    pub fn new(app: OAuthApp) -> Result<Self, OAuthError> {
        Self::with_urls(
            app,
            VendorUrls {
                authorize: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                token: "https://oauth2.googleapis.com/token".to_string(),
                api: "https://www.googleapis.com/youtube/v3".to_string(),
            },
        )
    }

    pub fn with_urls(app: OAuthApp, urls: VendorUrls) -> Result<Self, OAuthError> {
        Ok(Self {
            vendor: Vendor::new(app, urls)?,
        })
    }
}

#[async_trait]
impl OAuthProvider for YoutubeProvider {
    fn platform(&self) -> Platform {
        Platform::Youtube
    }

    fn authorize_url(&self, state: &str) -> String {
        let app = &self.vendor.app;
        self.vendor.authorize_url(&[
            ("client_id", app.client_id.as_str()),
            ("redirect_uri", app.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", SCOPES),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
        ])
    }

    async fn exchange_code(&self, code: &str, _state: &str) -> Result<TokenSet, OAuthError> {
        let app = &self.vendor.app;
        let response = self
            .vendor
            .http
            .post(&self.vendor.token)
            .form(&[
                ("code", code),
                ("client_id", app.client_id.as_str()),
                ("client_secret", app.client_secret.expose_secret()),
                ("redirect_uri", app.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(network)?;
        let token: AccessToken = read_json(response, OAuthError::Exchange).await?;

        Ok(TokenSet {
            access_token: SecretString::from(token.access_token),
            refresh_token: token.refresh_token.map(SecretString::from),
            expires_in: token.expires_in,
            user_id: None,
        })
    }

    async fn fetch_profile(&self, token: &TokenSet) -> Result<OAuthProfile, OAuthError> {
        let response = self
            .vendor
            .http
            .get(self.vendor.api("/channels"))
            .query(&[("part", "snippet"), ("mine", "true")])
            .bearer_auth(token.access_token.expose_secret())
            .send()
            .await
            .map_err(network)?;
        let channels: Channels = read_json(response, OAuthError::Profile).await?;

        let channel = channels
            .items
            .into_iter()
            .next()
            .ok_or_else(|| OAuthError::Profile("No YouTube channel found".to_string()))?;

        Ok(OAuthProfile {
            account_id: channel.id,
            account_name: channel.snippet.and_then(|s| s.title),
            page_id: None,
            page_access_token: None,
        })
    }
}
