//! Instagram Basic Display login with long-lived token exchange

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use social_autopilot_domain::{OAuthError, OAuthProfile, OAuthProvider, Platform, TokenSet};

use super::{OAuthApp, Vendor, VendorUrls, id_string, network, read_json};

pub struct InstagramProvider {
    vendor: Vendor,
}

#[derive(Deserialize)]
struct ShortLivedToken {
    access_token: String,
    #[serde(default)]
    user_id: serde_json::Value,
}

#[derive(Deserialize)]
struct LongLivedToken {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct Profile {
    id: serde_json::Value,
    username: Option<String>,
}

impl InstagramProvider {
    pub fn new(app: OAuthApp) -> Result<Self, OAuthError> {
        Self::with_urls(
            app,
            VendorUrls {
                authorize: "https://api.instagram.com/oauth/authorize".to_string(),
                token: "https://graph.instagram.com/access_token".to_string(),
                api: "https://graph.instagram.com".to_string(),
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
impl OAuthProvider for InstagramProvider {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    fn authorize_url(&self, state: &str) -> String {
        let app = &self.vendor.app;
        self.vendor.authorize_url(&[
            ("client_id", app.client_id.as_str()),
            ("redirect_uri", app.redirect_uri.as_str()),
            ("scope", "user_profile,user_media"),
            ("response_type", "code"),
            ("state", state),
        ])
    }

    async fn exchange_code(&self, code: &str, _state: &str) -> Result<TokenSet, OAuthError> {
        let app = &self.vendor.app;
        let secret = app.client_secret.expose_secret();

        let response = self
            .vendor
            .http
            .get(&self.vendor.token)
            .query(&[
                ("client_id", app.client_id.as_str()),
                ("client_secret", secret),
                ("grant_type", "authorization_code"),
                ("redirect_uri", app.redirect_uri.as_str()),
                ("code", code),
            ])
            .send()
            .await
            .map_err(network)?;
        let short: ShortLivedToken = read_json(response, OAuthError::Exchange).await?;

        let response = self
            .vendor
            .http
            .get(&self.vendor.token)
            .query(&[
                ("grant_type", "ig_exchange_token"),
                ("client_secret", secret),
                ("access_token", short.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(network)?;
        let long: LongLivedToken = read_json(response, OAuthError::Exchange).await?;

        Ok(TokenSet {
            access_token: SecretString::from(long.access_token),
            refresh_token: None,
            expires_in: long.expires_in,
            user_id: id_string(&short.user_id),
        })
    }

    async fn fetch_profile(&self, token: &TokenSet) -> Result<OAuthProfile, OAuthError> {
        let user = token.user_id.as_deref().unwrap_or("me");
        let response = self
            .vendor
            .http
            .get(self.vendor.api(&format!("/{}", user)))
            .query(&[
                ("fields", "id,username,account_type"),
                ("access_token", token.access_token.expose_secret()),
            ])
            .send()
            .await
            .map_err(network)?;
        let profile: Profile = read_json(response, OAuthError::Profile).await?;

        Ok(OAuthProfile {
            account_id: id_string(&profile.id)
                .ok_or_else(|| OAuthError::Profile("Profile has no id".to_string()))?,
            account_name: profile.username,
            page_id: None,
            page_access_token: None,
        })
    }
}
