//! TikTok Login Kit (v2)

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use social_autopilot_domain::{OAuthError, OAuthProfile, OAuthProvider, Platform, TokenSet};

use super::{OAuthApp, Vendor, VendorUrls, network, read_json};

pub struct TiktokProvider {
    vendor: Vendor,
}

#[derive(Deserialize)]
struct AccessToken {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    open_id: Option<String>,
}

#[derive(Deserialize)]
struct UserInfo {
    data: UserData,
}

#[derive(Deserialize)]
struct UserData {
    user: User,
}

#[derive(Deserialize)]
struct User {
    open_id: String,
    display_name: Option<String>,
}

impl TiktokProvider {
    pub fn new(app: OAuthApp) -> Result<Self, OAuthError> {
        Self::with_urls(
            app,
            VendorUrls {
                authorize: "https://www.tiktok.com/v2/auth/authorize/".to_string(),
                token: "https://open.tiktokapis.com/v2/oauth/token/".to_string(),
                api: "https://open.tiktokapis.com/v2".to_string(),
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
impl OAuthProvider for TiktokProvider {
    fn platform(&self) -> Platform {
        Platform::Tiktok
    }

    /// TikTok names the app id `client_key`
    fn authorize_url(&self, state: &str) -> String {
        let app = &self.vendor.app;
        self.vendor.authorize_url(&[
            ("client_key", app.client_id.as_str()),
            ("redirect_uri", app.redirect_uri.as_str()),
            ("scope", "user.info.basic,video.upload"),
            ("response_type", "code"),
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
                ("client_key", app.client_id.as_str()),
                ("client_secret", app.client_secret.expose_secret()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", app.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(network)?;
        let token: AccessToken = read_json(response, OAuthError::Exchange).await?;

        Ok(TokenSet {
            access_token: SecretString::from(token.access_token),
            refresh_token: token.refresh_token.map(SecretString::from),
            expires_in: token.expires_in,
            user_id: token.open_id,
        })
    }

    async fn fetch_profile(&self, token: &TokenSet) -> Result<OAuthProfile, OAuthError> {
        let response = self
            .vendor
            .http
            .get(self.vendor.api("/user/info/"))
            .query(&[("fields", "open_id,display_name")])
            .bearer_auth(token.access_token.expose_secret())
            .send()
            .await
            .map_err(network)?;
        let info: UserInfo = read_json(response, OAuthError::Profile).await?;

        Ok(OAuthProfile {
            account_id: info.data.user.open_id,
            account_name: info.data.user.display_name,
            page_id: None,
            page_access_token: None,
        })
    }
}
