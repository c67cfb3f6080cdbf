//! Facebook Login for pages and their linked Instagram business accounts

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use social_autopilot_domain::{OAuthError, OAuthProfile, OAuthProvider, Platform, TokenSet};

use super::{OAuthApp, Vendor, VendorUrls, network, read_json};

const SCOPES: &str =
    "pages_show_list,pages_read_engagement,instagram_basic,instagram_content_publish";

pub struct FacebookProvider {
    vendor: Vendor,
}

#[derive(Deserialize)]
struct AccessToken {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct Pages {
    #[serde(default)]
    data: Vec<Page>,
}

#[derive(Deserialize)]
struct Page {
    id: String,
    name: Option<String>,
    access_token: Option<String>,
    instagram_business_account: Option<LinkedInstagram>,
}

#[derive(Deserialize)]
struct LinkedInstagram {
    id: String,
    username: Option<String>,
}

impl FacebookProvider {
    pub fn new(app: OAuthApp) -> Result<Self, OAuthError> {
        Self::with_urls(
            app,
            VendorUrls {
                authorize: "https://www.facebook.com/v18.0/dialog/oauth".to_string(),
                token: "https://graph.facebook.com/v18.0/oauth/access_token".to_string(),
                api: "https://graph.facebook.com/v18.0".to_string(),
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
impl OAuthProvider for FacebookProvider {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    fn authorize_url(&self, state: &str) -> String {
        let app = &self.vendor.app;
        self.vendor.authorize_url(&[
            ("client_id", app.client_id.as_str()),
            ("redirect_uri", app.redirect_uri.as_str()),
            ("scope", SCOPES),
            ("response_type", "code"),
            ("state", state),
        ])
    }

    async fn exchange_code(&self, code: &str, _state: &str) -> Result<TokenSet, OAuthError> {
        let app = &self.vendor.app;
        let response = self
            .vendor
            .http
            .get(&self.vendor.token)
            .query(&[
                ("client_id", app.client_id.as_str()),
                ("client_secret", app.client_secret.expose_secret()),
                ("redirect_uri", app.redirect_uri.as_str()),
                ("code", code),
            ])
            .send()
            .await
            .map_err(network)?;
        let token: AccessToken = read_json(response, OAuthError::Exchange).await?;

        Ok(TokenSet {
            access_token: SecretString::from(token.access_token),
            refresh_token: None,
            expires_in: token.expires_in,
            user_id: None,
        })
    }

    /// First managed page; the linked Instagram account wins when present
    async fn fetch_profile(&self, token: &TokenSet) -> Result<OAuthProfile, OAuthError> {
        let response = self
            .vendor
            .http
            .get(self.vendor.api("/me/accounts"))
            .query(&[
                (
                    "fields",
                    "id,name,access_token,instagram_business_account{id,username}",
                ),
                ("access_token", token.access_token.expose_secret()),
            ])
            .send()
            .await
            .map_err(network)?;
        let pages: Pages = read_json(response, OAuthError::Profile).await?;

        let page = pages
            .data
            .into_iter()
            .next()
            .ok_or_else(|| OAuthError::Profile("No Facebook pages found".to_string()))?;

        let (account_id, account_name) = match page.instagram_business_account {
            Some(ig) => (ig.id, ig.username),
            None => (page.id.clone(), page.name),
        };

        Ok(OAuthProfile {
            account_id,
            account_name,
            page_id: Some(page.id),
            page_access_token: page.access_token.map(SecretString::from),
        })
    }
}
