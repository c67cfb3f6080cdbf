//! X (Twitter) OAuth 2.0 with PKCE

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use social_autopilot_domain::{OAuthError, OAuthProfile, OAuthProvider, Platform, TokenSet};

use super::{OAuthApp, Vendor, VendorUrls, network, read_json};

const SCOPES: &str = "tweet.read tweet.write users.read offline.access";

pub struct TwitterProvider {
    vendor: Vendor,
}

#[derive(Deserialize)]
struct AccessToken {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct Me {
    data: MeData,
}

#[derive(Deserialize)]
struct MeData {
    id: String,
    username: Option<String>,
}

impl TwitterProvider {
    pub fn new(app: OAuthApp) -> Result<Self, OAuthError> {
        Self::with_urls(
            app,
            VendorUrls {
                authorize: "https://twitter.com/i/oauth2/authorize".to_string(),
                token: "https://api.twitter.com/2/oauth2/token".to_string(),
                api: "https://api.twitter.com/2".to_string(),
            },
        )
    }

    pub fn with_urls(app: OAuthApp, urls: VendorUrls) -> Result<Self, OAuthError> {
        Ok(Self {
            vendor: Vendor::new(app, urls)?,
        })
    }

    /// PKCE verifier recomputed from the state, so nothing is kept between
    /// the redirect and the callback. 64 hex chars, inside the 43..=128 limit.
    /// Never leaves the server; the browser only sees its S256 challenge.
    fn code_verifier(&self, state: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"pkce-verifier:");
        hasher.update(self.vendor.app.client_secret.expose_secret().as_bytes());
        hasher.update(state.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// RFC 7636 S256 challenge: BASE64URL(SHA256(verifier)) without padding
fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[async_trait]
impl OAuthProvider for TwitterProvider {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    fn authorize_url(&self, state: &str) -> String {
        let app = &self.vendor.app;
        let challenge = code_challenge(&self.code_verifier(state));
        self.vendor.authorize_url(&[
            ("response_type", "code"),
            ("client_id", app.client_id.as_str()),
            ("redirect_uri", app.redirect_uri.as_str()),
            ("scope", SCOPES),
            ("state", state),
            ("code_challenge", challenge.as_str()),
            ("code_challenge_method", "S256"),
        ])
    }

    async fn exchange_code(&self, code: &str, state: &str) -> Result<TokenSet, OAuthError> {
        let app = &self.vendor.app;
        let verifier = self.code_verifier(state);
        let response = self
            .vendor
            .http
            .post(&self.vendor.token)
            .basic_auth(&app.client_id, Some(app.client_secret.expose_secret()))
            .form(&[
                ("code", code),
                ("grant_type", "authorization_code"),
                ("client_id", app.client_id.as_str()),
                ("redirect_uri", app.redirect_uri.as_str()),
                ("code_verifier", verifier.as_str()),
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
            .get(self.vendor.api("/users/me"))
            .bearer_auth(token.access_token.expose_secret())
            .send()
            .await
            .map_err(network)?;
        let me: Me = read_json(response, OAuthError::Profile).await?;

        Ok(OAuthProfile {
            account_id: me.data.id,
            account_name: me.data.username,
            page_id: None,
            page_access_token: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{app, query, urls};
    use super::*;
    use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_challenge_matches_rfc7636_vector() {
        assert_eq!(
            code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_authorize_url_carries_s256_challenge_not_verifier() {
        let provider = TwitterProvider::new(app()).unwrap();
        let url = provider.authorize_url("u42");
        let params = query(&url);
        let verifier = provider.code_verifier("u42");

        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["code_challenge"], code_challenge(&verifier));
        assert_eq!(params["code_challenge"].len(), 43);
        assert!(!url.contains(&verifier));
        assert_ne!(provider.code_verifier("u42"), provider.code_verifier("u43"));
    }

    #[tokio::test]
    async fn test_exchange_sends_matching_verifier() {
        let server = MockServer::start().await;
        let provider = TwitterProvider::with_urls(app(), urls(&server.uri())).unwrap();
        let verifier = provider.code_verifier("u42");

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header_exists("Authorization"))
            .and(body_string_contains(format!("code_verifier={}", verifier)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "bearer",
                "access_token": "x-token",
                "expires_in": 7200,
                "scope": SCOPES
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("Authorization", "Bearer x-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "id": "2244994945", "name": "Bean There", "username": "beanthere" }
            })))
            .mount(&server)
            .await;

        let authorize = provider.authorize_url("u42");
        assert!(!authorize.contains(&verifier));

        let token = provider.exchange_code("abc", "u42").await.unwrap();
        assert_eq!(token.expires_in, Some(7200));

        let profile = provider.fetch_profile(&token).await.unwrap();
        assert_eq!(profile.account_id, "2244994945");
        assert_eq!(profile.account_name.as_deref(), Some("beanthere"));
    }
}
