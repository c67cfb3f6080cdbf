//! OAuth connection flow shared by every vendor

use std::collections::BTreeMap;
use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use crate::model::{Platform, SocialAccount, SocialAccountSummary};
use crate::ports::{Clock, OAuthProvider, SocialAccountStore};
use crate::usecases::ServiceError;

/// State used when the caller does not name a user
pub const DEFAULT_USER: &str = "default";

/// A finished callback, safe to echo back to the browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub platform: Platform,
    pub user_id: String,
    pub account_id: String,
    pub username: Option<String>,
}

/// Authorize redirect, code exchange and account persistence
#[derive(Clone)]
pub struct OAuthFlow {
    providers: BTreeMap<Platform, Arc<dyn OAuthProvider>>,
    accounts: Arc<dyn SocialAccountStore>,
    clock: Arc<dyn Clock>,
}

impl OAuthFlow {
    pub fn new(
        providers: Vec<Arc<dyn OAuthProvider>>,
        accounts: Arc<dyn SocialAccountStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            providers: providers.into_iter().map(|p| (p.platform(), p)).collect(),
            accounts,
            clock,
        }
    }

    /// Platforms with a configured provider
    pub fn platforms(&self) -> Vec<Platform> {
        self.providers.keys().copied().collect()
    }

    /// Vendor authorize URL; the user id travels as the OAuth state
    pub fn begin(&self, platform: &str, user_id: Option<&str>) -> Result<String, ServiceError> {
        let provider = self.provider(platform)?;
        let state = user_id
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_USER);
        Ok(provider.authorize_url(state))
    }

    /// Exchange the code, fetch the profile and upsert the stored account
    pub async fn complete(
        &self,
        platform: &str,
        code: &str,
        state: Option<&str>,
    ) -> Result<CallbackOutcome, ServiceError> {
        let provider = self.provider(platform)?;
        let user_id = state
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_USER)
            .to_string();

        let token = provider.exchange_code(code, &user_id).await?;
        let profile = provider.fetch_profile(&token).await?;
        let now = self.clock.now();

        let account = SocialAccount {
            user_id: user_id.clone(),
            platform: provider.platform(),
            access_token: token.access_token,
            instagram_account_id: Some(profile.account_id.clone()),
            instagram_account_name: profile.account_name.clone(),
            page_id: profile.page_id,
            page_access_token: profile.page_access_token,
            expires_at: token.expires_in.and_then(|secs| expiry(now, secs)),
            updated_at: now,
        };
        self.accounts.upsert(&account).await?;

        tracing::info!(
            platform = %account.platform,
            user_id = %user_id,
            account_id = %profile.account_id,
            "Social account connected"
        );

        Ok(CallbackOutcome {
            platform: account.platform,
            user_id,
            account_id: profile.account_id,
            username: profile.account_name,
        })
    }

    pub async fn accounts(&self, user_id: &str) -> Result<Vec<SocialAccountSummary>, ServiceError> {
        let accounts = self.accounts.list_for_user(user_id).await?;
        Ok(accounts.iter().map(SocialAccountSummary::from).collect())
    }

    /// Delete a stored account; unknown rows are NotFound
    pub async fn revoke(&self, platform: &str, user_id: &str) -> Result<(), ServiceError> {
        let platform: Platform = platform
            .parse()
            .map_err(|_| ServiceError::NotFound("Account"))?;
        if !self.accounts.delete(user_id, platform).await? {
            return Err(ServiceError::NotFound("Account"));
        }
        tracing::info!(platform = %platform, user_id = %user_id, "Social account removed");
        Ok(())
    }

    fn provider(&self, platform: &str) -> Result<&Arc<dyn OAuthProvider>, ServiceError> {
        platform
            .parse::<Platform>()
            .ok()
            .and_then(|p| self.providers.get(&p))
            .ok_or(ServiceError::NotFound("Provider"))
    }
}

/// Absolute expiry for a vendor `expires_in`; out-of-range values are dropped
fn expiry(now: OffsetDateTime, secs: i64) -> Option<OffsetDateTime> {
    now.checked_add(Duration::seconds(secs))
}
