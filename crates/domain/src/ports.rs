//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{
    AutoReply, Client, CompletionRequest, OAuthProfile, Platform, PlatformResult, PostCounts,
    ScheduledPost, SocialAccount, TokenSet,
};

/// Error type for repository and store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// In-place change applied to a stored record
pub type Change<'a, T> = &'a (dyn Fn(&mut T) + Send + Sync);

/// Port for the client registry
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Insert a new client (replaces any client with the same id)
    async fn insert(&self, client: Client) -> Result<(), StoreError>;

    /// Get a client by id
    async fn get(&self, id: &str) -> Result<Option<Client>, StoreError>;

    /// All clients, oldest first
    async fn list(&self) -> Result<Vec<Client>, StoreError>;

    /// Apply a change to a client, returning the updated record
    async fn modify(
        &self,
        id: &str,
        change: Change<'_, Client>,
    ) -> Result<Option<Client>, StoreError>;

    /// Remove a client, returning it if it existed
    async fn remove(&self, id: &str) -> Result<Option<Client>, StoreError>;
}

/// Port for pending and published posts.
///
/// A post lives in exactly one of the two collections. `complete` is the
/// only way across and moves the record in a single step.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Add a post to the pending collection and queue it by due time
    async fn insert(&self, post: ScheduledPost) -> Result<(), StoreError>;

    /// Get a pending post
    async fn get_pending(&self, id: &str) -> Result<Option<ScheduledPost>, StoreError>;

    /// Apply a change to a pending post; a changed `scheduled_time` re-keys the queue
    async fn modify_pending(
        &self,
        id: &str,
        change: Change<'_, ScheduledPost>,
    ) -> Result<Option<ScheduledPost>, StoreError>;

    /// Remove a pending post
    async fn remove_pending(&self, id: &str) -> Result<Option<ScheduledPost>, StoreError>;

    /// Dequeue the ids of every pending post due at `now`, earliest first
    async fn take_due(&self, now: OffsetDateTime) -> Result<Vec<String>, StoreError>;

    /// Queue a dequeued post again at its current time.
    ///
    /// Returns `false` when the post is no longer pending.
    async fn requeue(&self, id: &str) -> Result<bool, StoreError>;

    /// Move a pending post to the published collection.
    ///
    /// Returns `None` when the post is no longer pending.
    async fn complete(
        &self,
        id: &str,
        results: BTreeMap<Platform, PlatformResult>,
        published_at: OffsetDateTime,
    ) -> Result<Option<ScheduledPost>, StoreError>;

    /// Pending posts, optionally for one client
    async fn list_pending(&self, client_id: Option<&str>) -> Result<Vec<ScheduledPost>, StoreError>;

    /// Published posts in publish order, optionally for one client
    async fn list_published(
        &self,
        client_id: Option<&str>,
    ) -> Result<Vec<ScheduledPost>, StoreError>;

    /// Sizes of both collections
    async fn counts(&self) -> Result<PostCounts, StoreError>;
}

/// Port for the append-only auto-reply log
#[async_trait]
pub trait AutoReplyLog: Send + Sync {
    async fn append(&self, reply: AutoReply) -> Result<(), StoreError>;

    async fn list_for_client(&self, client_id: &str) -> Result<Vec<AutoReply>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}

/// Port for persisted platform credentials
#[async_trait]
pub trait SocialAccountStore: Send + Sync {
    /// Insert or update the row keyed on `(user_id, platform)`
    async fn upsert(&self, account: &SocialAccount) -> Result<(), StoreError>;

    async fn get(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> Result<Option<SocialAccount>, StoreError>;

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SocialAccount>, StoreError>;

    /// Delete a row, returning whether it existed
    async fn delete(&self, user_id: &str, platform: Platform) -> Result<bool, StoreError>;
}

/// Error type for content generation
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("LLM API error: {0}")]
    Api(String),
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Timeout")]
    Timeout,
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Port for hosted text completion
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Run one completion and return the raw text
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerateError>;

    /// Provider name (e.g., "openai", "groq")
    fn provider(&self) -> &'static str;
}

/// Error type for publisher operations
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Authentication failed: {0}")]
    Auth(String),
}

/// Result of a successful publish operation
#[derive(Debug, Clone)]
pub struct PublishResult {
    /// Platform-specific post ID
    pub id: String,
    /// URL to the published content, if available
    pub url: Option<String>,
}

/// Port for delivering a post to one platform
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        platform: Platform,
        post: &ScheduledPost,
    ) -> Result<PublishResult, PublishError>;

    /// Short name for logs (e.g., "simulated")
    fn name(&self) -> &'static str;
}

/// Error type for OAuth providers
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("OAuth provider not configured: {0}")]
    Config(String),
    #[error("Token exchange failed: {0}")]
    Exchange(String),
    #[error("Profile fetch failed: {0}")]
    Profile(String),
    #[error("Network error: {0}")]
    Network(String),
}

/// One vendor's authorization-code flow
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    fn platform(&self) -> Platform;

    /// Vendor authorize URL for the given opaque state
    fn authorize_url(&self, state: &str) -> String;

    /// Exchange an authorization code for a bearer token
    async fn exchange_code(&self, code: &str, state: &str) -> Result<TokenSet, OAuthError>;

    /// Fetch the minimal account data needed to persist the connection
    async fn fetch_profile(&self, token: &TokenSet) -> Result<OAuthProfile, OAuthError>;
}

/// Port for the engagement delta credited on publish
pub trait EngagementEstimator: Send + Sync {
    fn estimate(&self, post: &ScheduledPost) -> u64;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
