//! Domain models and value objects

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// An external social network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Instagram,
    Twitter,
    Linkedin,
    Tiktok,
    Youtube,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Facebook,
        Platform::Instagram,
        Platform::Twitter,
        Platform::Linkedin,
        Platform::Tiktok,
        Platform::Youtube,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
            Platform::Tiktok => "tiktok",
            Platform::Youtube => "youtube",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a platform name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "facebook" => Ok(Platform::Facebook),
            "instagram" => Ok(Platform::Instagram),
            "twitter" | "x" => Ok(Platform::Twitter),
            "linkedin" => Ok(Platform::Linkedin),
            "tiktok" => Ok(Platform::Tiktok),
            "youtube" => Ok(Platform::Youtube),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}

/// A managed social-media tenant
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// `client_<unix-millis>`
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub industry: Option<String>,
    pub brand_voice: String,
    /// Platforms the tenant intends to use (free-form, as submitted)
    pub platforms: Vec<String>,
    pub plan: String,
    pub social_accounts: BTreeMap<Platform, PlatformConnection>,
    pub settings: ClientSettings,
    pub stats: ClientStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_reply_rules: Option<AutoReplyRules>,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

impl Client {
    pub const DEFAULT_BRAND_VOICE: &'static str = "professional and friendly";
    pub const DEFAULT_PLAN: &'static str = "basic";
    pub const STATUS_ACTIVE: &'static str = "active";

    pub fn is_active(&self) -> bool {
        self.status == Self::STATUS_ACTIVE
    }
}

/// Boolean feature toggles for a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    #[serde(default = "default_true")]
    pub auto_reply: bool,
    #[serde(default = "default_true")]
    pub auto_hashtags: bool,
    #[serde(default = "default_true")]
    pub best_time_posting: bool,
    #[serde(default = "default_true")]
    pub content_moderation: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            auto_reply: true,
            auto_hashtags: true,
            best_time_posting: true,
            content_moderation: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Aggregate counters maintained by the scheduler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStats {
    pub total_posts: u64,
    pub scheduled_posts: u64,
    pub total_engagement: u64,
    pub total_followers: u64,
    pub avg_engagement_rate: f64,
}

/// Connection record for one platform of a client.
///
/// Tokens are kept for downstream calls and never serialized.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConnection {
    pub connected: bool,
    #[serde(skip)]
    pub access_token: String,
    #[serde(skip)]
    pub access_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub connected_at: OffsetDateTime,
}

impl fmt::Debug for PlatformConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformConnection")
            .field("connected", &self.connected)
            .field("access_token", &"[REDACTED]")
            .field("account_id", &self.account_id)
            .field("page_id", &self.page_id)
            .field("username", &self.username)
            .field("connected_at", &self.connected_at)
            .finish_non_exhaustive()
    }
}

/// Request body for connecting a platform to a client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectRequest {
    pub access_token: Option<String>,
    pub access_secret: Option<String>,
    pub account_id: Option<String>,
    pub page_id: Option<String>,
    pub page_name: Option<String>,
    pub open_id: Option<String>,
    pub person_id: Option<String>,
    pub company_id: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
}

/// Summary of one platform connection
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSummary {
    pub name: Platform,
    pub connected: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub connected_at: OffsetDateTime,
}

/// Request body for registering a client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewClient {
    pub name: Option<String>,
    pub email: Option<String>,
    pub industry: Option<String>,
    pub brand_voice: Option<String>,
    pub platforms: Option<Vec<String>>,
    pub plan: Option<String>,
}

/// Shallow patch applied to a client; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub industry: Option<String>,
    pub brand_voice: Option<String>,
    pub platforms: Option<Vec<String>>,
    pub plan: Option<String>,
    pub status: Option<String>,
    pub settings: Option<ClientSettings>,
}

/// Canned replies used by the auto-reply system
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoReplyRules {
    #[serde(default)]
    pub keywords: BTreeMap<String, String>,
    #[serde(default)]
    pub sentiment: SentimentReplies,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReplies {
    pub positive: String,
    pub negative: String,
    pub neutral: String,
}

impl Default for SentimentReplies {
    fn default() -> Self {
        Self {
            positive: "Thank you so much! 😊".to_string(),
            negative: "We apologize for any inconvenience. Please DM us so we can help!"
                .to_string(),
            neutral: "Thanks for your comment!".to_string(),
        }
    }
}

/// Lifecycle of a scheduled post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Scheduled,
    Published,
}

/// A content item with a target publish time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPost {
    /// `post_<unix-millis>`
    pub id: String,
    pub client_id: String,
    pub content: String,
    pub platforms: BTreeSet<Platform>,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_time: OffsetDateTime,
    #[serde(default)]
    pub media: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub status: PostStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<OffsetDateTime>,
    /// One entry per target platform once published
    #[serde(default)]
    pub results: BTreeMap<Platform, PlatformResult>,
}

/// Per-platform acknowledgement written at publish time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A timestamp as submitted by callers: RFC 3339 text or unix milliseconds
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TimeInput {
    Millis(i64),
    Text(String),
}

/// Request body for scheduling a post
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPost {
    pub client_id: Option<String>,
    pub content: Option<String>,
    pub platforms: Option<Vec<String>>,
    pub scheduled_time: Option<TimeInput>,
    pub media: Option<Vec<String>>,
    pub hashtags: Option<Vec<String>>,
}

/// Patch for a pending post
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostUpdate {
    pub content: Option<String>,
    pub platforms: Option<Vec<String>>,
    pub scheduled_time: Option<TimeInput>,
    pub media: Option<Vec<String>>,
    pub hashtags: Option<Vec<String>>,
}

/// Sizes of the two post collections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCounts {
    pub pending: usize,
    pub published: usize,
}

/// A generated reply to an incoming comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoReply {
    /// `reply_<unix-millis>`
    pub id: String,
    pub client_id: String,
    pub post_id: Option<String>,
    pub platform: Option<String>,
    pub comment: String,
    pub reply: String,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Request for a generated caption
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptionRequest {
    pub topic: Option<String>,
    pub tone: Option<String>,
    pub length: Option<String>,
    pub client_id: Option<String>,
    pub include_emojis: bool,
    pub include_hashtags: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VariationsRequest {
    pub caption: Option<String>,
    pub count: Option<u32>,
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HashtagsRequest {
    pub content: Option<String>,
    pub industry: Option<String>,
    pub count: Option<u32>,
}

/// Tone hint for a comment reply; unrecognised values read as neutral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    #[serde(other)]
    Neutral,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplyRequest {
    pub comment: Option<String>,
    pub post_content: Option<String>,
    pub sentiment: Sentiment,
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdeasRequest {
    pub industry: Option<String>,
    pub audience: Option<String>,
    pub count: Option<u32>,
    pub client_id: Option<String>,
}

/// A single posting-time recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestTime {
    pub day: String,
    pub time: String,
    #[serde(default)]
    pub reason: String,
}

/// Incoming comment for the auto-reply system
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncomingComment {
    pub comment: Option<String>,
    pub post_id: Option<String>,
    pub platform: Option<String>,
}

/// Prompt plus fixed sampling parameters for one completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Ask the provider for a JSON object response
    pub json_output: bool,
}

/// Token pair returned by a vendor token endpoint
#[derive(Debug)]
pub struct TokenSet {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    /// Seconds until the access token expires, when the vendor says
    pub expires_in: Option<i64>,
    /// Vendor user id returned alongside the token, if any
    pub user_id: Option<String>,
}

/// Minimal profile data fetched after a token exchange
#[derive(Debug)]
pub struct OAuthProfile {
    pub account_id: String,
    pub account_name: Option<String>,
    pub page_id: Option<String>,
    pub page_access_token: Option<SecretString>,
}

/// Persisted platform credentials, unique on `(user_id, platform)`
#[derive(Debug)]
pub struct SocialAccount {
    pub user_id: String,
    pub platform: Platform,
    pub access_token: SecretString,
    pub instagram_account_id: Option<String>,
    pub instagram_account_name: Option<String>,
    pub page_id: Option<String>,
    pub page_access_token: Option<SecretString>,
    pub expires_at: Option<OffsetDateTime>,
    pub updated_at: OffsetDateTime,
}

/// Token-free view of a stored social account
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialAccountSummary {
    pub user_id: String,
    pub platform: Platform,
    pub account_id: Option<String>,
    pub account_name: Option<String>,
    pub page_id: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&SocialAccount> for SocialAccountSummary {
    fn from(account: &SocialAccount) -> Self {
        Self {
            user_id: account.user_id.clone(),
            platform: account.platform,
            account_id: account.instagram_account_id.clone(),
            account_name: account.instagram_account_name.clone(),
            page_id: account.page_id.clone(),
            expires_at: account.expires_at,
            updated_at: account.updated_at,
        }
    }
}
