//! Configuration loading and management

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use social_autopilot_adapters::graph::DEFAULT_GRAPH_URL;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub oauth: OAuthConfig,

    #[serde(default)]
    pub instagram: InstagramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Public URL of this server, used for OAuth callbacks
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Dashboard URL that OAuth callbacks redirect back to
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// openai, groq, stub or none
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Empty means the provider's default model
    #[serde(default)]
    pub model: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub retries: u32,

    #[serde(default = "default_openai")]
    pub openai: ProviderConfig,

    #[serde(default = "default_groq")]
    pub groq: ProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key_env: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    #[serde(default = "default_oauth_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_facebook_app")]
    pub facebook: VendorAppConfig,

    #[serde(default = "default_instagram_app")]
    pub instagram: VendorAppConfig,

    #[serde(default = "default_tiktok_app")]
    pub tiktok: VendorAppConfig,

    #[serde(default = "default_twitter_app")]
    pub twitter: VendorAppConfig,

    #[serde(default = "default_youtube_app")]
    pub youtube: VendorAppConfig,
}

/// Names of the environment variables holding one vendor's app credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorAppConfig {
    pub client_id_env: String,
    pub client_secret_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstagramConfig {
    #[serde(default = "default_graph_url")]
    pub graph_url: String,

    #[serde(default = "default_page_token_env")]
    pub page_token_env: String,

    #[serde(default = "default_account_id_env")]
    pub account_id_env: String,

    #[serde(default = "default_oauth_timeout")]
    pub timeout_secs: u64,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./data/social_accounts.sqlite")
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_backend_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_tick_interval() -> u64 {
    60
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_timeout() -> u64 {
    45
}

fn default_oauth_timeout() -> u64 {
    30
}

fn default_openai() -> ProviderConfig {
    ProviderConfig {
        api_key_env: "OPENAI_API_KEY".to_string(),
        base_url: "https://api.openai.com/v1".to_string(),
    }
}

fn default_groq() -> ProviderConfig {
    ProviderConfig {
        api_key_env: "GROQ_API_KEY".to_string(),
        base_url: "https://api.groq.com/openai/v1".to_string(),
    }
}

fn vendor(prefix: &str, id: &str, secret: &str) -> VendorAppConfig {
    VendorAppConfig {
        client_id_env: format!("{}_{}", prefix, id),
        client_secret_env: format!("{}_{}", prefix, secret),
    }
}

fn default_facebook_app() -> VendorAppConfig {
    vendor("FACEBOOK", "APP_ID", "APP_SECRET")
}

fn default_instagram_app() -> VendorAppConfig {
    vendor("INSTAGRAM", "APP_ID", "APP_SECRET")
}

fn default_tiktok_app() -> VendorAppConfig {
    vendor("TIKTOK", "CLIENT_KEY", "CLIENT_SECRET")
}

fn default_twitter_app() -> VendorAppConfig {
    vendor("TWITTER", "CLIENT_ID", "CLIENT_SECRET")
}

fn default_youtube_app() -> VendorAppConfig {
    vendor("YOUTUBE", "CLIENT_ID", "CLIENT_SECRET")
}

fn default_graph_url() -> String {
    DEFAULT_GRAPH_URL.to_string()
}

fn default_page_token_env() -> String {
    "PAGE_ACCESS_TOKEN".to_string()
}

fn default_account_id_env() -> String {
    "INSTAGRAM_BUSINESS_ACCOUNT_ID".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            database_path: default_database_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backend_url: default_backend_url(),
            frontend_url: default_frontend_url(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: String::new(),
            timeout_secs: default_timeout(),
            retries: 0,
            openai: default_openai(),
            groq: default_groq(),
        }
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_oauth_timeout(),
            facebook: default_facebook_app(),
            instagram: default_instagram_app(),
            tiktok: default_tiktok_app(),
            twitter: default_twitter_app(),
            youtube: default_youtube_app(),
        }
    }
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            graph_url: default_graph_url(),
            page_token_env: default_page_token_env(),
            account_id_env: default_account_id_env(),
            timeout_secs: default_oauth_timeout(),
        }
    }
}

impl LlmConfig {
    /// Configured model, or the provider's usual one
    pub fn model_for(&self, provider: &str) -> String {
        if !self.model.trim().is_empty() {
            return self.model.trim().to_string();
        }
        match provider {
            "groq" => "llama-3.3-70b-versatile".to_string(),
            _ => "gpt-4".to_string(),
        }
    }
}

/// Read a secret from the named environment variable; unset or blank is `None`
pub fn env_secret(env_var: &str) -> Option<SecretString> {
    if env_var.trim().is_empty() {
        return None;
    }
    std::env::var(env_var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

/// Plain (non-secret) value from the named environment variable
pub fn env_value(env_var: &str) -> Option<String> {
    if env_var.trim().is_empty() {
        return None;
    }
    std::env::var(env_var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SOCIAL_AUTOPILOT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# social-autopilot configuration
# Secrets are never stored here: each *_env key names the environment
# variable that holds the value.

[general]
log_level = "info"
database_path = "./data/social_accounts.sqlite"

[server]
host = "0.0.0.0"
port = 4000
backend_url = "http://localhost:4000"
frontend_url = "http://localhost:3000"

[scheduler]
tick_interval_secs = 60

[llm]
provider = "openai"  # openai, groq, stub, none
# model = "gpt-4"
timeout_secs = 45
retries = 0

[llm.openai]
api_key_env = "OPENAI_API_KEY"
base_url = "https://api.openai.com/v1"

[llm.groq]
api_key_env = "GROQ_API_KEY"
base_url = "https://api.groq.com/openai/v1"

[oauth]
timeout_secs = 30

[oauth.facebook]
client_id_env = "FACEBOOK_APP_ID"
client_secret_env = "FACEBOOK_APP_SECRET"

[oauth.instagram]
client_id_env = "INSTAGRAM_APP_ID"
client_secret_env = "INSTAGRAM_APP_SECRET"

[oauth.tiktok]
client_id_env = "TIKTOK_CLIENT_KEY"
client_secret_env = "TIKTOK_CLIENT_SECRET"

[oauth.twitter]
client_id_env = "TWITTER_CLIENT_ID"
client_secret_env = "TWITTER_CLIENT_SECRET"

[oauth.youtube]
client_id_env = "YOUTUBE_CLIENT_ID"
client_secret_env = "YOUTUBE_CLIENT_SECRET"

[instagram]
graph_url = "https://graph.facebook.com/v18.0"
page_token_env = "PAGE_ACCESS_TOKEN"
account_id_env = "INSTAGRAM_BUSINESS_ACCOUNT_ID"
timeout_secs = 30
"#
        .to_string()
    }
}
