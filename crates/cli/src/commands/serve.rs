//! Serve command - HTTP API plus the publish scheduler

use anyhow::{Context, Result, bail};
use social_autopilot_adapters::graph::{GraphConfig, InstagramGraphClient};
use social_autopilot_adapters::llm::{
    LlmConfig as GeneratorConfig, OpenAiCompatGenerator, StubGenerator, UnconfiguredGenerator,
};
use social_autopilot_adapters::oauth::{
    FacebookProvider, InstagramProvider, OAuthApp, TiktokProvider, TwitterProvider,
    YoutubeProvider,
};
use social_autopilot_adapters::publisher::{RandomEngagement, SimulatedPublisher};
use social_autopilot_adapters::store::{
    InMemoryAutoReplyLog, InMemoryClientRepository, InMemoryPostStore, SqliteSocialAccountStore,
};
use social_autopilot_domain::usecases::SchedulerConfig;
use social_autopilot_domain::{Clock, ContentGenerator, OAuthProvider, Platform, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::api::{self, AppState, Backends};
use crate::args::ServeArgs;
use crate::config::{AppConfig, VendorAppConfig, env_secret, env_value};

pub async fn execute(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let accounts = SqliteSocialAccountStore::new(&config.general.database_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open social account database: {}",
                config.general.database_path.display()
            )
        })?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let generator = build_generator(&config)?;
    let providers = build_providers(&config)?;
    let instagram = build_graph_client(&config)?;

    tracing::info!(
        ai = generator.provider(),
        oauth = ?providers.iter().map(|p| p.platform()).collect::<Vec<_>>(),
        instagram_proxy = instagram.is_some(),
        "Backends ready"
    );

    let backends = Backends {
        clients: Arc::new(InMemoryClientRepository::new()),
        posts: Arc::new(InMemoryPostStore::new()),
        replies: Arc::new(InMemoryAutoReplyLog::new()),
        accounts: Arc::new(accounts),
        generator,
        publisher: Arc::new(SimulatedPublisher::new(clock.clone())),
        engagement: Arc::new(RandomEngagement),
        providers,
        instagram: instagram.map(Arc::new),
        clock,
    };
    let scheduler_config = SchedulerConfig {
        tick_interval: Duration::from_secs(config.scheduler.tick_interval_secs.max(1)),
    };
    let state = AppState::new(backends, scheduler_config, &config.server.frontend_url);

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let scheduler = state.scheduler.clone();
    let scheduler_task = tokio::spawn(async move {
        scheduler
            .run(async move {
                let _ = stop_rx.changed().await;
            })
            .await;
    });

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    tracing::info!(addr = %listener.local_addr()?, "social-autopilot listening");

    axum::serve(listener, api::router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    let _ = stop_tx.send(true);
    scheduler_task.await.context("Scheduler task failed")?;

    tracing::info!("social-autopilot stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Generator for the configured provider. A missing API key is not fatal:
/// the server starts and every AI endpoint reports the problem.
pub(crate) fn build_generator(config: &AppConfig) -> Result<Arc<dyn ContentGenerator>> {
    let llm = &config.llm;
    let (provider, settings): (&'static str, _) = match llm.provider.as_str() {
        "openai" => ("openai", &llm.openai),
        "groq" => ("groq", &llm.groq),
        "stub" => return Ok(Arc::new(StubGenerator::default())),
        "none" => return Ok(Arc::new(UnconfiguredGenerator::default())),
        other => bail!("Unknown LLM provider: {}", other),
    };

    let Some(api_key) = env_secret(&settings.api_key_env) else {
        tracing::warn!(
            provider = provider,
            env = %settings.api_key_env,
            "API key not set; AI endpoints will fail"
        );
        return Ok(Arc::new(UnconfiguredGenerator::new(format!(
            "{} is not set",
            settings.api_key_env
        ))));
    };

    let generator = OpenAiCompatGenerator::with_base_url(
        provider,
        api_key,
        settings.base_url.clone(),
        GeneratorConfig {
            model: llm.model_for(provider),
            timeout_secs: llm.timeout_secs,
            retries: llm.retries,
        },
    )?;
    Ok(Arc::new(generator))
}

fn vendor_app(config: &AppConfig, platform: Platform, vendor: &VendorAppConfig) -> Option<OAuthApp> {
    let (Some(client_id), Some(client_secret)) = (
        env_value(&vendor.client_id_env),
        env_secret(&vendor.client_secret_env),
    ) else {
        tracing::debug!(platform = %platform, "OAuth app credentials not set");
        return None;
    };
    Some(OAuthApp {
        client_id,
        client_secret,
        redirect_uri: OAuthApp::callback_for(&config.server.backend_url, platform.as_str()),
        timeout_secs: config.oauth.timeout_secs,
    })
}

/// One provider per vendor whose app credentials are present
pub(crate) fn build_providers(config: &AppConfig) -> Result<Vec<Arc<dyn OAuthProvider>>> {
    let oauth = &config.oauth;
    let mut providers: Vec<Arc<dyn OAuthProvider>> = Vec::new();

    if let Some(app) = vendor_app(config, Platform::Facebook, &oauth.facebook) {
        providers.push(Arc::new(FacebookProvider::new(app)?));
    }
    if let Some(app) = vendor_app(config, Platform::Instagram, &oauth.instagram) {
        providers.push(Arc::new(InstagramProvider::new(app)?));
    }
    if let Some(app) = vendor_app(config, Platform::Tiktok, &oauth.tiktok) {
        providers.push(Arc::new(TiktokProvider::new(app)?));
    }
    if let Some(app) = vendor_app(config, Platform::Twitter, &oauth.twitter) {
        providers.push(Arc::new(TwitterProvider::new(app)?));
    }
    if let Some(app) = vendor_app(config, Platform::Youtube, &oauth.youtube) {
        providers.push(Arc::new(YoutubeProvider::new(app)?));
    }

    Ok(providers)
}

pub(crate) fn build_graph_client(config: &AppConfig) -> Result<Option<InstagramGraphClient>> {
    let ig = &config.instagram;
    let (Some(account_id), Some(page_token)) =
        (env_value(&ig.account_id_env), env_secret(&ig.page_token_env))
    else {
        return Ok(None);
    };

    let client = InstagramGraphClient::new(GraphConfig {
        base_url: ig.graph_url.clone(),
        account_id,
        page_token,
        timeout_secs: ig.timeout_secs,
    })?;
    Ok(Some(client))
}
