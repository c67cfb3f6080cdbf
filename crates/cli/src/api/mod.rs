//! HTTP API served by `social-autopilot serve`

mod auth;
mod auto_reply;
mod clients;
mod content;
mod error;
mod instagram;
mod posts;
mod reports;

use axum::routing::get;
use axum::{Json, Router, extract::State};
use serde::Serialize;
use social_autopilot_adapters::graph::InstagramGraphClient;
use social_autopilot_domain::usecases::{
    AutoReplyService, ClientService, ContentService, DynScheduler, OAuthFlow, Reports, Scheduler,
    SchedulerConfig,
};
use social_autopilot_domain::{
    AutoReplyLog, ClientRepository, Clock, ContentGenerator, EngagementEstimator, IdGenerator,
    OAuthProvider, PostStore, Publisher, SocialAccountStore,
};
use std::sync::Arc;
use std::time::Instant;
use time::OffsetDateTime;
use tower_http::cors::{Any, CorsLayer};

/// Everything the server is wired from
pub struct Backends {
    pub clients: Arc<dyn ClientRepository>,
    pub posts: Arc<dyn PostStore>,
    pub replies: Arc<dyn AutoReplyLog>,
    pub accounts: Arc<dyn SocialAccountStore>,
    pub generator: Arc<dyn ContentGenerator>,
    pub publisher: Arc<dyn Publisher>,
    pub engagement: Arc<dyn EngagementEstimator>,
    pub providers: Vec<Arc<dyn OAuthProvider>>,
    pub instagram: Option<Arc<InstagramGraphClient>>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Clone)]
pub struct AppState {
    pub clients: ClientService,
    pub scheduler: Arc<DynScheduler>,
    pub content: ContentService,
    pub auto_reply: AutoReplyService,
    pub reports: Reports,
    pub oauth: OAuthFlow,
    pub instagram: Option<Arc<InstagramGraphClient>>,
    pub frontend_url: Arc<str>,
    pub clock: Arc<dyn Clock>,
    started: Instant,
}

impl AppState {
    pub fn new(backends: Backends, scheduler: SchedulerConfig, frontend_url: &str) -> Self {
        let ids = Arc::new(IdGenerator::new());
        let clients = ClientService::new(
            backends.clients.clone(),
            backends.clock.clone(),
            ids.clone(),
        );
        let content = ContentService::new(backends.generator, backends.clients.clone());
        let auto_reply = AutoReplyService::new(
            backends.clients.clone(),
            backends.replies.clone(),
            content.clone(),
            backends.clock.clone(),
            ids.clone(),
        );
        let reports = Reports::new(
            backends.clients,
            backends.posts.clone(),
            backends.replies,
            backends.clock.clone(),
        );
        let oauth = OAuthFlow::new(
            backends.providers,
            backends.accounts,
            backends.clock.clone(),
        );
        let scheduler: Arc<DynScheduler> = Arc::new(Scheduler::new(
            backends.posts,
            backends.publisher,
            backends.engagement,
            backends.clock.clone(),
            clients.clone(),
            ids,
            scheduler,
        ));

        Self {
            clients,
            scheduler,
            content,
            auto_reply,
            reports,
            oauth,
            instagram: backends.instagram,
            frontend_url: Arc::from(frontend_url.trim_end_matches('/')),
            clock: backends.clock,
            started: Instant::now(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .merge(clients::routes())
        .merge(posts::routes())
        .merge(content::routes())
        .merge(auto_reply::routes())
        .merge(reports::routes())
        .merge(auth::routes())
        .merge(instagram::routes())
        .layer(cors)
        .with_state(state)
}

#[derive(Serialize)]
struct Health {
    success: bool,
    status: &'static str,
    service: &'static str,
    version: &'static str,
    ai: &'static str,
    uptime: f64,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        success: true,
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        ai: state.content.provider(),
        uptime: state.started.elapsed().as_secs_f64(),
        timestamp: state.clock.now(),
    })
}
