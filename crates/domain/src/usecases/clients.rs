//! Client registry use case

use std::sync::Arc;

use crate::IdGenerator;
use crate::model::{
    Client, ClientSettings, ClientStats, ClientUpdate, ConnectRequest, NewClient, Platform,
    PlatformConnection, PlatformSummary,
};
use crate::ports::{ClientRepository, Clock};
use crate::usecases::ServiceError;
use crate::validation::require_text;

/// Create, read, patch and delete tenants, and keep their counters
#[derive(Clone)]
pub struct ClientService {
    clients: Arc<dyn ClientRepository>,
    clock: Arc<dyn Clock>,
    ids: Arc<IdGenerator>,
}

impl ClientService {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        clock: Arc<dyn Clock>,
        ids: Arc<IdGenerator>,
    ) -> Self {
        Self { clients, clock, ids }
    }

    pub async fn create(&self, request: NewClient) -> Result<Client, ServiceError> {
        let mut errors = Vec::new();
        let name = require_text("Name", request.name.as_deref(), &mut errors);
        let Some(name) = name else {
            return Err(ServiceError::Validation(errors));
        };

        let now = self.clock.now();
        let client = Client {
            id: self.ids.next("client", now),
            name,
            email: request.email,
            industry: request.industry,
            brand_voice: request
                .brand_voice
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| Client::DEFAULT_BRAND_VOICE.to_string()),
            platforms: request.platforms.unwrap_or_default(),
            plan: request
                .plan
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| Client::DEFAULT_PLAN.to_string()),
            social_accounts: Default::default(),
            settings: ClientSettings::default(),
            stats: ClientStats::default(),
            auto_reply_rules: None,
            status: Client::STATUS_ACTIVE.to_string(),
            created_at: now,
            updated_at: None,
        };

        self.clients.insert(client.clone()).await?;
        tracing::info!(client_id = %client.id, name = %client.name, "Client created");
        Ok(client)
    }

    pub async fn list(&self) -> Result<Vec<Client>, ServiceError> {
        Ok(self.clients.list().await?)
    }

    pub async fn get(&self, id: &str) -> Result<Client, ServiceError> {
        self.clients
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("Client"))
    }

    /// Shallow merge of the provided fields; identity, stats and connections are kept
    pub async fn update(&self, id: &str, update: ClientUpdate) -> Result<Client, ServiceError> {
        let now = self.clock.now();
        let change = move |client: &mut Client| {
            let update = update.clone();
            if let Some(name) = update.name {
                client.name = name;
            }
            if update.email.is_some() {
                client.email = update.email;
            }
            if update.industry.is_some() {
                client.industry = update.industry;
            }
            if let Some(voice) = update.brand_voice {
                client.brand_voice = voice;
            }
            if let Some(platforms) = update.platforms {
                client.platforms = platforms;
            }
            if let Some(plan) = update.plan {
                client.plan = plan;
            }
            if let Some(status) = update.status {
                client.status = status;
            }
            if let Some(settings) = update.settings {
                client.settings = settings;
            }
            client.updated_at = Some(now);
        };

        self.clients
            .modify(id, &change)
            .await?
            .ok_or(ServiceError::NotFound("Client"))
    }

    /// Removing an unknown client is not an error
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        if self.clients.remove(id).await?.is_some() {
            tracing::info!(client_id = %id, "Client deleted");
        }
        Ok(())
    }

    pub async fn connect(
        &self,
        id: &str,
        platform: &str,
        request: ConnectRequest,
    ) -> Result<Platform, ServiceError> {
        let platform: Platform = platform
            .parse()
            .map_err(|e: crate::model::UnknownPlatform| ServiceError::invalid(e.to_string()))?;

        let mut errors = Vec::new();
        let Some(access_token) =
            require_text("Access token", request.access_token.as_deref(), &mut errors)
        else {
            return Err(ServiceError::Validation(errors));
        };

        let connection = PlatformConnection {
            connected: true,
            access_token,
            access_secret: request.access_secret,
            account_id: request.account_id,
            page_id: request.page_id,
            page_name: request.page_name,
            open_id: request.open_id,
            person_id: request.person_id,
            company_id: request.company_id,
            username: request.username,
            name: request.name,
            connected_at: self.clock.now(),
        };

        let change = move |client: &mut Client| {
            client.social_accounts.insert(platform, connection.clone());
        };
        self.clients
            .modify(id, &change)
            .await?
            .ok_or(ServiceError::NotFound("Client"))?;

        tracing::info!(client_id = %id, platform = %platform, "Platform connected");
        Ok(platform)
    }

    pub async fn platforms(&self, id: &str) -> Result<Vec<PlatformSummary>, ServiceError> {
        let client = self.get(id).await?;
        Ok(client
            .social_accounts
            .iter()
            .map(|(platform, connection)| PlatformSummary {
                name: *platform,
                connected: connection.connected,
                connected_at: connection.connected_at,
            })
            .collect())
    }

    pub async fn record_scheduled(&self, id: &str) -> Result<(), ServiceError> {
        self.adjust(id, |stats| stats.scheduled_posts += 1).await
    }

    pub async fn record_unscheduled(&self, id: &str) -> Result<(), ServiceError> {
        self.adjust(id, |stats| {
            stats.scheduled_posts = stats.scheduled_posts.saturating_sub(1)
        })
        .await
    }

    pub async fn record_published(&self, id: &str, engagement: u64) -> Result<(), ServiceError> {
        self.adjust(id, move |stats| {
            stats.total_posts += 1;
            stats.scheduled_posts = stats.scheduled_posts.saturating_sub(1);
            stats.total_engagement += engagement;
        })
        .await
    }

    /// Counter updates for a deleted client are skipped
    async fn adjust(
        &self,
        id: &str,
        f: impl Fn(&mut ClientStats) + Send + Sync,
    ) -> Result<(), ServiceError> {
        let change = |client: &mut Client| f(&mut client.stats);
        if self.clients.modify(id, &change).await?.is_none() {
            tracing::debug!(client_id = %id, "Skipping stats update for missing client");
        }
        Ok(())
    }
}
