//! Scheduler use case - queues posts and publishes them when due

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};

use crate::IdGenerator;
use crate::model::{NewPost, PlatformResult, PostStatus, PostUpdate, ScheduledPost};
use crate::ports::{Clock, EngagementEstimator, PostStore, Publisher};
use crate::usecases::{ClientService, ServiceError};
use crate::validation::{parse_time, require_platforms, require_text, require_time};

/// Configuration for the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between two publish passes
    pub tick_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
        }
    }
}

/// Outcome of one publish pass
#[derive(Debug, Default)]
pub struct TickReport {
    /// Ids of posts moved to the published collection
    pub published: Vec<String>,
    /// Posts that could not be published because of a store error
    pub errors: usize,
}

/// Scheduler over trait objects, as wired by the server
pub type DynScheduler =
    Scheduler<dyn PostStore, dyn Publisher, dyn EngagementEstimator, dyn Clock>;

/// Post scheduler and publisher
pub struct Scheduler<P, X, E, Cl>
where
    P: PostStore + ?Sized,
    X: Publisher + ?Sized,
    E: EngagementEstimator + ?Sized,
    Cl: Clock + ?Sized,
{
    posts: Arc<P>,
    publisher: Arc<X>,
    engagement: Arc<E>,
    clock: Arc<Cl>,
    clients: ClientService,
    ids: Arc<IdGenerator>,
    config: SchedulerConfig,
}

impl<P, X, E, Cl> Scheduler<P, X, E, Cl>
where
    P: PostStore + ?Sized,
    X: Publisher + ?Sized,
    E: EngagementEstimator + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(
        posts: Arc<P>,
        publisher: Arc<X>,
        engagement: Arc<E>,
        clock: Arc<Cl>,
        clients: ClientService,
        ids: Arc<IdGenerator>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            posts,
            publisher,
            engagement,
            clock,
            clients,
            ids,
            config,
        }
    }

    /// Queue a post for a known client
    pub async fn schedule(&self, request: NewPost) -> Result<ScheduledPost, ServiceError> {
        let mut errors = Vec::new();
        let client_id = require_text("Client ID", request.client_id.as_deref(), &mut errors);
        if let Some(id) = &client_id {
            self.clients.get(id).await?;
        }
        let content = require_text("Content", request.content.as_deref(), &mut errors);
        let platforms = require_platforms(request.platforms.as_deref(), &mut errors);
        let scheduled_time =
            require_time("Scheduled time", request.scheduled_time.as_ref(), &mut errors);

        let (Some(client_id), Some(content), Some(platforms), Some(scheduled_time)) =
            (client_id, content, platforms, scheduled_time)
        else {
            return Err(ServiceError::Validation(errors));
        };

        let now = self.clock.now();
        let post = ScheduledPost {
            id: self.ids.next("post", now),
            client_id,
            content,
            platforms,
            scheduled_time,
            media: request.media.unwrap_or_default(),
            hashtags: request.hashtags.unwrap_or_default(),
            status: PostStatus::Scheduled,
            created_at: now,
            updated_at: None,
            published_at: None,
            results: BTreeMap::new(),
        };

        self.posts.insert(post.clone()).await?;
        self.clients.record_scheduled(&post.client_id).await?;

        tracing::info!(
            post_id = %post.id,
            client_id = %post.client_id,
            scheduled_time = %post.scheduled_time,
            "Post scheduled"
        );
        Ok(post)
    }

    /// Pending and published posts of a client, newest first
    pub async fn list_for_client(
        &self,
        client_id: &str,
    ) -> Result<Vec<ScheduledPost>, ServiceError> {
        let mut posts = self.posts.list_pending(Some(client_id)).await?;
        posts.extend(self.posts.list_published(Some(client_id)).await?);
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(posts)
    }

    /// Pending posts of a client, soonest first
    pub async fn list_scheduled(&self, client_id: &str) -> Result<Vec<ScheduledPost>, ServiceError> {
        let mut posts = self.posts.list_pending(Some(client_id)).await?;
        posts.sort_by_key(|p| p.scheduled_time);
        Ok(posts)
    }

    /// Patch a pending post
    pub async fn update(
        &self,
        post_id: &str,
        update: PostUpdate,
    ) -> Result<ScheduledPost, ServiceError> {
        let mut errors = Vec::new();
        let content = match update.content.as_deref() {
            Some(c) => require_text("Content", Some(c), &mut errors),
            None => None,
        };
        let platforms = match update.platforms.as_deref() {
            Some(p) => require_platforms(Some(p), &mut errors),
            None => None,
        };
        let scheduled_time = match update.scheduled_time.as_ref().map(parse_time) {
            Some(Ok(t)) => Some(t),
            Some(Err(e)) => {
                errors.push(e);
                None
            }
            None => None,
        };
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        let now = self.clock.now();
        let change = move |post: &mut ScheduledPost| {
            if let Some(content) = &content {
                post.content = content.clone();
            }
            if let Some(platforms) = &platforms {
                post.platforms = platforms.clone();
            }
            if let Some(time) = scheduled_time {
                post.scheduled_time = time;
            }
            if let Some(media) = &update.media {
                post.media = media.clone();
            }
            if let Some(hashtags) = &update.hashtags {
                post.hashtags = hashtags.clone();
            }
            post.updated_at = Some(now);
        };

        let post = self
            .posts
            .modify_pending(post_id, &change)
            .await?
            .ok_or(ServiceError::NotFound("Post"))?;
        tracing::info!(post_id = %post.id, "Post updated");
        Ok(post)
    }

    /// Drop a pending post
    pub async fn cancel(&self, post_id: &str) -> Result<(), ServiceError> {
        let post = self
            .posts
            .remove_pending(post_id)
            .await?
            .ok_or(ServiceError::NotFound("Post"))?;
        self.clients.record_unscheduled(&post.client_id).await?;
        tracing::info!(post_id = %post.id, client_id = %post.client_id, "Post cancelled");
        Ok(())
    }

    /// Publish a pending post immediately
    pub async fn publish_now(&self, post_id: &str) -> Result<ScheduledPost, ServiceError> {
        let post = self
            .posts
            .get_pending(post_id)
            .await?
            .ok_or(ServiceError::NotFound("Post"))?;
        self.publish(post)
            .await?
            .ok_or(ServiceError::NotFound("Post"))
    }

    /// Publish every post due at the current time
    pub async fn tick(&self) -> Result<TickReport, ServiceError> {
        let now = self.clock.now();
        let due = self.posts.take_due(now).await?;
        let mut report = TickReport::default();

        for id in due {
            let post = match self.posts.get_pending(&id).await {
                Ok(Some(post)) => post,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(post_id = %id, error = %e, "Failed to load due post");
                    report.errors += 1;
                    self.requeue(&id).await;
                    continue;
                }
            };
            match self.publish(post).await {
                Ok(Some(published)) => report.published.push(published.id),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(post_id = %id, error = %e, "Failed to publish post");
                    report.errors += 1;
                    self.requeue(&id).await;
                }
            }
        }

        Ok(report)
    }

    /// Put a post that failed mid-tick back in the queue for the next tick
    async fn requeue(&self, id: &str) {
        if let Err(e) = self.posts.requeue(id).await {
            tracing::error!(post_id = %id, error = %e, "Failed to requeue post");
        }
    }

    /// Tick on a fixed interval until `shutdown` resolves
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        let mut ticker = interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(
            interval_secs = self.config.tick_interval.as_secs(),
            publisher = self.publisher.name(),
            "Scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(report) if !report.published.is_empty() || report.errors > 0 => {
                            tracing::info!(
                                published = report.published.len(),
                                errors = report.errors,
                                "Scheduler tick complete"
                            );
                        }
                        Ok(_) => tracing::debug!("Scheduler tick: nothing due"),
                        Err(e) => tracing::error!(error = %e, "Scheduler tick failed"),
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Scheduler stopping");
                    break;
                }
            }
        }
    }

    /// Acknowledge every platform, then move the post across.
    ///
    /// Returns `None` if another caller published the post first; only the
    /// caller that wins the move updates the client counters.
    async fn publish(&self, post: ScheduledPost) -> Result<Option<ScheduledPost>, ServiceError> {
        let mut results = BTreeMap::new();
        for platform in &post.platforms {
            let result = match self.publisher.publish(*platform, &post).await {
                Ok(r) => PlatformResult {
                    success: true,
                    post_id: Some(r.id),
                    url: r.url,
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(
                        post_id = %post.id,
                        platform = %platform,
                        error = %e,
                        "Platform rejected post"
                    );
                    PlatformResult {
                        success: false,
                        post_id: None,
                        url: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            results.insert(*platform, result);
        }

        let Some(published) = self
            .posts
            .complete(&post.id, results, self.clock.now())
            .await?
        else {
            tracing::debug!(post_id = %post.id, "Post already published");
            return Ok(None);
        };

        let engagement = self.engagement.estimate(&published);
        self.clients
            .record_published(&published.client_id, engagement)
            .await?;

        tracing::info!(
            post_id = %published.id,
            client_id = %published.client_id,
            platforms = ?published.platforms,
            "Post published"
        );
        Ok(Some(published))
    }
}
