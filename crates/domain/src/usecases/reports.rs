//! Read-only views over clients and posts: analytics, calendar, reports, export

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use crate::model::{ClientStats, Platform, ScheduledPost};
use crate::ports::{AutoReplyLog, ClientRepository, Clock, PostStore};
use crate::usecases::ServiceError;

const CSV_HEADER: &str = "ID,Content,Platforms,Status,Scheduled Time,Published Time";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub overview: ClientStats,
    pub platforms: BTreeMap<Platform, u64>,
    pub recent_activity: RecentActivity,
    pub top_performing_posts: Vec<PostPreview>,
}

#[derive(Debug, Serialize)]
pub struct RecentActivity {
    #[serde(rename = "last30Days")]
    pub last_30_days: usize,
    #[serde(rename = "postsPerWeek")]
    pub posts_per_week: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPreview {
    pub id: String,
    pub content: String,
    pub platforms: Vec<Platform>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub client: ReportClient,
    pub period: ReportPeriod,
    pub summary: ReportSummary,
    pub platforms: Vec<Platform>,
    pub top_posts: Vec<ScheduledPost>,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct ReportClient {
    pub name: String,
    pub industry: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportPeriod {
    /// 1-based month
    pub month: u8,
    pub year: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_posts: u64,
    pub total_engagement: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_clients: usize,
    pub active_clients: usize,
    pub total_scheduled_posts: usize,
    pub total_published_posts: usize,
    pub total_auto_replies: usize,
    pub platforms_connected: BTreeMap<Platform, u64>,
}

#[derive(Clone)]
pub struct Reports {
    clients: Arc<dyn ClientRepository>,
    posts: Arc<dyn PostStore>,
    replies: Arc<dyn AutoReplyLog>,
    clock: Arc<dyn Clock>,
}

impl Reports {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        posts: Arc<dyn PostStore>,
        replies: Arc<dyn AutoReplyLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            clients,
            posts,
            replies,
            clock,
        }
    }

    pub async fn analytics(&self, client_id: &str) -> Result<Analytics, ServiceError> {
        let client = self
            .clients
            .get(client_id)
            .await?
            .ok_or(ServiceError::NotFound("Client"))?;
        let published = self.posts.list_published(Some(client_id)).await?;

        let mut platforms = BTreeMap::new();
        for post in &published {
            for platform in &post.platforms {
                *platforms.entry(*platform).or_insert(0) += 1;
            }
        }

        let cutoff = self.clock.now() - Duration::days(30);
        let last_30_days = published
            .iter()
            .filter(|p| p.published_at.is_some_and(|at| at >= cutoff))
            .count();

        let top_performing_posts = published
            .iter()
            .take(5)
            .map(|p| PostPreview {
                id: p.id.clone(),
                content: p.content.chars().take(100).collect(),
                platforms: p.platforms.iter().copied().collect(),
                published_at: p.published_at,
            })
            .collect();

        Ok(Analytics {
            overview: client.stats,
            platforms,
            recent_activity: RecentActivity {
                last_30_days,
                posts_per_week: format!("{:.1}", last_30_days as f64 / 4.0),
            },
            top_performing_posts,
        })
    }

    /// Pending posts grouped by `YYYY-MM-DD`; `month` is 0-based
    pub async fn calendar(
        &self,
        client_id: &str,
        month: Option<u8>,
        year: Option<i32>,
    ) -> Result<BTreeMap<String, Vec<ScheduledPost>>, ServiceError> {
        let mut pending = self.posts.list_pending(Some(client_id)).await?;
        pending.sort_by_key(|p| p.scheduled_time);

        let mut calendar: BTreeMap<String, Vec<ScheduledPost>> = BTreeMap::new();
        for post in pending {
            let at = post.scheduled_time.to_offset(time::UtcOffset::UTC);
            if month.is_some_and(|m| u8::from(at.month()) != m.saturating_add(1)) {
                continue;
            }
            if year.is_some_and(|y| at.year() != y) {
                continue;
            }
            let day = format!("{:04}-{:02}-{:02}", at.year(), u8::from(at.month()), at.day());
            calendar.entry(day).or_default().push(post);
        }
        Ok(calendar)
    }

    /// `month` is 1-based here; defaults to the current month
    pub async fn monthly(
        &self,
        client_id: &str,
        month: Option<u8>,
        year: Option<i32>,
    ) -> Result<MonthlyReport, ServiceError> {
        let client = self
            .clients
            .get(client_id)
            .await?
            .ok_or(ServiceError::NotFound("Client"))?;
        let now = self.clock.now();
        let top_posts = self
            .posts
            .list_published(Some(client_id))
            .await?
            .into_iter()
            .take(5)
            .collect();

        Ok(MonthlyReport {
            client: ReportClient {
                name: client.name,
                industry: client.industry,
            },
            period: ReportPeriod {
                month: month.unwrap_or_else(|| u8::from(now.month())),
                year: year.unwrap_or_else(|| now.year()),
            },
            summary: ReportSummary {
                total_posts: client.stats.total_posts,
                total_engagement: client.stats.total_engagement,
            },
            platforms: client.social_accounts.keys().copied().collect(),
            top_posts,
            generated_at: now,
        })
    }

    /// Every post of a client as CSV, pending first
    pub async fn export_csv(&self, client_id: &str) -> Result<String, ServiceError> {
        let mut posts = self.posts.list_pending(Some(client_id)).await?;
        posts.extend(self.posts.list_published(Some(client_id)).await?);

        let mut lines = Vec::with_capacity(posts.len() + 1);
        lines.push(CSV_HEADER.to_string());
        for post in &posts {
            lines.push(csv_row(post));
        }
        Ok(lines.join("\n"))
    }

    pub async fn dashboard(&self) -> Result<DashboardStats, ServiceError> {
        let clients = self.clients.list().await?;
        let counts = self.posts.counts().await?;

        let mut platforms_connected: BTreeMap<Platform, u64> =
            Platform::ALL.iter().map(|p| (*p, 0)).collect();
        for client in &clients {
            for (platform, connection) in &client.social_accounts {
                if connection.connected {
                    *platforms_connected.entry(*platform).or_insert(0) += 1;
                }
            }
        }

        Ok(DashboardStats {
            total_clients: clients.len(),
            active_clients: clients.iter().filter(|c| c.is_active()).count(),
            total_scheduled_posts: counts.pending,
            total_published_posts: counts.published,
            total_auto_replies: self.replies.count().await?,
            platforms_connected,
        })
    }
}

fn csv_row(post: &ScheduledPost) -> String {
    let platforms: Vec<&str> = post.platforms.iter().map(|p| p.as_str()).collect();
    let status = match post.status {
        crate::model::PostStatus::Scheduled => "scheduled",
        crate::model::PostStatus::Published => "published",
    };
    format!(
        "{},\"{}\",{},{},{},{}",
        post.id,
        post.content.replace('"', "\"\""),
        platforms.join("|"),
        status,
        rfc3339(Some(post.scheduled_time)),
        rfc3339(post.published_at),
    )
}

fn rfc3339(at: Option<OffsetDateTime>) -> String {
    at.and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| "N/A".to_string())
}
