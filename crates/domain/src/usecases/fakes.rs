//! Fake port implementations shared by the use-case tests

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use time::{Duration, OffsetDateTime};

use crate::model::{
    AutoReply, Client, ClientSettings, ClientStats, CompletionRequest, Platform, PlatformResult,
    PostCounts, PostStatus, ScheduledPost, SocialAccount,
};
use crate::ports::{
    AutoReplyLog, Change, ClientRepository, Clock, ContentGenerator, EngagementEstimator,
    GenerateError, PostStore, PublishError, PublishResult, Publisher, SocialAccountStore,
    StoreError,
};

pub struct FakeClock {
    now: Mutex<OffsetDateTime>,
}

impl FakeClock {
    pub fn at(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap()
    }
}

pub fn client(id: &str, name: &str) -> Client {
    Client {
        id: id.to_string(),
        name: name.to_string(),
        email: None,
        industry: Some("coffee".to_string()),
        brand_voice: "warm and witty".to_string(),
        platforms: vec![],
        plan: Client::DEFAULT_PLAN.to_string(),
        social_accounts: BTreeMap::new(),
        settings: ClientSettings::default(),
        stats: ClientStats::default(),
        auto_reply_rules: None,
        status: Client::STATUS_ACTIVE.to_string(),
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: None,
    }
}

#[derive(Default)]
pub struct FakeClients {
    clients: Mutex<BTreeMap<String, Client>>,
}

impl FakeClients {
    pub fn with(clients: Vec<Client>) -> Self {
        Self {
            clients: Mutex::new(clients.into_iter().map(|c| (c.id.clone(), c)).collect()),
        }
    }

    pub fn stats(&self, id: &str) -> ClientStats {
        self.clients.lock().unwrap()[id].stats.clone()
    }
}

#[async_trait]
impl ClientRepository for FakeClients {
    async fn insert(&self, client: Client) -> Result<(), StoreError> {
        self.clients
            .lock()
            .unwrap()
            .insert(client.id.clone(), client);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Client>, StoreError> {
        Ok(self.clients.lock().unwrap().get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Client>, StoreError> {
        Ok(self.clients.lock().unwrap().values().cloned().collect())
    }

    async fn modify(
        &self,
        id: &str,
        change: Change<'_, Client>,
    ) -> Result<Option<Client>, StoreError> {
        let mut clients = self.clients.lock().unwrap();
        Ok(clients.get_mut(id).map(|c| {
            change(c);
            c.clone()
        }))
    }

    async fn remove(&self, id: &str) -> Result<Option<Client>, StoreError> {
        Ok(self.clients.lock().unwrap().remove(id))
    }
}

#[derive(Default)]
pub struct FakePosts {
    pending: Mutex<Vec<ScheduledPost>>,
    published: Mutex<Vec<ScheduledPost>>,
    /// Ids waiting for `take_due`, drained like the real queue
    queued: Mutex<Vec<String>>,
    /// Number of upcoming `complete` calls that fail
    pub failing_completes: Mutex<u32>,
}

#[async_trait]
impl PostStore for FakePosts {
    async fn insert(&self, post: ScheduledPost) -> Result<(), StoreError> {
        self.queued.lock().unwrap().push(post.id.clone());
        self.pending.lock().unwrap().push(post);
        Ok(())
    }

    async fn get_pending(&self, id: &str) -> Result<Option<ScheduledPost>, StoreError> {
        Ok(self
            .pending
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn modify_pending(
        &self,
        id: &str,
        change: Change<'_, ScheduledPost>,
    ) -> Result<Option<ScheduledPost>, StoreError> {
        let mut pending = self.pending.lock().unwrap();
        let updated = pending.iter_mut().find(|p| p.id == id).map(|p| {
            change(p);
            p.clone()
        });
        if updated.is_some() {
            self.queued.lock().unwrap().push(id.to_string());
        }
        Ok(updated)
    }

    async fn remove_pending(&self, id: &str) -> Result<Option<ScheduledPost>, StoreError> {
        let mut pending = self.pending.lock().unwrap();
        Ok(pending
            .iter()
            .position(|p| p.id == id)
            .map(|i| pending.remove(i)))
    }

    async fn take_due(&self, now: OffsetDateTime) -> Result<Vec<String>, StoreError> {
        let pending = self.pending.lock().unwrap();
        let mut queued = self.queued.lock().unwrap();
        let mut due: Vec<_> = pending
            .iter()
            .filter(|p| p.status == PostStatus::Scheduled && p.scheduled_time <= now)
            .filter(|p| queued.contains(&p.id))
            .collect();
        due.sort_by_key(|p| p.scheduled_time);
        queued.retain(|id| !due.iter().any(|p| &p.id == id));
        Ok(due.into_iter().map(|p| p.id.clone()).collect())
    }

    async fn requeue(&self, id: &str) -> Result<bool, StoreError> {
        let live = self.pending.lock().unwrap().iter().any(|p| p.id == id);
        if live {
            self.queued.lock().unwrap().push(id.to_string());
        }
        Ok(live)
    }

    async fn complete(
        &self,
        id: &str,
        results: BTreeMap<Platform, PlatformResult>,
        published_at: OffsetDateTime,
    ) -> Result<Option<ScheduledPost>, StoreError> {
        {
            let mut failing = self.failing_completes.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(StoreError::Database("write failed".into()));
            }
        }
        let mut pending = self.pending.lock().unwrap();
        let Some(index) = pending.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        let mut post = pending.remove(index);
        post.status = PostStatus::Published;
        post.published_at = Some(published_at);
        post.results = results;
        self.published.lock().unwrap().push(post.clone());
        Ok(Some(post))
    }

    async fn list_pending(
        &self,
        client_id: Option<&str>,
    ) -> Result<Vec<ScheduledPost>, StoreError> {
        Ok(self
            .pending
            .lock()
            .unwrap()
            .iter()
            .filter(|p| client_id.is_none_or(|c| p.client_id == c))
            .cloned()
            .collect())
    }

    async fn list_published(
        &self,
        client_id: Option<&str>,
    ) -> Result<Vec<ScheduledPost>, StoreError> {
        Ok(self
            .published
            .lock()
            .unwrap()
            .iter()
            .filter(|p| client_id.is_none_or(|c| p.client_id == c))
            .cloned()
            .collect())
    }

    async fn counts(&self) -> Result<PostCounts, StoreError> {
        Ok(PostCounts {
            pending: self.pending.lock().unwrap().len(),
            published: self.published.lock().unwrap().len(),
        })
    }
}

#[derive(Default)]
pub struct FakeReplies {
    replies: Mutex<Vec<AutoReply>>,
}

#[async_trait]
impl AutoReplyLog for FakeReplies {
    async fn append(&self, reply: AutoReply) -> Result<(), StoreError> {
        self.replies.lock().unwrap().push(reply);
        Ok(())
    }

    async fn list_for_client(&self, client_id: &str) -> Result<Vec<AutoReply>, StoreError> {
        Ok(self
            .replies
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.replies.lock().unwrap().len())
    }
}

#[derive(Default)]
pub struct FakeAccounts {
    pub rows: Mutex<Vec<(String, Platform, String)>>,
}

#[async_trait]
impl SocialAccountStore for FakeAccounts {
    async fn upsert(&self, account: &SocialAccount) -> Result<(), StoreError> {
        use secrecy::ExposeSecret;
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|(u, p, _)| !(u == &account.user_id && *p == account.platform));
        rows.push((
            account.user_id.clone(),
            account.platform,
            account.access_token.expose_secret().to_string(),
        ));
        Ok(())
    }

    async fn get(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> Result<Option<SocialAccount>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|(u, p, _)| u == user_id && *p == platform)
            .map(|(u, p, token)| account_row(u, *p, token)))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SocialAccount>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _, _)| u == user_id)
            .map(|(u, p, token)| account_row(u, *p, token))
            .collect())
    }

    async fn delete(&self, user_id: &str, platform: Platform) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|(u, p, _)| !(u == user_id && *p == platform));
        Ok(rows.len() != before)
    }
}

fn account_row(user_id: &str, platform: Platform, token: &str) -> SocialAccount {
    SocialAccount {
        user_id: user_id.to_string(),
        platform,
        access_token: token.to_string().into(),
        instagram_account_id: None,
        instagram_account_name: None,
        page_id: None,
        page_access_token: None,
        expires_at: None,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

pub struct FixedEngagement(pub u64);

impl EngagementEstimator for FixedEngagement {
    fn estimate(&self, _post: &ScheduledPost) -> u64 {
        self.0
    }
}

/// Records calls; fails every platform listed in `failing`
#[derive(Default)]
pub struct RecordingPublisher {
    pub calls: Mutex<Vec<(Platform, String)>>,
    pub failing: Vec<Platform>,
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(
        &self,
        platform: Platform,
        post: &ScheduledPost,
    ) -> Result<PublishResult, PublishError> {
        self.calls
            .lock()
            .unwrap()
            .push((platform, post.id.clone()));
        if self.failing.contains(&platform) {
            return Err(PublishError::Auth("token expired".to_string()));
        }
        Ok(PublishResult {
            id: format!("{}_1", platform),
            url: Some(format!("https://{}.com/post/1", platform)),
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Returns a canned completion and keeps every request
pub struct ScriptedGenerator {
    pub response: Result<String, String>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGenerator {
    pub fn ok(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            requests: Mutex::new(vec![]),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            requests: Mutex::new(vec![]),
        }
    }

    pub fn last_request(&self) -> CompletionRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerateError> {
        self.requests.lock().unwrap().push(request);
        self.response.clone().map_err(GenerateError::Api)
    }

    fn provider(&self) -> &'static str {
        "scripted"
    }
}
