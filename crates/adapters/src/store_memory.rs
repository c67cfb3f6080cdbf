//! In-memory stores for clients, posts, replies and social accounts

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use social_autopilot_domain::{
    AutoReply, AutoReplyLog, Change, Client, ClientRepository, Platform, PlatformResult,
    PostCounts, PostStatus, PostStore, ScheduledPost, SocialAccount, SocialAccountStore,
    StoreError,
};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};
use std::sync::{Mutex, RwLock};
use time::OffsetDateTime;

fn poisoned(e: impl std::fmt::Display) -> StoreError {
    StoreError::Database(e.to_string())
}

/// Client registry keyed by id
#[derive(Default)]
pub struct InMemoryClientRepository {
    clients: RwLock<BTreeMap<String, Client>>,
}

impl InMemoryClientRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn insert(&self, client: Client) -> Result<(), StoreError> {
        let mut clients = self.clients.write().map_err(poisoned)?;
        clients.insert(client.id.clone(), client);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Client>, StoreError> {
        let clients = self.clients.read().map_err(poisoned)?;
        Ok(clients.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Client>, StoreError> {
        let clients = self.clients.read().map_err(poisoned)?;
        Ok(clients.values().cloned().collect())
    }

    async fn modify(
        &self,
        id: &str,
        change: Change<'_, Client>,
    ) -> Result<Option<Client>, StoreError> {
        let mut clients = self.clients.write().map_err(poisoned)?;
        Ok(clients.get_mut(id).map(|client| {
            change(client);
            client.clone()
        }))
    }

    async fn remove(&self, id: &str) -> Result<Option<Client>, StoreError> {
        let mut clients = self.clients.write().map_err(poisoned)?;
        Ok(clients.remove(id))
    }
}

#[derive(Default)]
struct PostState {
    pending: HashMap<String, ScheduledPost>,
    /// Min-heap on due time. Entries are not removed on cancel or
    /// reschedule; `take_due` drops any whose time no longer matches.
    queue: BinaryHeap<Reverse<(OffsetDateTime, String)>>,
    published: Vec<ScheduledPost>,
}

/// Pending posts behind a due-time queue, plus the published list
#[derive(Default)]
pub struct InMemoryPostStore {
    state: Mutex<PostState>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn insert(&self, post: ScheduledPost) -> Result<(), StoreError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state
            .queue
            .push(Reverse((post.scheduled_time, post.id.clone())));
        state.pending.insert(post.id.clone(), post);
        Ok(())
    }

    async fn get_pending(&self, id: &str) -> Result<Option<ScheduledPost>, StoreError> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(state.pending.get(id).cloned())
    }

    async fn modify_pending(
        &self,
        id: &str,
        change: Change<'_, ScheduledPost>,
    ) -> Result<Option<ScheduledPost>, StoreError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        let Some(post) = state.pending.get_mut(id) else {
            return Ok(None);
        };
        let before = post.scheduled_time;
        change(post);
        let updated = post.clone();
        if updated.scheduled_time != before {
            state
                .queue
                .push(Reverse((updated.scheduled_time, updated.id.clone())));
        }
        Ok(Some(updated))
    }

    async fn remove_pending(&self, id: &str) -> Result<Option<ScheduledPost>, StoreError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        Ok(state.pending.remove(id))
    }

    async fn take_due(&self, now: OffsetDateTime) -> Result<Vec<String>, StoreError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        let mut due = Vec::new();
        let mut seen = HashSet::new();

        while let Some(Reverse((at, _))) = state.queue.peek() {
            if *at > now {
                break;
            }
            let Some(Reverse((at, id))) = state.queue.pop() else {
                break;
            };
            let live = state
                .pending
                .get(&id)
                .is_some_and(|p| p.scheduled_time == at);
            if live && seen.insert(id.clone()) {
                due.push(id);
            }
        }

        Ok(due)
    }

    async fn requeue(&self, id: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        let Some(at) = state.pending.get(id).map(|p| p.scheduled_time) else {
            return Ok(false);
        };
        state.queue.push(Reverse((at, id.to_string())));
        Ok(true)
    }

    async fn complete(
        &self,
        id: &str,
        results: BTreeMap<Platform, PlatformResult>,
        published_at: OffsetDateTime,
    ) -> Result<Option<ScheduledPost>, StoreError> {
        let mut state = self.state.lock().map_err(poisoned)?;
        let Some(mut post) = state.pending.remove(id) else {
            return Ok(None);
        };
        post.status = PostStatus::Published;
        post.published_at = Some(published_at);
        post.results = results;
        state.published.push(post.clone());
        Ok(Some(post))
    }

    async fn list_pending(
        &self,
        client_id: Option<&str>,
    ) -> Result<Vec<ScheduledPost>, StoreError> {
        let state = self.state.lock().map_err(poisoned)?;
        let mut posts: Vec<_> = state
            .pending
            .values()
            .filter(|p| client_id.is_none_or(|c| p.client_id == c))
            .cloned()
            .collect();
        posts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(posts)
    }

    async fn list_published(
        &self,
        client_id: Option<&str>,
    ) -> Result<Vec<ScheduledPost>, StoreError> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(state
            .published
            .iter()
            .filter(|p| client_id.is_none_or(|c| p.client_id == c))
            .cloned()
            .collect())
    }

    async fn counts(&self) -> Result<PostCounts, StoreError> {
        let state = self.state.lock().map_err(poisoned)?;
        Ok(PostCounts {
            pending: state.pending.len(),
            published: state.published.len(),
        })
    }
}

/// Append-only reply log
#[derive(Default)]
pub struct InMemoryAutoReplyLog {
    replies: RwLock<Vec<AutoReply>>,
}

impl InMemoryAutoReplyLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AutoReplyLog for InMemoryAutoReplyLog {
    async fn append(&self, reply: AutoReply) -> Result<(), StoreError> {
        self.replies.write().map_err(poisoned)?.push(reply);
        Ok(())
    }

    async fn list_for_client(&self, client_id: &str) -> Result<Vec<AutoReply>, StoreError> {
        let replies = self.replies.read().map_err(poisoned)?;
        Ok(replies
            .iter()
            .filter(|r| r.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.replies.read().map_err(poisoned)?.len())
    }
}

/// Social accounts without a database, for tests and `--in-memory` runs
#[derive(Default)]
pub struct InMemorySocialAccountStore {
    accounts: RwLock<BTreeMap<(String, Platform), SocialAccount>>,
}

impl InMemorySocialAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_string())
}

fn copy_account(account: &SocialAccount) -> SocialAccount {
    SocialAccount {
        user_id: account.user_id.clone(),
        platform: account.platform,
        access_token: copy_secret(&account.access_token),
        instagram_account_id: account.instagram_account_id.clone(),
        instagram_account_name: account.instagram_account_name.clone(),
        page_id: account.page_id.clone(),
        page_access_token: account.page_access_token.as_ref().map(copy_secret),
        expires_at: account.expires_at,
        updated_at: account.updated_at,
    }
}

#[async_trait]
impl SocialAccountStore for InMemorySocialAccountStore {
    async fn upsert(&self, account: &SocialAccount) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().map_err(poisoned)?;
        accounts.insert(
            (account.user_id.clone(), account.platform),
            copy_account(account),
        );
        Ok(())
    }

    async fn get(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> Result<Option<SocialAccount>, StoreError> {
        let accounts = self.accounts.read().map_err(poisoned)?;
        Ok(accounts
            .get(&(user_id.to_string(), platform))
            .map(copy_account))
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SocialAccount>, StoreError> {
        let accounts = self.accounts.read().map_err(poisoned)?;
        Ok(accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .map(copy_account)
            .collect())
    }

    async fn delete(&self, user_id: &str, platform: Platform) -> Result<bool, StoreError> {
        let mut accounts = self.accounts.write().map_err(poisoned)?;
        Ok(accounts.remove(&(user_id.to_string(), platform)).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use time::Duration;
    use time::macros::datetime;

    fn post(id: &str, at: OffsetDateTime) -> ScheduledPost {
        ScheduledPost {
            id: id.to_string(),
            client_id: "client_1".to_string(),
            content: "hello".to_string(),
            platforms: BTreeSet::from([Platform::Facebook]),
            scheduled_time: at,
            media: vec![],
            hashtags: vec![],
            status: PostStatus::Scheduled,
            created_at: datetime!(2024-01-01 00:00:00 UTC),
            updated_at: None,
            published_at: None,
            results: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_take_due_pops_in_time_order() {
        let store = InMemoryPostStore::new();
        let now = datetime!(2024-06-01 12:00:00 UTC);
        store.insert(post("b", now - Duration::minutes(1))).await.unwrap();
        store.insert(post("a", now - Duration::minutes(5))).await.unwrap();
        store.insert(post("c", now + Duration::minutes(1))).await.unwrap();

        assert_eq!(store.take_due(now).await.unwrap(), vec!["a", "b"]);
        assert!(store.take_due(now).await.unwrap().is_empty());
        assert_eq!(
            store.take_due(now + Duration::minutes(1)).await.unwrap(),
            vec!["c"]
        );
    }

    #[tokio::test]
    async fn test_take_due_skips_cancelled_and_rescheduled() {
        let store = InMemoryPostStore::new();
        let now = datetime!(2024-06-01 12:00:00 UTC);
        store.insert(post("gone", now)).await.unwrap();
        store.insert(post("moved", now)).await.unwrap();
        store.remove_pending("gone").await.unwrap();

        let later = now + Duration::hours(1);
        store
            .modify_pending("moved", &|p: &mut ScheduledPost| p.scheduled_time = later)
            .await
            .unwrap();

        assert!(store.take_due(now).await.unwrap().is_empty());
        assert_eq!(store.take_due(later).await.unwrap(), vec!["moved"]);
    }

    #[tokio::test]
    async fn test_rescheduled_back_is_returned_once() {
        let store = InMemoryPostStore::new();
        let now = datetime!(2024-06-01 12:00:00 UTC);
        store.insert(post("p", now)).await.unwrap();
        store
            .modify_pending("p", &|p: &mut ScheduledPost| {
                p.scheduled_time = now + Duration::hours(1)
            })
            .await
            .unwrap();
        store
            .modify_pending("p", &|p: &mut ScheduledPost| p.scheduled_time = now)
            .await
            .unwrap();

        assert_eq!(store.take_due(now).await.unwrap(), vec!["p"]);
    }

    #[tokio::test]
    async fn test_requeue_returns_post_on_next_take() {
        let store = InMemoryPostStore::new();
        let now = datetime!(2024-06-01 12:00:00 UTC);
        store.insert(post("p", now)).await.unwrap();
        assert_eq!(store.take_due(now).await.unwrap(), vec!["p"]);
        assert!(store.take_due(now).await.unwrap().is_empty());

        assert!(store.requeue("p").await.unwrap());
        assert_eq!(store.take_due(now).await.unwrap(), vec!["p"]);

        store.remove_pending("p").await.unwrap();
        assert!(!store.requeue("p").await.unwrap());
        assert!(store.take_due(now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_complete_moves_post_exactly_once() {
        let store = InMemoryPostStore::new();
        let now = datetime!(2024-06-01 12:00:00 UTC);
        store.insert(post("p", now)).await.unwrap();

        let results = BTreeMap::from([(
            Platform::Facebook,
            PlatformResult {
                success: true,
                post_id: Some("facebook_1".into()),
                url: None,
                error: None,
            },
        )]);
        let moved = store.complete("p", results.clone(), now).await.unwrap();
        assert_eq!(moved.unwrap().status, PostStatus::Published);
        assert!(store.complete("p", results, now).await.unwrap().is_none());

        assert_eq!(
            store.counts().await.unwrap(),
            PostCounts {
                pending: 0,
                published: 1
            }
        );
        assert!(store.get_pending("p").await.unwrap().is_none());
        assert_eq!(store.list_published(Some("client_1")).await.unwrap().len(), 1);
        assert!(store.list_published(Some("client_2")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_account_upsert_replaces_row() {
        let store = InMemorySocialAccountStore::new();
        let mut account = SocialAccount {
            user_id: "u1".into(),
            platform: Platform::Youtube,
            access_token: SecretString::from("first".to_string()),
            instagram_account_id: Some("UC123".into()),
            instagram_account_name: None,
            page_id: None,
            page_access_token: None,
            expires_at: None,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        store.upsert(&account).await.unwrap();
        account.access_token = SecretString::from("second".to_string());
        store.upsert(&account).await.unwrap();

        let rows = store.list_for_user("u1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].access_token.expose_secret(), "second");
        assert!(store.delete("u1", Platform::Youtube).await.unwrap());
        assert!(!store.delete("u1", Platform::Youtube).await.unwrap());
    }
}
