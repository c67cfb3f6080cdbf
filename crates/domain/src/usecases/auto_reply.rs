//! Auto-reply use case

use std::sync::Arc;

use crate::IdGenerator;
use crate::model::{AutoReply, AutoReplyRules, Client, IncomingComment};
use crate::ports::{AutoReplyLog, ClientRepository, Clock};
use crate::usecases::{ContentService, ServiceError};
use crate::validation::require_text;

/// Result of processing one comment
#[derive(Debug)]
pub enum AutoReplyOutcome {
    Sent(AutoReply),
    /// Client missing or auto-reply switched off
    Disabled,
}

#[derive(Clone)]
pub struct AutoReplyService {
    clients: Arc<dyn ClientRepository>,
    log: Arc<dyn AutoReplyLog>,
    content: ContentService,
    clock: Arc<dyn Clock>,
    ids: Arc<IdGenerator>,
}

impl AutoReplyService {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        log: Arc<dyn AutoReplyLog>,
        content: ContentService,
        clock: Arc<dyn Clock>,
        ids: Arc<IdGenerator>,
    ) -> Self {
        Self {
            clients,
            log,
            content,
            clock,
            ids,
        }
    }

    /// Switch auto-reply on and store the rules (default canned replies if none)
    pub async fn enable(
        &self,
        client_id: &str,
        rules: Option<AutoReplyRules>,
    ) -> Result<(), ServiceError> {
        let rules = rules.unwrap_or_default();
        let change = move |client: &mut Client| {
            client.settings.auto_reply = true;
            client.auto_reply_rules = Some(rules.clone());
        };
        self.clients
            .modify(client_id, &change)
            .await?
            .ok_or(ServiceError::NotFound("Client"))?;
        tracing::info!(client_id = %client_id, "Auto-reply enabled");
        Ok(())
    }

    /// Generate and log a reply to an incoming comment
    pub async fn process(
        &self,
        client_id: &str,
        incoming: IncomingComment,
    ) -> Result<AutoReplyOutcome, ServiceError> {
        let client = match self.clients.get(client_id).await? {
            Some(c) if c.settings.auto_reply => c,
            _ => return Ok(AutoReplyOutcome::Disabled),
        };

        let mut errors = Vec::new();
        let Some(comment) = require_text("Comment", incoming.comment.as_deref(), &mut errors)
        else {
            return Err(ServiceError::Validation(errors));
        };

        let reply = self.content.auto_reply(&comment, &client.brand_voice).await?;
        let now = self.clock.now();
        let record = AutoReply {
            id: self.ids.next("reply", now),
            client_id: client_id.to_string(),
            post_id: incoming.post_id,
            platform: incoming.platform,
            comment,
            reply,
            status: "sent".to_string(),
            created_at: now,
        };
        self.log.append(record.clone()).await?;

        tracing::info!(client_id = %client_id, reply_id = %record.id, "Auto-reply sent");
        Ok(AutoReplyOutcome::Sent(record))
    }

    pub async fn history(&self, client_id: &str) -> Result<Vec<AutoReply>, ServiceError> {
        Ok(self.log.list_for_client(client_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClientSettings;
    use crate::usecases::fakes::{FakeClients, FakeClock, FakeReplies, ScriptedGenerator, client};
    use time::macros::datetime;

    fn service(clients: Arc<FakeClients>, generator: Arc<ScriptedGenerator>) -> AutoReplyService {
        let clock = Arc::new(FakeClock::at(datetime!(2024-06-01 09:00:00 UTC)));
        AutoReplyService::new(
            clients.clone(),
            Arc::new(FakeReplies::default()),
            ContentService::new(generator, clients),
            clock,
            Arc::new(IdGenerator::new()),
        )
    }

    fn comment(text: &str) -> IncomingComment {
        IncomingComment {
            comment: Some(text.into()),
            post_id: Some("post_1".into()),
            platform: Some("instagram".into()),
        }
    }

    #[tokio::test]
    async fn test_process_logs_generated_reply() {
        let clients = Arc::new(FakeClients::with(vec![client("client_1", "Acme")]));
        let generator = Arc::new(ScriptedGenerator::ok(" Thanks, see you soon! "));
        let svc = service(clients, generator.clone());

        let outcome = svc.process("client_1", comment("Love it")).await.unwrap();
        let AutoReplyOutcome::Sent(reply) = outcome else {
            panic!("expected a reply");
        };
        assert_eq!(reply.reply, "Thanks, see you soon!");
        assert_eq!(reply.status, "sent");
        assert!(reply.id.starts_with("reply_"));
        assert_eq!(generator.last_request().max_tokens, 80);

        let history = svc.history("client_1").await.unwrap();
        assert_eq!(history, vec![reply]);
        assert!(svc.history("client_2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_process_when_disabled_or_missing() {
        let mut quiet = client("client_1", "Acme");
        quiet.settings = ClientSettings {
            auto_reply: false,
            ..Default::default()
        };
        let clients = Arc::new(FakeClients::with(vec![quiet]));
        let svc = service(clients, Arc::new(ScriptedGenerator::ok("hi")));

        assert!(matches!(
            svc.process("client_1", comment("hello")).await.unwrap(),
            AutoReplyOutcome::Disabled
        ));
        assert!(matches!(
            svc.process("ghost", comment("hello")).await.unwrap(),
            AutoReplyOutcome::Disabled
        ));

        svc.enable("client_1", None).await.unwrap();
        assert!(matches!(
            svc.process("client_1", comment("hello")).await.unwrap(),
            AutoReplyOutcome::Sent(_)
        ));
    }

    #[tokio::test]
    async fn test_enable_stores_default_rules() {
        let clients = Arc::new(FakeClients::with(vec![client("client_1", "Acme")]));
        let svc = service(clients.clone(), Arc::new(ScriptedGenerator::ok("hi")));
        svc.enable("client_1", None).await.unwrap();

        let stored = clients.get("client_1").await.unwrap().unwrap();
        let rules = stored.auto_reply_rules.unwrap();
        assert_eq!(rules.sentiment.neutral, "Thanks for your comment!");

        assert!(matches!(
            svc.enable("ghost", None).await,
            Err(ServiceError::NotFound("Client"))
        ));
    }
}
