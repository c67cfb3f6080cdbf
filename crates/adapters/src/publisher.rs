//! Simulated delivery and engagement

use async_trait::async_trait;
use rand::Rng;
use social_autopilot_domain::{
    Clock, EngagementEstimator, Platform, PublishError, PublishResult, Publisher, ScheduledPost,
    unix_millis,
};
use std::sync::Arc;

/// Pretends to post; ids and urls are derived from the publish time
pub struct SimulatedPublisher {
    clock: Arc<dyn Clock>,
}

impl SimulatedPublisher {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl Publisher for SimulatedPublisher {
    async fn publish(
        &self,
        platform: Platform,
        post: &ScheduledPost,
    ) -> Result<PublishResult, PublishError> {
        let millis = unix_millis(self.clock.now());
        tracing::debug!(post_id = %post.id, platform = %platform, "Simulated publish");

        Ok(PublishResult {
            id: format!("{}_{}", platform, millis),
            url: Some(format!("https://{}.com/post/{}", platform, millis)),
        })
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

/// Uniform engagement in `0..100` per published post
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomEngagement;

impl EngagementEstimator for RandomEngagement {
    fn estimate(&self, _post: &ScheduledPost) -> u64 {
        rand::thread_rng().gen_range(0..100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use social_autopilot_domain::PostStatus;
    use std::collections::BTreeSet;
    use time::OffsetDateTime;
    use time::macros::datetime;

    struct Fixed(OffsetDateTime);

    impl Clock for Fixed {
        fn now(&self) -> OffsetDateTime {
            self.0
        }
    }

    fn post() -> ScheduledPost {
        let at = datetime!(2024-06-01 09:00:00 UTC);
        ScheduledPost {
            id: "post_1".to_string(),
            client_id: "client_1".to_string(),
            content: "Fresh beans".to_string(),
            platforms: BTreeSet::from([Platform::Instagram]),
            scheduled_time: at,
            media: vec![],
            hashtags: vec![],
            status: PostStatus::Scheduled,
            created_at: at,
            updated_at: None,
            published_at: None,
            results: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_simulated_ids_follow_platform_and_time() {
        let at = datetime!(2024-06-01 09:00:00 UTC);
        let publisher = SimulatedPublisher::new(Arc::new(Fixed(at)));
        let result = publisher.publish(Platform::Instagram, &post()).await.unwrap();

        assert_eq!(result.id, "instagram_1717232400000");
        assert_eq!(
            result.url.as_deref(),
            Some("https://instagram.com/post/1717232400000")
        );
    }

    #[test]
    fn test_random_engagement_in_range() {
        let estimator = RandomEngagement;
        for _ in 0..50 {
            assert!(estimator.estimate(&post()) < 100);
        }
    }
}
