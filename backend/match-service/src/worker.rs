//! Match detection worker: consumes `match-checks` and turns mutual likes into
//! notifications.

use std::sync::Arc;

use async_trait::async_trait;
use event_channel::{Delivery, EventHandler, MatchCheckEvent};

use crate::services::LikeService;

pub struct MatchCheckWorker {
    likes: Arc<LikeService>,
}

impl MatchCheckWorker {
    pub fn new(likes: Arc<LikeService>) -> Self {
        Self { likes }
    }
}

#[async_trait]
impl EventHandler<MatchCheckEvent> for MatchCheckWorker {
    async fn handle(&self, delivery: Delivery<MatchCheckEvent>) -> anyhow::Result<()> {
        self.likes.process_match_check(&delivery.event).await?;
        Ok(())
    }
}
