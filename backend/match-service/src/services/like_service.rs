use std::sync::Arc;

use event_channel::{EventPublisher, EventPublisherExt, MatchCheckEvent};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{LikeInput, LikeResponse, NewLike};
use crate::repository::LikeRepository;
use crate::services::NotificationService;

pub struct LikeService {
    likes: Arc<dyn LikeRepository>,
    match_checks: Arc<dyn EventPublisher>,
    notifications: Arc<NotificationService>,
}

impl LikeService {
    pub fn new(
        likes: Arc<dyn LikeRepository>,
        match_checks: Arc<dyn EventPublisher>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            likes,
            match_checks,
            notifications,
        }
    }

    /// Record a like or pass and, for a like, schedule a match check.
    ///
    /// The like is committed before anything is published; a failed publish is logged
    /// and the request still succeeds.
    pub async fn like_user(&self, from_user_id: Uuid, input: LikeInput) -> AppResult<LikeResponse> {
        if from_user_id == input.target_id {
            return Err(AppError::self_like());
        }

        self.likes
            .upsert(NewLike {
                from_user_id,
                to_user_id: input.target_id,
                is_like: input.is_like,
            })
            .await?;

        if input.is_like {
            let event = MatchCheckEvent::new(from_user_id, input.target_id);
            if let Err(e) = self.match_checks.publish(&event).await {
                warn!(
                    from_user_id = %from_user_id,
                    target_id = %input.target_id,
                    error = %e,
                    "Failed to publish match check, match detection delayed"
                );
            }
        }

        Ok(LikeResponse { is_match: false })
    }

    pub async fn get_matches(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        self.likes.get_matches(user_id).await
    }

    /// Re-derive mutual interest for the pair and notify both users if it holds.
    ///
    /// The event only selects the pair. Returns whether a match was found.
    pub async fn process_match_check(&self, event: &MatchCheckEvent) -> AppResult<bool> {
        let (from, target) = (event.from_user_id, event.target_id);
        if from == target {
            debug!(user_id = %from, "Ignoring match check for a single user");
            return Ok(false);
        }

        if !self.likes.has_mutual_like(from, target).await? {
            debug!(from_user_id = %from, target_id = %target, "No mutual like");
            return Ok(false);
        }

        info!(from_user_id = %from, target_id = %target, "Mutual like detected");
        self.notifications.notify_match(from, target).await?;
        Ok(true)
    }
}
