use std::sync::Arc;

use event_channel::{EventPublisher, EventPublisherExt, NotificationEvent};
use realtime_hub::Hub;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewNotification, Notification};
use crate::repository::NotificationRepository;

/// Persists notifications and pushes them to connected clients.
///
/// Delivery is two-pronged: the local hub reaches users connected to this process, the
/// `notifications` topic reaches users connected to a relay. Both are best-effort; the
/// stored record is the source of truth.
pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
    hub: Hub,
    publisher: Arc<dyn EventPublisher>,
}

impl NotificationService {
    pub fn new(
        repo: Arc<dyn NotificationRepository>,
        hub: Hub,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repo,
            hub,
            publisher,
        }
    }

    /// Record a match for both participants, then deliver to each.
    pub async fn notify_match(&self, a: Uuid, b: Uuid) -> AppResult<Vec<Notification>> {
        let mut created = Vec::with_capacity(2);
        for user_id in [a, b] {
            created.push(self.repo.create(NewNotification::matched(user_id)).await?);
        }

        for notification in &created {
            self.deliver(notification).await;
        }

        info!(user_a = %a, user_b = %b, "Match notifications sent");
        Ok(created)
    }

    async fn deliver(&self, notification: &Notification) {
        match serde_json::to_string(notification) {
            Ok(payload) => {
                let delivered = self.hub.send_to_user(notification.user_id, &payload);
                tracing::debug!(
                    user_id = %notification.user_id,
                    connections = delivered,
                    "Notification pushed to local connections"
                );
            }
            Err(e) => {
                warn!(notification_id = %notification.id, error = %e, "Failed to encode notification");
            }
        }

        let event = NotificationEvent::new(
            notification.user_id,
            notification.message.clone(),
            notification.kind.clone(),
        );
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(
                user_id = %notification.user_id,
                topic = %self.publisher.topic(),
                error = %e,
                "Failed to publish notification event"
            );
        }
    }

    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<Notification>> {
        self.repo.list_for_user(user_id).await
    }

    pub async fn mark_as_read(&self, user_id: Uuid, notification_id: Uuid) -> AppResult<()> {
        if self.repo.mark_as_read(user_id, notification_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }
}
