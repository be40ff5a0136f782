use async_trait::async_trait;
use event_channel::{Delivery, EventHandler, NotificationEvent};
use realtime_hub::Hub;
use tracing::debug;

/// Forwards `notifications` payloads unchanged to the recipient's local connections.
pub struct NotificationRelay {
    hub: Hub,
}

impl NotificationRelay {
    pub fn new(hub: Hub) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl EventHandler<NotificationEvent> for NotificationRelay {
    async fn handle(&self, delivery: Delivery<NotificationEvent>) -> anyhow::Result<()> {
        let recipient = delivery.event.to_user_id;
        let delivered = self.hub.send_to_user(recipient, &delivery.payload);
        debug!(
            user_id = %recipient,
            connections = delivered,
            "Relayed notification"
        );
        Ok(())
    }
}
