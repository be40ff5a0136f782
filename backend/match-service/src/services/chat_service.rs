use std::sync::Arc;

use realtime_hub::Hub;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ChatMessage, NewChatMessage, OutboundFrame};
use crate::repository::{ChatRepository, LikeRepository};

/// Chat between matched users.
pub struct ChatService {
    chats: Arc<dyn ChatRepository>,
    likes: Arc<dyn LikeRepository>,
    hub: Hub,
}

impl ChatService {
    pub fn new(chats: Arc<dyn ChatRepository>, likes: Arc<dyn LikeRepository>, hub: Hub) -> Self {
        Self { chats, likes, hub }
    }

    async fn ensure_matched(&self, a: Uuid, b: Uuid) -> AppResult<()> {
        if self.likes.has_mutual_like(a, b).await? {
            Ok(())
        } else {
            Err(AppError::not_matched())
        }
    }

    /// Persist a message and push it to the receiver and back to the sender.
    pub async fn send_message(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: String,
    ) -> AppResult<ChatMessage> {
        if content.trim().is_empty() {
            return Err(AppError::BadRequest("message content is empty".into()));
        }
        self.ensure_matched(sender_id, receiver_id).await?;

        let message = self
            .chats
            .create_message(NewChatMessage {
                sender_id,
                receiver_id,
                content,
            })
            .await?;

        let payload = serde_json::to_string(&OutboundFrame::Chat { message: &message })?;
        self.hub.send_to_user(receiver_id, &payload);
        self.hub.send_to_user(sender_id, &payload);

        Ok(message)
    }

    /// Forward a typing indicator. Nothing is stored.
    pub fn send_typing(&self, from_user_id: Uuid, to_user_id: Uuid) -> AppResult<usize> {
        let payload = serde_json::to_string(&OutboundFrame::Typing {
            from_user_id,
            to_user_id,
        })?;
        Ok(self.hub.send_to_user(to_user_id, &payload))
    }

    pub async fn get_history(&self, user_id: Uuid, other_user_id: Uuid) -> AppResult<Vec<ChatMessage>> {
        self.ensure_matched(user_id, other_user_id).await?;
        self.chats.get_messages(user_id, other_user_id).await
    }
}
