use std::sync::Arc;

use async_trait::async_trait;
use realtime_hub::{InboundFrame, InboundHandler};
use uuid::Uuid;

use crate::services::ChatService;

/// Routes chat and typing frames from a client connection to [`ChatService`].
pub struct ChatFrameHandler {
    chats: Arc<ChatService>,
}

impl ChatFrameHandler {
    pub fn new(chats: Arc<ChatService>) -> Self {
        Self { chats }
    }
}

#[async_trait]
impl InboundHandler for ChatFrameHandler {
    async fn handle(&self, user_id: Uuid, frame: InboundFrame) -> anyhow::Result<()> {
        match frame {
            InboundFrame::Chat {
                to_user_id,
                content,
            } => {
                self.chats.send_message(user_id, to_user_id, content).await?;
            }
            InboundFrame::Typing { to_user_id } => {
                self.chats.send_typing(user_id, to_user_id)?;
            }
        }
        Ok(())
    }
}
