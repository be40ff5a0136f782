use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Notification type for a newly detected mutual like
pub const MATCH_NOTIFICATION_TYPE: &str = "match";
pub const MATCH_NOTIFICATION_MESSAGE: &str = "You have a new match!";

/// A like or a pass from one user to another. Re-liking overwrites the earlier choice.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub is_like: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLike {
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub is_like: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeInput {
    pub target_id: Uuid,
    pub is_like: bool,
}

/// Match detection is asynchronous, so `is_match` is always `false` here; the match
/// arrives later as a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub is_match: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: String,
    pub message: String,
}

impl NewNotification {
    pub fn matched(user_id: Uuid) -> Self {
        Self {
            user_id,
            kind: MATCH_NOTIFICATION_TYPE.to_string(),
            message: MATCH_NOTIFICATION_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
}

/// Server → client frames produced by this service
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundFrame<'a> {
    Chat {
        message: &'a ChatMessage,
    },
    #[serde(rename_all = "camelCase")]
    Typing { from_user_id: Uuid, to_user_id: Uuid },
}
