//! System-of-record access.
//!
//! Services depend on these traits only. [`postgres`] backs production,
//! [`memory`] backs tests and single-node demos.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{ChatMessage, Like, NewChatMessage, NewLike, NewNotification, Notification};

pub mod memory;
pub mod postgres;

#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Insert or overwrite the `from → to` choice.
    async fn upsert(&self, like: NewLike) -> AppResult<Like>;

    /// `a` likes `b` and `b` likes `a`. Symmetric in its arguments.
    async fn has_mutual_like(&self, a: Uuid, b: Uuid) -> AppResult<bool>;

    /// Users with a mutual like with `user_id`
    async fn get_matches(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: NewNotification) -> AppResult<Notification>;

    /// Newest first
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Notification>>;

    /// Returns `false` when no notification with this id belongs to `user_id`.
    async fn mark_as_read(&self, user_id: Uuid, notification_id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn create_message(&self, message: NewChatMessage) -> AppResult<ChatMessage>;

    /// Both directions of the conversation, oldest first
    async fn get_messages(&self, a: Uuid, b: Uuid) -> AppResult<Vec<ChatMessage>>;
}
