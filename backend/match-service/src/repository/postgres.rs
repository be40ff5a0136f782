use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ChatRepository, LikeRepository, NotificationRepository};
use crate::error::AppResult;
use crate::models::{ChatMessage, Like, NewChatMessage, NewLike, NewNotification, Notification};

#[derive(Clone)]
pub struct PgLikeRepository {
    pool: PgPool,
}

impl PgLikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeRepository for PgLikeRepository {
    async fn upsert(&self, like: NewLike) -> AppResult<Like> {
        let row = sqlx::query_as::<_, Like>(
            r#"
            INSERT INTO likes (from_user_id, to_user_id, is_like)
            VALUES ($1, $2, $3)
            ON CONFLICT (from_user_id, to_user_id)
            DO UPDATE SET is_like = EXCLUDED.is_like, created_at = NOW()
            RETURNING id, from_user_id, to_user_id, is_like, created_at
            "#,
        )
        .bind(like.from_user_id)
        .bind(like.to_user_id)
        .bind(like.is_like)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn has_mutual_like(&self, a: Uuid, b: Uuid) -> AppResult<bool> {
        let mutual = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM likes l1
                JOIN likes l2
                  ON l1.to_user_id = l2.from_user_id
                 AND l1.from_user_id = l2.to_user_id
                WHERE l1.from_user_id = $1
                  AND l1.to_user_id = $2
                  AND l1.is_like = TRUE
                  AND l2.is_like = TRUE
            )
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await?;

        Ok(mutual)
    }

    async fn get_matches(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let matches = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT l1.to_user_id
            FROM likes l1
            JOIN likes l2 ON l1.to_user_id = l2.from_user_id
            WHERE l1.from_user_id = $1
              AND l1.is_like = TRUE
              AND l2.to_user_id = $1
              AND l2.is_like = TRUE
            ORDER BY l1.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(matches)
    }
}

#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, notification: NewNotification) -> AppResult<Notification> {
        let row = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, type, message, is_read)
            VALUES ($1, $2, $3, FALSE)
            RETURNING id, user_id, type, message, is_read, created_at
            "#,
        )
        .bind(notification.user_id)
        .bind(&notification.kind)
        .bind(&notification.message)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, type, message, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn mark_as_read(&self, user_id: Uuid, notification_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgChatRepository {
    pool: PgPool,
}

impl PgChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    async fn create_message(&self, message: NewChatMessage) -> AppResult<ChatMessage> {
        let row = sqlx::query_as::<_, ChatMessage>(
            r#"
            INSERT INTO messages (sender_id, receiver_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, sender_id, receiver_id, content, is_read, created_at
            "#,
        )
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(&message.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get_messages(&self, a: Uuid, b: Uuid) -> AppResult<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, sender_id, receiver_id, content, is_read, created_at
            FROM messages
            WHERE (sender_id = $1 AND receiver_id = $2)
               OR (sender_id = $2 AND receiver_id = $1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
