use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ChatRepository, LikeRepository, NotificationRepository};
use crate::error::AppResult;
use crate::models::{ChatMessage, Like, NewChatMessage, NewLike, NewNotification, Notification};

#[derive(Default)]
pub struct InMemoryLikeRepository {
    likes: RwLock<HashMap<(Uuid, Uuid), Like>>,
}

impl InMemoryLikeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_liked(likes: &HashMap<(Uuid, Uuid), Like>, from: Uuid, to: Uuid) -> bool {
        likes.get(&(from, to)).map(|l| l.is_like).unwrap_or(false)
    }
}

#[async_trait]
impl LikeRepository for InMemoryLikeRepository {
    async fn upsert(&self, like: NewLike) -> AppResult<Like> {
        let mut likes = self.likes.write().await;
        let key = (like.from_user_id, like.to_user_id);
        let id = likes.get(&key).map(|l| l.id).unwrap_or_else(Uuid::new_v4);
        let row = Like {
            id,
            from_user_id: like.from_user_id,
            to_user_id: like.to_user_id,
            is_like: like.is_like,
            created_at: Utc::now(),
        };
        likes.insert(key, row.clone());
        Ok(row)
    }

    async fn has_mutual_like(&self, a: Uuid, b: Uuid) -> AppResult<bool> {
        let likes = self.likes.read().await;
        Ok(Self::is_liked(&likes, a, b) && Self::is_liked(&likes, b, a))
    }

    async fn get_matches(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let likes = self.likes.read().await;
        Ok(likes
            .values()
            .filter(|l| l.from_user_id == user_id && l.is_like)
            .filter(|l| Self::is_liked(&likes, l.to_user_id, user_id))
            .map(|l| l.to_user_id)
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryNotificationRepository {
    // Insertion order doubles as creation order.
    notifications: RwLock<Vec<Notification>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn create(&self, notification: NewNotification) -> AppResult<Notification> {
        let row = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            kind: notification.kind,
            message: notification.message,
            is_read: false,
            created_at: Utc::now(),
        };
        self.notifications.write().await.push(row.clone());
        Ok(row)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Notification>> {
        let notifications = self.notifications.read().await;
        Ok(notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn mark_as_read(&self, user_id: Uuid, notification_id: Uuid) -> AppResult<bool> {
        let mut notifications = self.notifications.write().await;
        match notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id)
        {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryChatRepository {
    messages: RwLock<Vec<ChatMessage>>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn create_message(&self, message: NewChatMessage) -> AppResult<ChatMessage> {
        let row = ChatMessage {
            id: Uuid::new_v4(),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content,
            is_read: false,
            created_at: Utc::now(),
        };
        self.messages.write().await.push(row.clone());
        Ok(row)
    }

    async fn get_messages(&self, a: Uuid, b: Uuid) -> AppResult<Vec<ChatMessage>> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| {
                (m.sender_id == a && m.receiver_id == b) || (m.sender_id == b && m.receiver_id == a)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn like(from: Uuid, to: Uuid, is_like: bool) -> NewLike {
        NewLike {
            from_user_id: from,
            to_user_id: to,
            is_like,
        }
    }

    #[tokio::test]
    async fn test_mutual_like_is_symmetric() {
        let repo = InMemoryLikeRepository::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        repo.upsert(like(a, b, true)).await.unwrap();
        assert!(!repo.has_mutual_like(a, b).await.unwrap());

        repo.upsert(like(b, a, true)).await.unwrap();
        assert!(repo.has_mutual_like(a, b).await.unwrap());
        assert!(repo.has_mutual_like(b, a).await.unwrap());
    }

    #[tokio::test]
    async fn test_pass_overrides_like() {
        let repo = InMemoryLikeRepository::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let first = repo.upsert(like(a, b, true)).await.unwrap();
        repo.upsert(like(b, a, true)).await.unwrap();

        let second = repo.upsert(like(a, b, false)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert!(!repo.has_mutual_like(a, b).await.unwrap());
        assert!(repo.get_matches(b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_matches() {
        let repo = InMemoryLikeRepository::new();
        let me = Uuid::new_v4();
        let mutual = Uuid::new_v4();
        let one_sided = Uuid::new_v4();
        repo.upsert(like(me, mutual, true)).await.unwrap();
        repo.upsert(like(mutual, me, true)).await.unwrap();
        repo.upsert(like(me, one_sided, true)).await.unwrap();

        assert_eq!(repo.get_matches(me).await.unwrap(), vec![mutual]);
    }

    #[tokio::test]
    async fn test_notifications_newest_first() {
        let repo = InMemoryNotificationRepository::new();
        let user = Uuid::new_v4();
        let older = repo.create(NewNotification::matched(user)).await.unwrap();
        let newer = repo.create(NewNotification::matched(user)).await.unwrap();
        repo.create(NewNotification::matched(Uuid::new_v4()))
            .await
            .unwrap();

        let ids: Vec<Uuid> = repo
            .list_for_user(user)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn test_mark_as_read_scoped_to_owner() {
        let repo = InMemoryNotificationRepository::new();
        let owner = Uuid::new_v4();
        let n = repo.create(NewNotification::matched(owner)).await.unwrap();

        assert!(!repo.mark_as_read(Uuid::new_v4(), n.id).await.unwrap());
        assert!(repo.mark_as_read(owner, n.id).await.unwrap());
        assert!(repo.list_for_user(owner).await.unwrap()[0].is_read);
    }

    #[tokio::test]
    async fn test_messages_cover_both_directions() {
        let repo = InMemoryChatRepository::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        for (sender, receiver, content) in [(a, b, "hi"), (b, a, "hey"), (a, Uuid::new_v4(), "other")] {
            repo.create_message(NewChatMessage {
                sender_id: sender,
                receiver_id: receiver,
                content: content.to_string(),
            })
            .await
            .unwrap();
        }

        let contents: Vec<String> = repo
            .get_messages(b, a)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["hi", "hey"]);
    }
}
