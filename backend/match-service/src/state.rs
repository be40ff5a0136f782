use std::sync::Arc;

use event_channel::EventPublisher;
use realtime_hub::Hub;
use sqlx::PgPool;

use crate::repository::memory::{
    InMemoryChatRepository, InMemoryLikeRepository, InMemoryNotificationRepository,
};
use crate::repository::postgres::{PgChatRepository, PgLikeRepository, PgNotificationRepository};
use crate::repository::{ChatRepository, LikeRepository, NotificationRepository};
use crate::services::{ChatService, LikeService, NotificationService};

#[derive(Clone)]
pub struct Repositories {
    pub likes: Arc<dyn LikeRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub chats: Arc<dyn ChatRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            likes: Arc::new(PgLikeRepository::new(pool.clone())),
            notifications: Arc::new(PgNotificationRepository::new(pool.clone())),
            chats: Arc::new(PgChatRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            likes: Arc::new(InMemoryLikeRepository::new()),
            notifications: Arc::new(InMemoryNotificationRepository::new()),
            chats: Arc::new(InMemoryChatRepository::new()),
        }
    }
}

/// Services shared by HTTP handlers, the WebSocket handler and the worker.
#[derive(Clone)]
pub struct AppState {
    pub likes: Arc<LikeService>,
    pub notifications: Arc<NotificationService>,
    pub chats: Arc<ChatService>,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        hub: Hub,
        match_checks: Arc<dyn EventPublisher>,
        notification_events: Arc<dyn EventPublisher>,
    ) -> Self {
        let notifications = Arc::new(NotificationService::new(
            repos.notifications,
            hub.clone(),
            notification_events,
        ));
        let likes = Arc::new(LikeService::new(
            repos.likes.clone(),
            match_checks,
            notifications.clone(),
        ));
        let chats = Arc::new(ChatService::new(repos.chats, repos.likes, hub));

        Self {
            likes,
            notifications,
            chats,
        }
    }
}
