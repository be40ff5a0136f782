pub mod chat_service;
pub mod like_service;
pub mod notification_service;

pub use chat_service::ChatService;
pub use like_service::LikeService;
pub use notification_service::NotificationService;
