use std::sync::Arc;

use actix_web::web;
use realtime_hub::{routes as realtime, JwtAuthMiddleware, TokenValidator};

pub mod chats;
pub mod likes;
pub mod notifications;

/// Mount every authenticated API route plus the realtime endpoints.
///
/// Expects `web::Data<AppState>` and `web::Data<RealtimeState>` in app data.
pub fn register_routes(cfg: &mut web::ServiceConfig, validator: Arc<dyn TokenValidator>) {
    cfg.service(
        web::scope("/api/v1")
            .wrap(JwtAuthMiddleware::new(validator))
            .route("/likes", web::post().to(likes::like_user))
            .route("/matches", web::get().to(likes::get_matches))
            .route("/notifications", web::get().to(notifications::list))
            .route(
                "/notifications/{id}/read",
                web::post().to(notifications::mark_as_read),
            )
            .route(
                "/chats/{other_user_id}/messages",
                web::get().to(chats::get_history),
            )
            .route("/chat/ticket", web::post().to(realtime::issue_ticket))
            .route("/ws/metrics", web::get().to(realtime::ws_metrics))
            .route("/ws/status/{user_id}", web::get().to(realtime::ws_status)),
    )
    .route("/ws", web::get().to(realtime::upgrade));
}
