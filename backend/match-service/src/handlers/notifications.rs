use actix_web::{web, HttpResponse};
use realtime_hub::AuthenticatedUser;
use uuid::Uuid;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /api/v1/notifications
pub async fn list(user: AuthenticatedUser, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let notifications = state.notifications.list(user.0).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

/// POST /api/v1/notifications/{id}/read
pub async fn mark_as_read(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .notifications
        .mark_as_read(user.0, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
