use actix_web::{web, HttpResponse};
use realtime_hub::AuthenticatedUser;
use uuid::Uuid;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /api/v1/chats/{other_user_id}/messages
pub async fn get_history(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let messages = state.chats.get_history(user.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(messages))
}
