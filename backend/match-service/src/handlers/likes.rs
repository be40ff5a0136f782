use actix_web::{web, HttpResponse};
use realtime_hub::AuthenticatedUser;

use crate::error::AppResult;
use crate::models::LikeInput;
use crate::state::AppState;

/// POST /api/v1/likes
pub async fn like_user(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
    input: web::Json<LikeInput>,
) -> AppResult<HttpResponse> {
    let response = state.likes.like_user(user.0, input.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/v1/matches
pub async fn get_matches(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let matches = state.likes.get_matches(user.0).await?;
    Ok(HttpResponse::Ok().json(matches))
}
