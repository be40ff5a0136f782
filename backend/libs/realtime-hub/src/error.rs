use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Reasons a realtime upgrade or ticket request is refused.
///
/// Every variant maps to `401 Unauthorized`; nothing is allocated for a refused request.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing ticket or token")]
    MissingCredentials,

    #[error("Invalid or expired ticket")]
    InvalidTicket,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string(),
        }))
    }
}
