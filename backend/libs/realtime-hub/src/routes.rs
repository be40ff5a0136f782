//! HTTP surface shared by every process that accepts realtime connections.

use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{bearer_token, AuthenticatedUser, TokenValidator};
use crate::connection::Connection;
use crate::error::AuthError;
use crate::hub::Hub;
use crate::session::{Heartbeat, InboundHandler, WsSession};
use crate::ticket::TicketStore;

pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Everything a realtime endpoint needs, built once per process.
#[derive(Clone)]
pub struct RealtimeState {
    pub hub: Hub,
    pub tickets: TicketStore,
    pub validator: Arc<dyn TokenValidator>,
    pub inbound: Arc<dyn InboundHandler>,
    pub queue_capacity: usize,
    pub heartbeat: Heartbeat,
}

impl RealtimeState {
    pub fn new(
        hub: Hub,
        tickets: TicketStore,
        validator: Arc<dyn TokenValidator>,
        inbound: Arc<dyn InboundHandler>,
    ) -> Self {
        Self {
            hub,
            tickets,
            validator,
            inbound,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            heartbeat: Heartbeat::default(),
        }
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_heartbeat(mut self, heartbeat: Heartbeat) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    /// Resolve the connecting user. A ticket, when present, is authoritative and is
    /// consumed; otherwise a token from the query or `Authorization` header is required.
    async fn authenticate(
        &self,
        params: &UpgradeParams,
        req: &HttpRequest,
    ) -> Result<Uuid, AuthError> {
        if let Some(ticket) = params.ticket.as_deref().filter(|t| !t.is_empty()) {
            return self
                .tickets
                .validate(ticket)
                .await
                .ok_or(AuthError::InvalidTicket);
        }

        let token = params
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| bearer_token(req))
            .ok_or(AuthError::MissingCredentials)?;
        self.validator.validate(token)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpgradeParams {
    pub ticket: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TicketResponse {
    pub ticket: String,
}

/// POST /api/v1/chat/ticket
pub async fn issue_ticket(
    user: AuthenticatedUser,
    state: web::Data<RealtimeState>,
) -> HttpResponse {
    let ticket = state.tickets.create(user.0).await;
    HttpResponse::Ok().json(TicketResponse { ticket })
}

/// GET /ws
pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<UpgradeParams>,
    state: web::Data<RealtimeState>,
) -> Result<HttpResponse, actix_web::Error> {
    let user_id = match state.authenticate(&query, &req).await {
        Ok(user_id) => user_id,
        Err(e) => {
            warn!(error = %e, "WebSocket connection rejected");
            return Err(e.into());
        }
    };

    let (connection, streams) = Connection::open(user_id, state.queue_capacity);
    info!(user_id = %user_id, connection_id = %connection.key().id, "Upgrading to WebSocket");

    let session = WsSession::new(
        connection,
        streams,
        state.hub.clone(),
        Arc::clone(&state.inbound),
    )
    .with_heartbeat(state.heartbeat);
    ws::start(session, &req, stream)
}

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/// GET /api/v1/ws/metrics
pub async fn ws_metrics(state: web::Data<RealtimeState>) -> HttpResponse {
    let total_connections = state.hub.total_connections();
    let connected_users = state.hub.connected_users();

    HttpResponse::Ok().json(json!({
        "total_connections": total_connections,
        "connected_users": connected_users,
        "pending_tickets": state.tickets.pending().await,
    }))
}

/// GET /api/v1/ws/status/{user_id}
pub async fn ws_status(
    state: web::Data<RealtimeState>,
    user_id: web::Path<Uuid>,
) -> HttpResponse {
    let user_id = user_id.into_inner();
    HttpResponse::Ok().json(json!({
        "user_id": user_id,
        "connected": state.hub.is_connected(user_id),
        "connections": state.hub.connection_count(user_id),
    }))
}
