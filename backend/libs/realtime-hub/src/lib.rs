//! # Realtime Hub
//!
//! Per-process realtime delivery: a registry of live WebSocket connections keyed by user,
//! single-use upgrade tickets, and the actix session actor that bridges a socket to the
//! registry.
//!
//! Every process that holds client connections runs one [`Hub`]. Processes never share a
//! hub; anything that must reach a user connected elsewhere goes through the broker.
//!
//! ## Delivery policy
//!
//! Each connection owns a bounded outbound queue. Sends never wait: when a queue is full
//! the connection is closed and dropped from the registry, and every other recipient is
//! unaffected.

pub mod auth;
pub mod connection;
pub mod error;
pub mod hub;
pub mod metrics;
pub mod protocol;
pub mod routes;
pub mod session;
pub mod ticket;

pub use auth::{AuthenticatedUser, JwtAuthMiddleware, JwtValidator, TokenValidator};
pub use connection::{
    CloseReason, Connection, ConnectionId, ConnectionKey, ConnectionState, ConnectionStreams,
};
pub use error::AuthError;
pub use hub::Hub;
pub use protocol::InboundFrame;
pub use routes::RealtimeState;
pub use session::{DiscardInbound, Heartbeat, InboundHandler, WsSession};
pub use ticket::TicketStore;
