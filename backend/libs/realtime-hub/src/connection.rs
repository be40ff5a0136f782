//! A single live duplex connection as seen by the registry.

use std::fmt;

use tokio::sync::{mpsc, watch};
use uuid::Uuid;

/// Unique identifier for one WebSocket connection.
///
/// A user with several devices holds several connections, each with its own id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Addresses one connection inside a [`Hub`](crate::Hub).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    pub user_id: Uuid,
    pub id: ConnectionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    ReadError,
    ExplicitUnregister,
    QueueOverflow,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::ReadError => "read_error",
            CloseReason::ExplicitUnregister => "explicit_unregister",
            CloseReason::QueueOverflow => "queue_overflow",
        }
    }
}

/// Lifecycle of a connection.
///
/// `Upgrading → Registered → Closing(reason) → Closed`. `Closed` is terminal and nothing
/// returns to `Registered` once closing has begun.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Upgrading,
    Registered,
    Closing(CloseReason),
    Closed,
}

impl ConnectionState {
    fn allows(&self, next: &ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Upgrading, Registered)
                | (Upgrading, Closing(_))
                | (Registered, Closing(_))
                | (Closing(_), Closed)
        )
    }

    /// Move to `next` if the transition is legal. Returns whether the state changed.
    pub fn advance(&mut self, next: ConnectionState) -> bool {
        if self.allows(&next) {
            *self = next;
            true
        } else {
            false
        }
    }
}

/// Registry-side half of a connection: the bounded outbound queue and the close signal.
#[derive(Debug)]
pub struct Connection {
    key: ConnectionKey,
    outbound: mpsc::Sender<String>,
    close: watch::Sender<Option<CloseReason>>,
}

/// Session-side half of a connection.
#[derive(Debug)]
pub struct ConnectionStreams {
    pub outbound: mpsc::Receiver<String>,
    pub closed: watch::Receiver<Option<CloseReason>>,
}

impl Connection {
    /// Create a connection for `user_id` whose outbound queue holds `capacity` frames.
    pub fn open(user_id: Uuid, capacity: usize) -> (Self, ConnectionStreams) {
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity.max(1));
        let (close_tx, close_rx) = watch::channel(None);

        let connection = Self {
            key: ConnectionKey {
                user_id,
                id: ConnectionId::new(),
            },
            outbound: outbound_tx,
            close: close_tx,
        };
        let streams = ConnectionStreams {
            outbound: outbound_rx,
            closed: close_rx,
        };
        (connection, streams)
    }

    pub fn key(&self) -> ConnectionKey {
        self.key
    }

    pub(crate) fn try_send(&self, payload: &str) -> Result<(), mpsc::error::TrySendError<String>> {
        self.outbound.try_send(payload.to_string())
    }

    /// Tell the session to shut down. The first reason recorded wins.
    pub(crate) fn signal_close(&self, reason: CloseReason) {
        self.close.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(reason);
                true
            } else {
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_happy_path() {
        let mut state = ConnectionState::Upgrading;
        assert!(state.advance(ConnectionState::Registered));
        assert!(state.advance(ConnectionState::Closing(CloseReason::QueueOverflow)));
        assert!(state.advance(ConnectionState::Closed));
        assert_eq!(state, ConnectionState::Closed);
    }

    #[test]
    fn test_state_never_reenters_registered() {
        let mut state = ConnectionState::Registered;
        state.advance(ConnectionState::Closing(CloseReason::ReadError));
        assert!(!state.advance(ConnectionState::Registered));

        state.advance(ConnectionState::Closed);
        assert!(!state.advance(ConnectionState::Registered));
        assert!(!state.advance(ConnectionState::Closing(CloseReason::ReadError)));
        assert_eq!(state, ConnectionState::Closed);
    }

    #[test]
    fn test_first_close_reason_wins() {
        let (connection, streams) = Connection::open(Uuid::new_v4(), 4);
        connection.signal_close(CloseReason::QueueOverflow);
        connection.signal_close(CloseReason::ExplicitUnregister);

        assert_eq!(*streams.closed.borrow(), Some(CloseReason::QueueOverflow));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let (connection, _streams) = Connection::open(Uuid::new_v4(), 0);
        assert!(connection.try_send("hello").is_ok());
    }
}
