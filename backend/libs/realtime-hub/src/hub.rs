/// Connection Registry
///
/// Maps user id → live connections and fans payloads out to them.
/// Supports:
/// - Multiple concurrent connections per user
/// - Targeted send and broadcast
/// - Drop-and-disconnect for connections whose outbound queue is full
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::connection::{CloseReason, Connection, ConnectionKey};
use crate::metrics;

/// Process-local registry of live connections.
///
/// Each user's connection set sits behind its shard lock, so register, unregister and
/// delivery for one user are serialized while other users proceed independently. No
/// operation awaits while holding a lock: delivery uses `try_send` only.
#[derive(Clone, Default)]
pub struct Hub {
    connections: Arc<DashMap<Uuid, Vec<Connection>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection under its user's set.
    pub fn register(&self, connection: Connection) -> ConnectionKey {
        let key = connection.key();
        let mut set = self.connections.entry(key.user_id).or_default();
        set.push(connection);

        metrics::connection_opened();
        debug!(
            user_id = %key.user_id,
            connection_id = %key.id,
            user_connections = set.len(),
            "Connection registered"
        );
        key
    }

    /// Remove a connection and close its outbound queue, recording why it went away.
    ///
    /// Safe to call more than once; later calls return `false`.
    pub fn unregister(&self, key: ConnectionKey, reason: CloseReason) -> bool {
        let removed = match self.connections.get_mut(&key.user_id) {
            Some(mut set) => set
                .iter()
                .position(|c| c.key() == key)
                .map(|index| set.swap_remove(index)),
            None => None,
        };
        self.prune(key.user_id);

        match removed {
            Some(connection) => {
                connection.signal_close(reason);
                metrics::connection_closed(reason);
                debug!(
                    user_id = %key.user_id,
                    connection_id = %key.id,
                    reason = reason.as_str(),
                    "Connection unregistered"
                );
                true
            }
            None => false,
        }
    }

    /// Enqueue `payload` on every connection of `user_id` without waiting.
    ///
    /// Returns how many connections accepted it. Connections with a full queue are
    /// closed and removed.
    pub fn send_to_user(&self, user_id: Uuid, payload: &str) -> usize {
        let delivered = match self.connections.get_mut(&user_id) {
            Some(mut set) => deliver(&mut set, payload),
            None => 0,
        };
        self.prune(user_id);
        delivered
    }

    /// Enqueue `payload` on every registered connection, same policy as
    /// [`send_to_user`](Self::send_to_user).
    pub fn broadcast(&self, payload: &str) -> usize {
        let mut delivered = 0;
        let mut emptied = Vec::new();

        for mut entry in self.connections.iter_mut() {
            delivered += deliver(entry.value_mut(), payload);
            if entry.value().is_empty() {
                emptied.push(*entry.key());
            }
        }
        for user_id in emptied {
            self.prune(user_id);
        }
        delivered
    }

    /// Number of live connections for a user
    pub fn connection_count(&self, user_id: Uuid) -> usize {
        self.connections.get(&user_id).map(|set| set.len()).unwrap_or(0)
    }

    /// Number of live connections across all users
    pub fn total_connections(&self) -> usize {
        self.connections.iter().map(|entry| entry.value().len()).sum()
    }

    /// Number of users with at least one live connection
    pub fn connected_users(&self) -> usize {
        self.connections.len()
    }

    pub fn is_connected(&self, user_id: Uuid) -> bool {
        self.connection_count(user_id) > 0
    }

    fn prune(&self, user_id: Uuid) {
        self.connections.remove_if(&user_id, |_, set| set.is_empty());
    }
}

fn deliver(set: &mut Vec<Connection>, payload: &str) -> usize {
    let mut delivered = 0;
    set.retain(|connection| match connection.try_send(payload) {
        Ok(()) => {
            delivered += 1;
            true
        }
        Err(TrySendError::Full(_)) => {
            let key = connection.key();
            warn!(
                user_id = %key.user_id,
                connection_id = %key.id,
                "Outbound queue full, disconnecting slow consumer"
            );
            connection.signal_close(CloseReason::QueueOverflow);
            metrics::connection_closed(CloseReason::QueueOverflow);
            false
        }
        Err(TrySendError::Closed(_)) => {
            // Session already gone without unregistering.
            connection.signal_close(CloseReason::ReadError);
            metrics::connection_closed(CloseReason::ReadError);
            false
        }
    });
    metrics::frames_delivered(delivered);
    delivered
}
