//! Single-use upgrade tickets.
//!
//! A client that already holds a bearer token trades it for a ticket over a normal HTTP
//! request, then presents the ticket as a query parameter when opening the WebSocket.
//! Browsers cannot attach headers to a WebSocket handshake, which is why this exists.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::RngCore;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::metrics;

pub const DEFAULT_TICKET_TTL: Duration = Duration::from_secs(30);

const TICKET_BYTES: usize = 32;

#[derive(Clone)]
pub struct TicketStore {
    tickets: Arc<Mutex<HashMap<String, Uuid>>>,
    ttl: Duration,
}

impl TicketStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tickets: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Issue a ticket for `user_id`. It expires after the store's TTL whether or not it
    /// was used.
    pub async fn create(&self, user_id: Uuid) -> String {
        let mut bytes = [0u8; TICKET_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let ticket = hex::encode(bytes);

        self.tickets.lock().await.insert(ticket.clone(), user_id);
        metrics::ticket_event("issued");

        let tickets = Arc::clone(&self.tickets);
        let expiring = ticket.clone();
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            // Already redeemed tickets are simply absent.
            if tickets.lock().await.remove(&expiring).is_some() {
                metrics::ticket_event("expired");
            }
        });

        debug!(user_id = %user_id, "Issued realtime ticket");
        ticket
    }

    /// Redeem a ticket. Check and removal happen under one lock, so a ticket resolves to
    /// a user at most once.
    pub async fn validate(&self, ticket: &str) -> Option<Uuid> {
        let user_id = self.tickets.lock().await.remove(ticket);
        metrics::ticket_event(if user_id.is_some() { "redeemed" } else { "rejected" });
        user_id
    }

    /// Tickets issued and neither redeemed nor expired
    pub async fn pending(&self) -> usize {
        self.tickets.lock().await.len()
    }
}

impl Default for TicketStore {
    fn default() -> Self {
        Self::new(DEFAULT_TICKET_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ticket_is_single_use() {
        let store = TicketStore::default();
        let user_id = Uuid::new_v4();
        let ticket = store.create(user_id).await;

        assert_eq!(store.validate(&ticket).await, Some(user_id));
        assert_eq!(store.validate(&ticket).await, None);
    }

    #[tokio::test]
    async fn test_unknown_ticket_is_rejected() {
        let store = TicketStore::default();
        assert_eq!(store.validate("not-a-ticket").await, None);
    }

    #[tokio::test]
    async fn test_tickets_are_unique() {
        let store = TicketStore::default();
        let user_id = Uuid::new_v4();
        let first = store.create(user_id).await;
        let second = store.create(user_id).await;

        assert_ne!(first, second);
        assert_eq!(first.len(), TICKET_BYTES * 2);
        assert_eq!(store.pending().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticket_expires_after_ttl() {
        let store = TicketStore::new(Duration::from_secs(30));
        let ticket = store.create(Uuid::new_v4()).await;

        tokio::time::sleep(Duration::from_secs(31)).await;

        assert_eq!(store.validate(&ticket).await, None);
        assert_eq!(store.pending().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticket_valid_before_ttl() {
        let store = TicketStore::new(Duration::from_secs(30));
        let user_id = Uuid::new_v4();
        let ticket = store.create(user_id).await;

        tokio::time::sleep(Duration::from_secs(29)).await;

        assert_eq!(store.validate(&ticket).await, Some(user_id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_after_redeem_is_noop() {
        let store = TicketStore::new(Duration::from_secs(30));
        let user_id = Uuid::new_v4();
        let ticket = store.create(user_id).await;
        assert_eq!(store.validate(&ticket).await, Some(user_id));

        tokio::time::sleep(Duration::from_secs(31)).await;

        assert_eq!(store.validate(&ticket).await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_validate_succeeds_once() {
        let store = TicketStore::default();
        let ticket = store.create(Uuid::new_v4()).await;

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            let ticket = ticket.clone();
            handles.push(tokio::spawn(async move { store.validate(&ticket).await }));
        }

        let mut found = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                found += 1;
            }
        }
        assert_eq!(found, 1);
    }
}
