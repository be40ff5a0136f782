/// Event schemas for the two broker topics.
///
/// Field names are camelCase on the wire so that every producer and consumer of
/// `match-checks` and `notifications` agrees on a single JSON shape.
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Topic carrying [`MatchCheckEvent`]s from like recording to the match worker
pub const MATCH_CHECKS_TOPIC: &str = "match-checks";

/// Topic carrying [`NotificationEvent`]s from the match worker to relays
pub const NOTIFICATIONS_TOPIC: &str = "notifications";

/// A payload that can travel over the event channel.
pub trait Event: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Broker partition key. Events with equal keys keep their relative order.
    fn partition_key(&self) -> String;
}

/// Hint that mutual interest between two users should be re-evaluated.
///
/// Carries no match status. Consumers re-derive the truth from the system of record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCheckEvent {
    pub from_user_id: Uuid,
    pub target_id: Uuid,
}

impl MatchCheckEvent {
    pub fn new(from_user_id: Uuid, target_id: Uuid) -> Self {
        Self {
            from_user_id,
            target_id,
        }
    }
}

impl Event for MatchCheckEvent {
    // Both directions of a pair share a key so their checks stay ordered.
    fn partition_key(&self) -> String {
        let (low, high) = if self.from_user_id <= self.target_id {
            (self.from_user_id, self.target_id)
        } else {
            (self.target_id, self.from_user_id)
        };
        format!("{}:{}", low, high)
    }
}

/// Delivery-only notification routed to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    pub to_user_id: Uuid,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl NotificationEvent {
    pub fn new(to_user_id: Uuid, message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            to_user_id,
            message: message.into(),
            kind: kind.into(),
        }
    }
}

impl Event for NotificationEvent {
    fn partition_key(&self) -> String {
        self.to_user_id.to_string()
    }
}
