//! # Event Channel
//!
//! Publish/subscribe wrapper over the message broker shared by the match service and
//! the notification relay.
//!
//! Two streams flow through it:
//!
//! ```text
//! like recorded ──► match-checks ──► match worker ──► notifications ──► relay ──► hub
//! ```
//!
//! ## Delivery contract
//!
//! - **At-least-once**: a message may be handed to a handler more than once.
//! - **Per-key ordering only**: events sharing a partition key keep their relative order,
//!   nothing else is ordered.
//! - **No redelivery on handler failure**: once read, a message counts as consumed even if
//!   the handler returns an error. Malformed payloads are logged and dropped.
//!
//! Any broker honouring this contract can sit behind [`EventPublisher`] and
//! [`MessageStream`]. Kafka ([`kafka`]) is used in production, [`memory::MemoryBroker`]
//! in tests and single-node runs.

pub mod error;
pub mod events;
pub mod kafka;
pub mod memory;
pub mod metrics;
pub mod publisher;
pub mod subscriber;

pub use error::{EventChannelError, EventResult};
pub use events::{Event, MatchCheckEvent, NotificationEvent, MATCH_CHECKS_TOPIC, NOTIFICATIONS_TOPIC};
pub use kafka::{KafkaMessageStream, KafkaPublisher};
pub use memory::MemoryBroker;
pub use publisher::{EventPublisher, EventPublisherExt};
pub use subscriber::{Delivery, EventHandler, MessageStream, Outcome, Subscription};
