//! Consumer side of the event channel
//!
//! A [`Subscription`] owns one [`MessageStream`] and feeds decoded events to an
//! [`EventHandler`]. Read failures are retried after a backoff; decode and handler
//! failures are logged and the message is dropped.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::{EventChannelError, EventResult};
use crate::events::Event;
use crate::metrics;

/// Default pause after a failed read
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Source of raw broker payloads for one topic.
///
/// `next_payload` must be cancel-safe: dropping the future before it resolves must not
/// lose a message.
#[async_trait]
pub trait MessageStream: Send {
    fn topic(&self) -> &str;

    async fn next_payload(&mut self) -> EventResult<Vec<u8>>;
}

/// A decoded event together with the exact text it was decoded from.
#[derive(Debug, Clone)]
pub struct Delivery<E> {
    pub event: E,
    pub payload: String,
}

#[async_trait]
pub trait EventHandler<E: Event>: Send + Sync {
    async fn handle(&self, delivery: Delivery<E>) -> anyhow::Result<()>;
}

/// What happened to a single message that was read from the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Handled,
    HandlerFailed,
    Malformed,
}

impl Outcome {
    fn as_str(&self) -> &'static str {
        match self {
            Outcome::Handled => "handled",
            Outcome::HandlerFailed => "handler_failed",
            Outcome::Malformed => "malformed",
        }
    }
}

pub struct Subscription<S, E> {
    topic: String,
    stream: S,
    retry_backoff: Duration,
    _event: PhantomData<fn() -> E>,
}

impl<S, E> Subscription<S, E>
where
    S: MessageStream,
    E: Event,
{
    pub fn new(stream: S) -> Self {
        Self {
            topic: stream.topic().to_string(),
            stream,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            _event: PhantomData,
        }
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Read one message and hand it to `handler`.
    ///
    /// Read errors are returned untouched. Everything after a successful read is
    /// reported through [`Outcome`]; the message is consumed either way.
    pub async fn process_next<H>(&mut self, handler: &H) -> EventResult<Outcome>
    where
        H: EventHandler<E> + ?Sized,
    {
        let payload = self.stream.next_payload().await?;
        Ok(dispatch(&self.topic, payload, handler).await)
    }

    /// Consume until `shutdown` flips to `true`, its sender is dropped, or the stream
    /// closes.
    ///
    /// Shutdown is only observed while waiting for the next message or backing off; a
    /// handler that has started always runs to completion.
    pub async fn run<H>(mut self, handler: Arc<H>, mut shutdown: watch::Receiver<bool>)
    where
        H: EventHandler<E> + ?Sized,
    {
        info!(topic = %self.topic, "Subscription started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let next = tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                next = self.stream.next_payload() => next,
            };

            match next {
                Ok(payload) => {
                    dispatch(&self.topic, payload, handler.as_ref()).await;
                }
                Err(EventChannelError::Closed) => {
                    warn!(topic = %self.topic, "Message stream closed");
                    break;
                }
                Err(e) => {
                    metrics::record_read_error(&self.topic);
                    warn!(
                        topic = %self.topic,
                        error = %e,
                        backoff_ms = self.retry_backoff.as_millis() as u64,
                        "Failed to read from broker, retrying"
                    );
                    tokio::select! {
                        changed = shutdown.changed() => {
                            if changed.is_err() || *shutdown.borrow() {
                                break;
                            }
                        }
                        _ = tokio::time::sleep(self.retry_backoff) => {}
                    }
                }
            }
        }

        info!(topic = %self.topic, "Subscription stopped");
    }
}

async fn dispatch<E, H>(topic: &str, payload: Vec<u8>, handler: &H) -> Outcome
where
    E: Event,
    H: EventHandler<E> + ?Sized,
{
    let outcome = match decode::<E>(payload) {
        Ok(delivery) => match handler.handle(delivery).await {
            Ok(()) => {
                debug!(topic = %topic, "Event handled");
                Outcome::Handled
            }
            Err(e) => {
                error!(topic = %topic, error = %e, "Event handler failed, message dropped");
                Outcome::HandlerFailed
            }
        },
        Err(reason) => {
            warn!(topic = %topic, reason = %reason, "Malformed event payload, message dropped");
            Outcome::Malformed
        }
    };
    metrics::record_consumed(topic, outcome.as_str());
    outcome
}

fn decode<E: Event>(payload: Vec<u8>) -> Result<Delivery<E>, String> {
    let payload = String::from_utf8(payload).map_err(|e| e.to_string())?;
    let event = serde_json::from_str::<E>(&payload).map_err(|e| e.to_string())?;
    Ok(Delivery { event, payload })
}
