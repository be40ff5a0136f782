//! In-process broker honouring the event channel contract.
//!
//! Every stream returned by [`MemoryBroker::subscribe`] behaves like its own consumer
//! group: it sees each message published to its topic after it subscribed, in publish
//! order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{EventChannelError, EventResult};
use crate::publisher::EventPublisher;
use crate::subscriber::MessageStream;

type Subscribers = HashMap<String, Vec<mpsc::UnboundedSender<Vec<u8>>>>;

#[derive(Clone, Default)]
pub struct MemoryBroker {
    topics: Arc<Mutex<Subscribers>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publisher(&self, topic: &str) -> MemoryPublisher {
        MemoryPublisher {
            broker: self.clone(),
            topic: topic.to_string(),
        }
    }

    pub fn subscribe(&self, topic: &str) -> MemoryMessageStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().entry(topic.to_string()).or_default().push(tx);
        MemoryMessageStream {
            topic: topic.to_string(),
            rx,
        }
    }

    /// Make every publish fail with [`EventChannelError::Unavailable`] until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn deliver(&self, topic: &str, payload: Vec<u8>) -> EventResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(EventChannelError::Unavailable(format!(
                "broker rejected publish to {}",
                topic
            )));
        }

        let mut topics = self.lock();
        if let Some(subscribers) = topics.get_mut(topic) {
            subscribers.retain(|tx| tx.send(payload.clone()).is_ok());
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.topics.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct MemoryPublisher {
    broker: MemoryBroker,
    topic: String,
}

#[async_trait]
impl EventPublisher for MemoryPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn publish_payload(&self, _key: &str, payload: Vec<u8>) -> EventResult<()> {
        self.broker.deliver(&self.topic, payload)
    }
}

pub struct MemoryMessageStream {
    topic: String,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MemoryMessageStream {
    /// Number of messages waiting to be read
    pub fn backlog(&self) -> usize {
        self.rx.len()
    }
}

#[async_trait]
impl MessageStream for MemoryMessageStream {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn next_payload(&mut self) -> EventResult<Vec<u8>> {
        self.rx.recv().await.ok_or(EventChannelError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NotificationEvent;
    use crate::publisher::EventPublisherExt;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_fan_out_to_every_subscriber() {
        let broker = MemoryBroker::new();
        let mut first = broker.subscribe("notifications");
        let mut second = broker.subscribe("notifications");
        let publisher = broker.publisher("notifications");

        let event = NotificationEvent::new(Uuid::new_v4(), "hello", "match");
        publisher.publish(&event).await.unwrap();

        let expected = serde_json::to_vec(&event).unwrap();
        assert_eq!(first.next_payload().await.unwrap(), expected);
        assert_eq!(second.next_payload().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let broker = MemoryBroker::new();
        let other = broker.subscribe("match-checks");
        let publisher = broker.publisher("notifications");

        publisher
            .publish(&NotificationEvent::new(Uuid::new_v4(), "hello", "match"))
            .await
            .unwrap();

        assert_eq!(other.backlog(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_broker_rejects_publish() {
        let broker = MemoryBroker::new();
        let stream = broker.subscribe("notifications");
        let publisher = broker.publisher("notifications");
        broker.set_unavailable(true);

        let result = publisher
            .publish(&NotificationEvent::new(Uuid::new_v4(), "hello", "match"))
            .await;

        assert!(matches!(result, Err(EventChannelError::Unavailable(_))));
        assert_eq!(stream.backlog(), 0);
    }

    #[tokio::test]
    async fn test_publish_order_is_preserved() {
        let broker = MemoryBroker::new();
        let mut stream = broker.subscribe("t");
        let publisher = broker.publisher("t");

        for i in 0..5u8 {
            publisher.publish_payload("k", vec![i]).await.unwrap();
        }
        for i in 0..5u8 {
            assert_eq!(stream.next_payload().await.unwrap(), vec![i]);
        }
    }
}
