//! Producer side of the event channel

use async_trait::async_trait;

use crate::error::EventResult;
use crate::events::Event;
use crate::metrics;

/// Writes raw payloads to one configured topic.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Topic every payload from this publisher lands on
    fn topic(&self) -> &str;

    /// Write an already-encoded payload under `key`
    async fn publish_payload(&self, key: &str, payload: Vec<u8>) -> EventResult<()>;
}

/// Typed publishing on top of any [`EventPublisher`].
///
/// Errors are returned to the caller. Whether they matter is the caller's decision; in
/// this system every producer treats them as non-fatal.
#[async_trait]
pub trait EventPublisherExt: EventPublisher {
    async fn publish<E: Event>(&self, event: &E) -> EventResult<()> {
        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(e) => {
                metrics::record_publish(self.topic(), false);
                return Err(e.into());
            }
        };
        let result = self.publish_payload(&event.partition_key(), payload).await;
        metrics::record_publish(self.topic(), result.is_ok());
        result
    }
}

impl<P: EventPublisher + ?Sized> EventPublisherExt for P {}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::*;
    use crate::error::EventChannelError;

    struct CountingPublisher {
        topic: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EventPublisher for CountingPublisher {
        fn topic(&self) -> &str {
            &self.topic
        }

        async fn publish_payload(&self, _key: &str, _payload: Vec<u8>) -> EventResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("cannot encode"))
        }
    }

    impl<'de> Deserialize<'de> for Unencodable {
        fn deserialize<D: Deserializer<'de>>(_deserializer: D) -> Result<Self, D::Error> {
            Err(D::Error::custom("cannot decode"))
        }
    }

    impl Event for Unencodable {
        fn partition_key(&self) -> String {
            "unencodable".to_string()
        }
    }

    #[tokio::test]
    async fn test_encode_failure_is_counted_and_not_sent() {
        let publisher = CountingPublisher {
            topic: "publisher-test-encode-failure".to_string(),
            calls: AtomicUsize::new(0),
        };

        let result = publisher.publish(&Unencodable).await;

        assert!(matches!(result, Err(EventChannelError::Serialization(_))));
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            metrics::published_total("publisher-test-encode-failure", "error"),
            1
        );
    }

    #[tokio::test]
    async fn test_successful_publish_is_counted() {
        let publisher = CountingPublisher {
            topic: "publisher-test-success".to_string(),
            calls: AtomicUsize::new(0),
        };

        publisher
            .publish(&crate::events::MatchCheckEvent::new(
                uuid::Uuid::new_v4(),
                uuid::Uuid::new_v4(),
            ))
            .await
            .unwrap();

        assert_eq!(publisher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(metrics::published_total("publisher-test-success", "ok"), 1);
    }
}
