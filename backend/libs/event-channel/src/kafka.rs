//! Kafka-backed publisher and message stream

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use tracing::info;

use crate::error::EventResult;
use crate::publisher::EventPublisher;
use crate::subscriber::MessageStream;

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Produces JSON payloads to a single Kafka topic.
pub struct KafkaPublisher {
    producer: FutureProducer,
    topic: String,
}

impl KafkaPublisher {
    pub fn new(brokers: &str, topic: &str) -> EventResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .set("acks", "all")
            .set("retries", "3")
            .set("retry.backoff.ms", "100")
            .create()?;

        info!(brokers = %brokers, topic = %topic, "Kafka publisher initialized");

        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl EventPublisher for KafkaPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn publish_payload(&self, key: &str, payload: Vec<u8>) -> EventResult<()> {
        let record = FutureRecord::to(&self.topic).key(key).payload(&payload);

        match self.producer.send(record, SEND_TIMEOUT).await {
            Ok((partition, offset)) => {
                tracing::debug!(
                    topic = %self.topic,
                    key = %key,
                    partition = partition,
                    offset = offset,
                    "Event published"
                );
                Ok(())
            }
            Err((e, _)) => Err(e.into()),
        }
    }
}

/// Reads raw payloads from one Kafka topic as part of a consumer group.
///
/// Offsets are auto-committed, so a message counts as consumed once it has been read.
pub struct KafkaMessageStream {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaMessageStream {
    pub fn new(brokers: &str, group_id: &str, topic: &str) -> EventResult<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "true")
            .set("auto.commit.interval.ms", "5000")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "45000")
            .create()?;

        consumer.subscribe(&[topic])?;

        info!(
            brokers = %brokers,
            topic = %topic,
            group_id = %group_id,
            "Kafka consumer initialized"
        );

        Ok(Self {
            consumer,
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl MessageStream for KafkaMessageStream {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn next_payload(&mut self) -> EventResult<Vec<u8>> {
        let message = self.consumer.recv().await?;
        // Tombstones decode as malformed and are dropped downstream.
        Ok(message.payload().map(|p| p.to_vec()).unwrap_or_default())
    }
}
