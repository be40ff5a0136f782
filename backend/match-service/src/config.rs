use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    pub match_topic: String,
    pub notification_topic: String,
    pub group_id: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub kafka: KafkaConfig,
    pub ticket_ttl: Duration,
    pub queue_capacity: usize,
    pub retry_backoff: Duration,
    pub heartbeat_interval: Duration,
    pub client_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL missing".into()))?;
        let jwt_secret = env::var("JWT_SECRET_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Config("JWT_SECRET_KEY missing".into()))?;

        let port = env::var("HTTP_PORT")
            .or_else(|_| env::var("PORT"))
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let kafka = KafkaConfig {
            brokers: env::var("KAFKA_BROKERS").unwrap_or_else(|_| "kafka:29092".into()),
            match_topic: env::var("KAFKA_MATCH_TOPIC")
                .unwrap_or_else(|_| event_channel::MATCH_CHECKS_TOPIC.into()),
            notification_topic: env::var("KAFKA_NOTIFICATION_TOPIC")
                .unwrap_or_else(|_| event_channel::NOTIFICATIONS_TOPIC.into()),
            group_id: env::var("KAFKA_GROUP_ID").unwrap_or_else(|_| "hearts-match-checker".into()),
        };

        Ok(Self {
            port,
            database_url,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10),
            jwt_secret,
            kafka,
            ticket_ttl: Duration::from_secs(parse_or("WS_TICKET_TTL_SECS", 30)),
            queue_capacity: parse_or("WS_QUEUE_CAPACITY", 256),
            retry_backoff: Duration::from_millis(parse_or("EVENT_RETRY_BACKOFF_MS", 1000)),
            heartbeat_interval: Duration::from_secs(parse_or("WS_HEARTBEAT_INTERVAL_SECS", 15)),
            client_timeout: Duration::from_secs(parse_or("WS_CLIENT_TIMEOUT_SECS", 60)),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
