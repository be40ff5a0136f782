//! Two processes sharing one broker: the match service (instance 1) and a relay
//! (instance 2). X is connected to instance 1, Y only to instance 2.

use std::sync::Arc;
use std::time::Duration;

use event_channel::{
    EventPublisher, MatchCheckEvent, MemoryBroker, NotificationEvent, Outcome, Subscription,
    MATCH_CHECKS_TOPIC, NOTIFICATIONS_TOPIC,
};
use match_service::models::LikeInput;
use match_service::{AppState, MatchCheckWorker, Repositories};
use notification_relay::NotificationRelay;
use realtime_hub::{Connection, ConnectionStreams, Hub};
use tokio::sync::watch;
use uuid::Uuid;

struct Cluster {
    broker: MemoryBroker,
    service_hub: Hub,
    relay_hub: Hub,
    state: AppState,
}

fn cluster() -> Cluster {
    let broker = MemoryBroker::new();
    let service_hub = Hub::new();
    let match_checks: Arc<dyn EventPublisher> = Arc::new(broker.publisher(MATCH_CHECKS_TOPIC));
    let notifications: Arc<dyn EventPublisher> = Arc::new(broker.publisher(NOTIFICATIONS_TOPIC));
    let state = AppState::new(
        Repositories::in_memory(),
        service_hub.clone(),
        match_checks,
        notifications,
    );
    Cluster {
        broker,
        service_hub,
        relay_hub: Hub::new(),
        state,
    }
}

fn connect(hub: &Hub, user_id: Uuid) -> ConnectionStreams {
    let (connection, streams) = Connection::open(user_id, 16);
    hub.register(connection);
    streams
}

async fn like(state: &AppState, from: Uuid, to: Uuid) {
    let response = state
        .likes
        .like_user(
            from,
            LikeInput {
                target_id: to,
                is_like: true,
            },
        )
        .await
        .unwrap();
    assert!(!response.is_match);
}

#[tokio::test]
async fn test_match_reaches_user_on_other_instance() {
    let c = cluster();
    let mut checks =
        Subscription::<_, MatchCheckEvent>::new(c.broker.subscribe(MATCH_CHECKS_TOPIC));
    let mut relayed =
        Subscription::<_, NotificationEvent>::new(c.broker.subscribe(NOTIFICATIONS_TOPIC));
    let worker = MatchCheckWorker::new(c.state.likes.clone());
    let relay = NotificationRelay::new(c.relay_hub.clone());

    let x = Uuid::new_v4();
    let y = Uuid::new_v4();
    let mut x_local = connect(&c.service_hub, x);
    let mut y_remote = connect(&c.relay_hub, y);

    like(&c.state, x, y).await;
    assert_eq!(checks.process_next(&worker).await.unwrap(), Outcome::Handled);
    assert!(x_local.outbound.try_recv().is_err());

    like(&c.state, y, x).await;
    assert_eq!(checks.process_next(&worker).await.unwrap(), Outcome::Handled);

    // Instance 1 pushes X's notification directly.
    let local: serde_json::Value =
        serde_json::from_str(&x_local.outbound.try_recv().unwrap()).unwrap();
    assert_eq!(local["type"], "match");
    assert_eq!(local["userId"], x.to_string());
    assert!(x_local.outbound.try_recv().is_err());

    // Both notification events travel over the broker; only Y is connected to the relay.
    assert_eq!(relayed.process_next(&relay).await.unwrap(), Outcome::Handled);
    assert_eq!(relayed.process_next(&relay).await.unwrap(), Outcome::Handled);

    let remote: serde_json::Value =
        serde_json::from_str(&y_remote.outbound.try_recv().unwrap()).unwrap();
    assert_eq!(remote["type"], "match");
    assert_eq!(remote["toUserId"], y.to_string());
    assert_eq!(remote["message"], "You have a new match!");
    assert!(y_remote.outbound.try_recv().is_err());
}

#[tokio::test]
async fn test_running_pipeline_delivers_and_stops() {
    let c = cluster();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker_task = tokio::spawn(
        Subscription::<_, MatchCheckEvent>::new(c.broker.subscribe(MATCH_CHECKS_TOPIC))
            .run(Arc::new(MatchCheckWorker::new(c.state.likes.clone())), shutdown_rx.clone()),
    );
    let relay_task = tokio::spawn(
        Subscription::<_, NotificationEvent>::new(c.broker.subscribe(NOTIFICATIONS_TOPIC))
            .run(Arc::new(NotificationRelay::new(c.relay_hub.clone())), shutdown_rx),
    );

    let x = Uuid::new_v4();
    let y = Uuid::new_v4();
    let mut y_remote = connect(&c.relay_hub, y);

    like(&c.state, x, y).await;
    like(&c.state, y, x).await;

    let frame = tokio::time::timeout(Duration::from_secs(5), y_remote.outbound.recv())
        .await
        .expect("notification should reach the relay instance")
        .unwrap();
    let event: NotificationEvent = serde_json::from_str(&frame).unwrap();
    assert_eq!(event.to_user_id, y);
    assert_eq!(event.kind, "match");

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        worker_task.await.unwrap();
        relay_task.await.unwrap();
    })
    .await
    .expect("subscriptions should stop on shutdown");
}
