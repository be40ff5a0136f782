use std::sync::Arc;

use event_channel::{
    EventPublisher, MatchCheckEvent, MemoryBroker, MessageStream, NotificationEvent, Outcome,
    Subscription, MATCH_CHECKS_TOPIC, NOTIFICATIONS_TOPIC,
};
use match_service::models::LikeInput;
use match_service::repository::LikeRepository;
use match_service::{AppError, AppState, MatchCheckWorker, Repositories};
use realtime_hub::{Connection, ConnectionStreams, Hub};
use uuid::Uuid;

struct Harness {
    broker: MemoryBroker,
    hub: Hub,
    repos: Repositories,
    state: AppState,
}

impl Harness {
    fn new() -> Self {
        let broker = MemoryBroker::new();
        let hub = Hub::new();
        let repos = Repositories::in_memory();
        let match_checks: Arc<dyn EventPublisher> = Arc::new(broker.publisher(MATCH_CHECKS_TOPIC));
        let notifications: Arc<dyn EventPublisher> =
            Arc::new(broker.publisher(NOTIFICATIONS_TOPIC));
        let state = AppState::new(repos.clone(), hub.clone(), match_checks, notifications);
        Self {
            broker,
            hub,
            repos,
            state,
        }
    }

    fn connect(&self, user_id: Uuid) -> ConnectionStreams {
        let (connection, streams) = Connection::open(user_id, 16);
        self.hub.register(connection);
        streams
    }

    async fn like(&self, from: Uuid, to: Uuid) {
        self.state
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
    }
}

fn drain(streams: &mut ConnectionStreams) -> Vec<serde_json::Value> {
    let mut frames = Vec::new();
    while let Ok(text) = streams.outbound.try_recv() {
        frames.push(serde_json::from_str(&text).unwrap());
    }
    frames
}

#[tokio::test]
async fn test_like_returns_no_match_and_publishes_check() {
    let h = Harness::new();
    let mut checks = Subscription::<_, MatchCheckEvent>::new(h.broker.subscribe(MATCH_CHECKS_TOPIC));
    let x = Uuid::new_v4();
    let y = Uuid::new_v4();

    let response = h
        .state
        .likes
        .like_user(
            x,
            LikeInput {
                target_id: y,
                is_like: true,
            },
        )
        .await
        .unwrap();
    assert!(!response.is_match);

    let worker = MatchCheckWorker::new(h.state.likes.clone());
    assert_eq!(checks.process_next(&worker).await.unwrap(), Outcome::Handled);
}

#[tokio::test]
async fn test_one_directional_like_never_matches() {
    let h = Harness::new();
    let mut checks = Subscription::<_, MatchCheckEvent>::new(h.broker.subscribe(MATCH_CHECKS_TOPIC));
    let notification_stream = h.broker.subscribe(NOTIFICATIONS_TOPIC);
    let x = Uuid::new_v4();
    let y = Uuid::new_v4();
    let mut x_conn = h.connect(x);
    let mut y_conn = h.connect(y);

    h.like(x, y).await;
    let worker = MatchCheckWorker::new(h.state.likes.clone());
    checks.process_next(&worker).await.unwrap();

    assert!(h.state.notifications.list(x).await.unwrap().is_empty());
    assert!(h.state.notifications.list(y).await.unwrap().is_empty());
    assert!(drain(&mut x_conn).is_empty());
    assert!(drain(&mut y_conn).is_empty());
    assert_eq!(notification_stream.backlog(), 0);
}

#[tokio::test]
async fn test_detection_is_order_independent() {
    let h = Harness::new();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    h.like(a, b).await;
    h.like(b, a).await;

    assert!(h
        .state
        .likes
        .process_match_check(&MatchCheckEvent::new(a, b))
        .await
        .unwrap());
    assert!(h
        .state
        .likes
        .process_match_check(&MatchCheckEvent::new(b, a))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_match_notifies_both_locally_and_over_broker() {
    let h = Harness::new();
    let mut notification_stream = h.broker.subscribe(NOTIFICATIONS_TOPIC);
    let x = Uuid::new_v4();
    let y = Uuid::new_v4();
    let mut x_conn = h.connect(x);
    let mut y_conn = h.connect(y);
    h.like(x, y).await;
    h.like(y, x).await;

    assert!(h
        .state
        .likes
        .process_match_check(&MatchCheckEvent::new(y, x))
        .await
        .unwrap());

    for (user, conn) in [(x, &mut x_conn), (y, &mut y_conn)] {
        let frames = drain(conn);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["type"], "match");
        assert_eq!(frames[0]["message"], "You have a new match!");
        assert_eq!(frames[0]["userId"], user.to_string());

        let stored = h.state.notifications.list(user).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].is_read);
    }

    let mut recipients = Vec::new();
    for _ in 0..2 {
        let payload = notification_stream.next_payload().await.unwrap();
        let event: NotificationEvent = serde_json::from_slice(&payload).unwrap();
        assert_eq!(event.kind, "match");
        recipients.push(event.to_user_id);
    }
    recipients.sort();
    let mut expected = vec![x, y];
    expected.sort();
    assert_eq!(recipients, expected);
}

#[tokio::test]
async fn test_publish_failure_keeps_like() {
    let h = Harness::new();
    let x = Uuid::new_v4();
    let y = Uuid::new_v4();
    h.broker.set_unavailable(true);

    h.like(x, y).await;
    h.like(y, x).await;

    assert!(h.repos.likes.has_mutual_like(x, y).await.unwrap());
    assert_eq!(h.state.likes.get_matches(x).await.unwrap(), vec![y]);
}

#[tokio::test]
async fn test_notification_publish_failure_still_delivers_locally() {
    let h = Harness::new();
    let x = Uuid::new_v4();
    let y = Uuid::new_v4();
    let mut x_conn = h.connect(x);
    h.like(x, y).await;
    h.like(y, x).await;
    h.broker.set_unavailable(true);

    assert!(h
        .state
        .likes
        .process_match_check(&MatchCheckEvent::new(x, y))
        .await
        .unwrap());

    assert_eq!(drain(&mut x_conn).len(), 1);
    assert_eq!(h.state.notifications.list(y).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_pass_does_not_publish() {
    let h = Harness::new();
    let checks = h.broker.subscribe(MATCH_CHECKS_TOPIC);
    let x = Uuid::new_v4();

    h.state
        .likes
        .like_user(
            x,
            LikeInput {
                target_id: Uuid::new_v4(),
                is_like: false,
            },
        )
        .await
        .unwrap();

    assert_eq!(checks.backlog(), 0);
}

#[tokio::test]
async fn test_self_like_rejected() {
    let h = Harness::new();
    let x = Uuid::new_v4();

    let result = h
        .state
        .likes
        .like_user(
            x,
            LikeInput {
                target_id: x,
                is_like: true,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
}

#[tokio::test]
async fn test_redelivered_check_is_not_deduplicated() {
    let h = Harness::new();
    let x = Uuid::new_v4();
    let y = Uuid::new_v4();
    h.like(x, y).await;
    h.like(y, x).await;

    let event = MatchCheckEvent::new(x, y);
    h.state.likes.process_match_check(&event).await.unwrap();
    h.state.likes.process_match_check(&event).await.unwrap();

    assert_eq!(h.state.notifications.list(x).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_chat_requires_match() {
    let h = Harness::new();
    let x = Uuid::new_v4();
    let y = Uuid::new_v4();
    h.like(x, y).await;

    let result = h.state.chats.send_message(x, y, "hi".into()).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let history = h.state.chats.get_history(x, y).await;
    assert!(matches!(history, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_chat_delivers_to_receiver_and_echoes_sender() {
    let h = Harness::new();
    let x = Uuid::new_v4();
    let y = Uuid::new_v4();
    let mut x_conn = h.connect(x);
    let mut y_conn = h.connect(y);
    h.like(x, y).await;
    h.like(y, x).await;

    let message = h
        .state
        .chats
        .send_message(x, y, "hello".into())
        .await
        .unwrap();

    for conn in [&mut x_conn, &mut y_conn] {
        let frames = drain(conn);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["type"], "chat");
        assert_eq!(frames[0]["message"]["content"], "hello");
        assert_eq!(frames[0]["message"]["id"], message.id.to_string());
    }

    let history = h.state.chats.get_history(y, x).await.unwrap();
    assert_eq!(history, vec![message]);
}

#[tokio::test]
async fn test_typing_forwarded_to_target_only() {
    let h = Harness::new();
    let x = Uuid::new_v4();
    let y = Uuid::new_v4();
    let mut x_conn = h.connect(x);
    let mut y_conn = h.connect(y);

    assert_eq!(h.state.chats.send_typing(x, y).unwrap(), 1);

    let frames = drain(&mut y_conn);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], "typing");
    assert_eq!(frames[0]["fromUserId"], x.to_string());
    assert!(drain(&mut x_conn).is_empty());
}
