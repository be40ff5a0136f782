use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use event_channel::{KafkaMessageStream, NotificationEvent, Subscription};
use notification_relay::{config::Config, logging, NotificationRelay};
use realtime_hub::{
    metrics, routes, DiscardInbound, Heartbeat, Hub, JwtAuthMiddleware, JwtValidator,
    RealtimeState, TicketStore, TokenValidator,
};
use tokio::sync::watch;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();
    metrics::init("notification-relay");
    let cfg = Config::from_env()?;

    tracing::info!(
        port = cfg.port,
        topic = %cfg.kafka_topic,
        group_id = %cfg.kafka_group_id,
        "Starting notification-relay"
    );

    let hub = Hub::new();
    let validator: Arc<dyn TokenValidator> = Arc::new(JwtValidator::new(&cfg.jwt_secret));
    let realtime = RealtimeState::new(
        hub.clone(),
        TicketStore::new(cfg.ticket_ttl),
        validator.clone(),
        Arc::new(DiscardInbound),
    )
    .with_queue_capacity(cfg.queue_capacity)
    .with_heartbeat(Heartbeat {
        interval: cfg.heartbeat_interval,
        timeout: cfg.client_timeout,
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let stream = KafkaMessageStream::new(&cfg.kafka_brokers, &cfg.kafka_group_id, &cfg.kafka_topic)?;
    let relay = Arc::new(NotificationRelay::new(hub));
    let relay_handle = tokio::spawn(
        Subscription::<_, NotificationEvent>::new(stream)
            .with_retry_backoff(cfg.retry_backoff)
            .run(relay, shutdown_rx),
    );

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    tracing::info!(%bind_addr, "HTTP server listening");

    let realtime_state = web::Data::new(realtime);
    HttpServer::new(move || {
        App::new()
            .app_data(realtime_state.clone())
            .wrap(middleware::Logger::default())
            .wrap(metrics::MetricsMiddleware)
            .route("/healthz", web::get().to(routes::health_check))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .route("/ws/notifications", web::get().to(routes::upgrade))
            .service(
                web::scope("/api/v1")
                    .wrap(JwtAuthMiddleware::new(validator.clone()))
                    .route("/chat/ticket", web::post().to(routes::issue_ticket))
                    .route("/ws/metrics", web::get().to(routes::ws_metrics))
                    .route("/ws/status/{user_id}", web::get().to(routes::ws_status)),
            )
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    tracing::info!("HTTP server stopped, shutting down relay consumer");
    let _ = shutdown_tx.send(true);
    if let Err(e) = relay_handle.await {
        tracing::error!(error = %e, "Relay consumer task failed");
    }

    tracing::info!("notification-relay stopped");
    Ok(())
}
