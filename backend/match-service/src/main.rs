use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use event_channel::{EventPublisher, KafkaMessageStream, KafkaPublisher, MatchCheckEvent, Subscription};
use match_service::{
    config::Config, db, handlers, logging, websocket::ChatFrameHandler, AppState, MatchCheckWorker,
    Repositories,
};
use realtime_hub::{
    metrics, routes, Heartbeat, Hub, JwtValidator, RealtimeState, TicketStore, TokenValidator,
};
use tokio::sync::watch;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();
    metrics::init("match-service");
    let cfg = Config::from_env()?;

    tracing::info!(port = cfg.port, "Starting match-service");

    let pool = db::init_pool(&cfg.database_url, cfg.database_max_connections)
        .await
        .context("database initialization failed")?;
    let repos = Repositories::postgres(pool);

    let match_checks: Arc<dyn EventPublisher> =
        Arc::new(KafkaPublisher::new(&cfg.kafka.brokers, &cfg.kafka.match_topic)?);
    let notification_events: Arc<dyn EventPublisher> = Arc::new(KafkaPublisher::new(
        &cfg.kafka.brokers,
        &cfg.kafka.notification_topic,
    )?);

    let hub = Hub::new();
    let state = AppState::new(repos, hub.clone(), match_checks, notification_events);

    let validator: Arc<dyn TokenValidator> = Arc::new(JwtValidator::new(&cfg.jwt_secret));
    let realtime = RealtimeState::new(
        hub,
        TicketStore::new(cfg.ticket_ttl),
        validator.clone(),
        Arc::new(ChatFrameHandler::new(state.chats.clone())),
    )
    .with_queue_capacity(cfg.queue_capacity)
    .with_heartbeat(Heartbeat {
        interval: cfg.heartbeat_interval,
        timeout: cfg.client_timeout,
    });

    // Match detection worker
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let stream = KafkaMessageStream::new(
        &cfg.kafka.brokers,
        &cfg.kafka.group_id,
        &cfg.kafka.match_topic,
    )?;
    let worker = Arc::new(MatchCheckWorker::new(state.likes.clone()));
    let worker_handle = tokio::spawn(
        Subscription::<_, MatchCheckEvent>::new(stream)
            .with_retry_backoff(cfg.retry_backoff)
            .run(worker, shutdown_rx),
    );

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    tracing::info!(%bind_addr, "HTTP server listening");

    let app_state = web::Data::new(state);
    let realtime_state = web::Data::new(realtime);
    HttpServer::new(move || {
        let validator = validator.clone();
        App::new()
            .app_data(app_state.clone())
            .app_data(realtime_state.clone())
            .wrap(middleware::Logger::default())
            .wrap(metrics::MetricsMiddleware)
            .route("/healthz", web::get().to(routes::health_check))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(|cfg| handlers::register_routes(cfg, validator))
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    // Server returns after SIGINT/SIGTERM; stop consuming and let the last handler finish.
    tracing::info!("HTTP server stopped, shutting down match worker");
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker_handle.await {
        tracing::error!(error = %e, "Match worker task failed");
    }

    tracing::info!("match-service stopped");
    Ok(())
}
