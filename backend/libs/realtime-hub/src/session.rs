use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::fut::wrap_future;
use actix::{Actor, ActorContext, ActorFutureExt, AsyncContext, StreamHandler};
use actix_web_actors::ws;
use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::connection::{
    CloseReason, Connection, ConnectionKey, ConnectionState, ConnectionStreams,
};
use crate::hub::Hub;
use crate::protocol::InboundFrame;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Ping cadence and how long a silent client is tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self {
            interval: HEARTBEAT_INTERVAL,
            timeout: CLIENT_TIMEOUT,
        }
    }
}

/// Processes frames a client sends over its connection.
///
/// Supplied once when the realtime routes are built and shared by every session.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    async fn handle(&self, user_id: Uuid, frame: InboundFrame) -> anyhow::Result<()>;
}

/// Inbound handler for delivery-only endpoints.
pub struct DiscardInbound;

#[async_trait]
impl InboundHandler for DiscardInbound {
    async fn handle(&self, user_id: Uuid, frame: InboundFrame) -> anyhow::Result<()> {
        debug!(user_id = %user_id, frame = ?frame, "Ignoring inbound frame");
        Ok(())
    }
}

/// One WebSocket connection.
///
/// The socket read side is this actor's stream handler; the outbound queue is attached as
/// a second stream and drained into the socket. The close signal from the hub stops the
/// actor immediately, without draining what is still queued.
///
/// Parsed client frames go through a per-session queue with a single consumer task, so
/// the inbound handler sees one connection's frames one at a time and in arrival order.
pub struct WsSession {
    key: ConnectionKey,
    hub: Hub,
    inbound: Arc<dyn InboundHandler>,
    inbound_tx: Option<mpsc::UnboundedSender<InboundFrame>>,
    pending: Option<(Connection, ConnectionStreams)>,
    close_signal: Option<watch::Receiver<Option<CloseReason>>>,
    state: ConnectionState,
    heartbeat: Heartbeat,
    hb: Instant,
}

impl WsSession {
    pub fn new(
        connection: Connection,
        streams: ConnectionStreams,
        hub: Hub,
        inbound: Arc<dyn InboundHandler>,
    ) -> Self {
        Self {
            key: connection.key(),
            hub,
            inbound,
            inbound_tx: None,
            pending: Some((connection, streams)),
            close_signal: None,
            state: ConnectionState::Upgrading,
            heartbeat: Heartbeat::default(),
            hb: Instant::now(),
        }
    }

    pub fn with_heartbeat(mut self, heartbeat: Heartbeat) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(self.heartbeat.interval, |act, ctx| {
            if Instant::now().duration_since(act.hb) > act.heartbeat.timeout {
                warn!(user_id = %act.key.user_id, "WebSocket heartbeat failed, disconnecting");
                act.close(CloseReason::ReadError, ctx);
                return;
            }
            ctx.ping(b"");
        });
    }

    fn watch_close(
        &self,
        mut closed: watch::Receiver<Option<CloseReason>>,
        ctx: &mut ws::WebsocketContext<Self>,
    ) {
        let signal = async move {
            loop {
                if let Some(reason) = *closed.borrow_and_update() {
                    return Some(reason);
                }
                if closed.changed().await.is_err() {
                    return None;
                }
            }
        };

        ctx.spawn(wrap_future::<_, Self>(signal).map(|reason, act, ctx| {
            if let Some(reason) = reason {
                act.close(reason, ctx);
            }
        }));
    }

    fn close(&mut self, reason: CloseReason, ctx: &mut ws::WebsocketContext<Self>) {
        if !self.state.advance(ConnectionState::Closing(reason)) {
            return;
        }
        let code = match reason {
            CloseReason::QueueOverflow => ws::CloseCode::Policy,
            CloseReason::ExplicitUnregister => ws::CloseCode::Away,
            CloseReason::ReadError => ws::CloseCode::Normal,
        };
        ctx.close(Some(ws::CloseReason {
            code,
            description: Some(reason.as_str().to_string()),
        }));
        ctx.stop();
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let Some((connection, streams)) = self.pending.take() else {
            ctx.stop();
            return;
        };

        self.hub.register(connection);
        self.state.advance(ConnectionState::Registered);

        info!(
            user_id = %self.key.user_id,
            connection_id = %self.key.id,
            "WebSocket session started"
        );

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        self.inbound_tx = Some(inbound_tx);
        actix::spawn(process_inbound(
            self.key.user_id,
            Arc::clone(&self.inbound),
            inbound_rx,
        ));

        self.hb(ctx);
        ctx.add_stream(ReceiverStream::new(streams.outbound));
        self.close_signal = Some(streams.closed.clone());
        self.watch_close(streams.closed, ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        // Frames already queued are still handled; the consumer ends once they are.
        self.inbound_tx.take();

        let reason = match self.state {
            ConnectionState::Closing(reason) => reason,
            _ => CloseReason::ReadError,
        };
        self.state.advance(ConnectionState::Closing(reason));
        self.state.advance(ConnectionState::Closed);
        self.hub.unregister(self.key, reason);

        info!(
            user_id = %self.key.user_id,
            connection_id = %self.key.id,
            reason = reason.as_str(),
            "WebSocket session stopped"
        );
    }
}

async fn process_inbound(
    user_id: Uuid,
    inbound: Arc<dyn InboundHandler>,
    mut frames: mpsc::UnboundedReceiver<InboundFrame>,
) {
    while let Some(frame) = frames.recv().await {
        if let Err(e) = inbound.handle(user_id, frame).await {
            warn!(user_id = %user_id, error = %e, "Failed to handle inbound frame");
        }
    }
    debug!(user_id = %user_id, "Inbound queue closed");
}

// Outbound queue → socket
impl StreamHandler<String> for WsSession {
    fn handle(&mut self, payload: String, ctx: &mut Self::Context) {
        ctx.text(payload);
    }

    // The hub dropped this connection; it always records a reason before doing so.
    fn finished(&mut self, ctx: &mut Self::Context) {
        let reason = self
            .close_signal
            .as_ref()
            .and_then(|closed| *closed.borrow())
            .unwrap_or(CloseReason::ExplicitUnregister);
        self.close(reason, ctx);
    }
}

// Socket → inbound handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                warn!(user_id = %self.key.user_id, error = %e, "WebSocket protocol error");
                self.close(CloseReason::ReadError, ctx);
                return;
            }
        };

        match msg {
            ws::Message::Ping(msg) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            ws::Message::Pong(_) => {
                self.hb = Instant::now();
            }
            ws::Message::Text(text) => {
                self.hb = Instant::now();
                match serde_json::from_str::<InboundFrame>(&text) {
                    Ok(frame) => {
                        let queued = self
                            .inbound_tx
                            .as_ref()
                            .map(|tx| tx.send(frame).is_ok())
                            .unwrap_or(false);
                        if !queued {
                            warn!(user_id = %self.key.user_id, "Inbound queue closed, dropping frame");
                        }
                    }
                    Err(e) => {
                        warn!(user_id = %self.key.user_id, error = %e, "Failed to parse WS message");
                    }
                }
            }
            ws::Message::Binary(_) => {
                warn!("Binary WebSocket messages not supported");
            }
            ws::Message::Close(reason) => {
                debug!(user_id = %self.key.user_id, reason = ?reason, "WebSocket close frame received");
                self.close(CloseReason::ReadError, ctx);
            }
            _ => {}
        }
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        self.close(CloseReason::ReadError, ctx);
    }
}
