//! WebSocket session lifecycle: one admitted client from registration
//! through disconnect.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{Sink, SinkExt, StreamExt};
use metrics::{counter, histogram};
use sportz_core::{ConnectionId, EventEnvelope};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::connection::{ClientConnection, Frame};
use super::decode::{Inbound, decode};
use super::hub::ConnectionHub;
use crate::config::ServerConfig;
use crate::metrics::{WS_CONNECTION_DURATION_SECONDS, WS_DECODE_ERRORS_TOTAL};

/// How long the writer may keep flushing after the reader has stopped.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Timing and queue parameters for one session.
#[derive(Clone, Copy, Debug)]
pub struct SessionOptions {
    /// Outbound queue capacity.
    pub queue_capacity: usize,
    /// Interval between server-initiated Ping frames.
    pub ping_interval: Duration,
    /// Disconnect after this long without a Pong.
    pub pong_timeout: Duration,
}

impl From<&ServerConfig> for SessionOptions {
    fn from(config: &ServerConfig) -> Self {
        Self {
            queue_capacity: config.send_queue_capacity,
            ping_interval: config.ping_interval(),
            pong_timeout: config.pong_timeout(),
        }
    }
}

/// Run a session for an admitted client.
///
/// 1. Registers with the hub (which queues the welcome)
/// 2. Relays decoded inbound payloads to every connection
/// 3. Answers malformed frames with an `error` envelope to this client only
/// 4. Forwards queued frames and periodic Pings from a writer task
/// 5. Removes itself from the hub on close, error, or shutdown
///
/// `stop` must be private to this session; it is cancelled on the way out.
#[instrument(skip_all, fields(client_id = %client_id))]
pub async fn run_ws_session(
    socket: WebSocket,
    client_id: ConnectionId,
    hub: Arc<ConnectionHub>,
    options: SessionOptions,
    stop: CancellationToken,
) {
    let (ws_tx, mut ws_rx) = socket.split();

    let (send_tx, send_rx) = mpsc::channel::<Frame>(options.queue_capacity);
    let connection = Arc::new(ClientConnection::new(client_id.clone(), send_tx));

    info!("client connected");
    hub.register(connection.clone());

    let mut writer = tokio::spawn(write_loop(
        ws_tx,
        send_rx,
        connection.clone(),
        options,
        stop.clone(),
    ));

    loop {
        let msg = tokio::select! {
            () = stop.cancelled() => {
                info!("server shutting down, closing session");
                break;
            }
            msg = ws_rx.next() => msg,
        };

        let msg = match msg {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                info!(error = %e, "transport error");
                break;
            }
            None => break,
        };

        match decode(&msg) {
            Inbound::Payload(data) => {
                debug!("relaying client message");
                let _ = hub.broadcast(&EventEnvelope::Message { data });
            }
            Inbound::Malformed => {
                counter!(WS_DECODE_ERRORS_TOTAL).increment(1);
                debug!("malformed client message");
                let _ = hub.send_to(&connection, &EventEnvelope::invalid_json());
            }
            Inbound::Heartbeat => connection.mark_alive(),
            Inbound::Close => {
                info!("client sent close frame");
                break;
            }
        }
    }

    // Clean up
    let _ = hub.remove(&client_id);
    stop.cancel();
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
        writer.abort();
    }
    info!(dropped = connection.drop_count(), "client disconnected");
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(connection.age().as_secs_f64());
}

/// Forward queued frames and heartbeat Pings until stopped.
///
/// On stop, flushes whatever is already queued before closing the socket.
async fn write_loop<S>(
    mut ws_tx: S,
    mut send_rx: mpsc::Receiver<Frame>,
    connection: Arc<ClientConnection>,
    options: SessionOptions,
    stop: CancellationToken,
) where
    S: Sink<Message> + Unpin,
{
    let mut ping_interval = tokio::time::interval(options.ping_interval);
    // Skip the immediate first tick
    let _ = ping_interval.tick().await;

    loop {
        tokio::select! {
            () = stop.cancelled() => break,
            frame = send_rx.recv() => {
                let Some(frame) = frame else { break };
                if ws_tx.send(Message::Text(frame)).await.is_err() {
                    stop.cancel();
                    return;
                }
            }
            _ = ping_interval.tick() => {
                if !connection.check_alive() && connection.last_pong_elapsed() > options.pong_timeout {
                    warn!("client unresponsive for {:?}, disconnecting", options.pong_timeout);
                    stop.cancel();
                    break;
                }
                if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                    stop.cancel();
                    return;
                }
            }
        }
    }

    while let Ok(frame) = send_rx.try_recv() {
        if ws_tx.send(Message::Text(frame)).await.is_err() {
            return;
        }
    }
    let _ = ws_tx.close().await;
}
