//! `GET /ws`: upgrade, admission, then hand-off to a session.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Request, State};
use axum::response::Response;
use sportz_core::ConnectionId;
use tracing::info;

use super::session::{SessionOptions, run_ws_session};
use crate::gate::describe;
use crate::gate::ws::reject;
use crate::server::AppState;

/// Accept the upgrade, then admit or reject inside the upgraded task.
///
/// Frames larger than the configured maximum are refused by the transport
/// before they reach the hub.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    request: Request,
) -> Response {
    let descriptor = describe(
        request.method(),
        request.uri(),
        request.headers(),
        request.extensions(),
    );
    let max = state.config.max_message_size;

    ws.max_message_size(max)
        .max_frame_size(max)
        .on_upgrade(move |socket| async move {
            let outcome = state.gate.admit_ws(&descriptor).await;
            if outcome.is_rejected() {
                info!(outcome = ?outcome, "websocket connection refused");
                reject(socket, outcome).await;
                return;
            }
            run_ws_session(
                socket,
                ConnectionId::new(),
                state.hub.clone(),
                SessionOptions::from(state.config.as_ref()),
                state.shutdown.session_token(),
            )
            .await;
        })
}
