//! Shutdown: cancel every session, then wait for the hub to empty and the
//! listener to stop.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::websocket::hub::ConnectionHub;

/// Default timeout for graceful shutdown before giving up on tasks.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// How often the hub is polled while draining.
const DRAIN_POLL: Duration = Duration::from_millis(20);

/// Owns the root cancellation token. Sessions and the listener hang child
/// tokens off it.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// The root token. Cancelled exactly when shutdown starts.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// A token for one WebSocket session. Cancelling it leaves the root and
    /// every other session alone.
    pub fn session_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Initiate shutdown.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether a shutdown has been initiated.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel everything, then wait up to `timeout` for `hub` to empty and
    /// `handles` to finish. Returns `true` if both happened in time.
    pub async fn graceful_shutdown(
        &self,
        hub: &ConnectionHub,
        handles: Vec<JoinHandle<()>>,
        timeout: Option<Duration>,
    ) -> bool {
        let timeout = timeout.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT);

        self.shutdown();
        info!(
            connections = hub.connection_count(),
            task_count = handles.len(),
            timeout_secs = timeout.as_secs(),
            "draining sessions"
        );

        let drain = async {
            while hub.connection_count() > 0 {
                tokio::time::sleep(DRAIN_POLL).await;
            }
            let _ = futures::future::join_all(handles).await;
        };

        if tokio::time::timeout(timeout, drain).await.is_ok() {
            info!("shutdown drained cleanly");
            true
        } else {
            warn!(
                remaining = hub.connection_count(),
                "shutdown timed out after {timeout:?}"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sportz_core::ConnectionId;
    use tokio::sync::mpsc;

    use crate::websocket::connection::{ClientConnection, Frame};

    fn register(hub: &ConnectionHub) -> (ConnectionId, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(8);
        let id = ConnectionId::new();
        hub.register(Arc::new(ClientConnection::new(id.clone(), tx)));
        (id, rx)
    }

    #[test]
    fn initial_state_not_shutting_down() {
        assert!(!ShutdownCoordinator::new().is_shutting_down());
    }

    #[test]
    fn session_tokens_follow_root_only() {
        let coord = ShutdownCoordinator::new();
        let a = coord.session_token();
        let b = coord.session_token();

        a.cancel();
        assert!(!b.is_cancelled());
        assert!(!coord.is_shutting_down());

        coord.shutdown();
        assert!(b.is_cancelled());
        assert!(coord.token().is_cancelled());
    }

    #[tokio::test]
    async fn waits_for_sessions_to_leave() {
        let coord = ShutdownCoordinator::new();
        let hub = Arc::new(ConnectionHub::new());
        let (id, _rx) = register(&hub);

        let token = coord.session_token();
        let session_hub = hub.clone();
        let session = tokio::spawn(async move {
            token.cancelled().await;
            let _ = session_hub.remove(&id);
        });

        assert!(coord.graceful_shutdown(&hub, vec![session], Some(Duration::from_secs(1))).await);
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_on_stuck_session() {
        let coord = ShutdownCoordinator::new();
        let hub = ConnectionHub::new();
        let (_id, _rx) = register(&hub);

        let drained = coord
            .graceful_shutdown(&hub, Vec::new(), Some(Duration::from_millis(50)))
            .await;
        assert!(!drained);
        assert!(coord.is_shutting_down());
    }
}
