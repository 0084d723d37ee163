//! The connection hub: owner of the live connection set and broadcast fan-out.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::{counter, gauge};
use parking_lot::RwLock;
use sportz_core::{ConnectionId, EventEnvelope};
use tracing::{debug, warn};

use super::connection::{ClientConnection, encode};
use crate::metrics::{
    WS_BROADCAST_DROPS_TOTAL, WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL,
};

/// Live set of admitted WebSocket connections.
///
/// Every member is open. Registration, removal, and broadcast iteration
/// each take the lock once and never across an await point.
#[derive(Debug, Default)]
pub struct ConnectionHub {
    connections: RwLock<HashMap<ConnectionId, Arc<ClientConnection>>>,
}

impl ConnectionHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a connection and greet it.
    ///
    /// The welcome is queued before the connection joins the set, so it is
    /// always the first frame the client sees.
    pub fn register(&self, connection: Arc<ClientConnection>) {
        let _ = self.send_to(&connection, &EventEnvelope::welcome());
        let previous = self
            .connections
            .write()
            .insert(connection.id.clone(), connection.clone());
        if previous.is_none() {
            counter!(WS_CONNECTIONS_TOTAL).increment(1);
            gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);
        }
        debug!(client_id = %connection.id, "connection registered");
    }

    /// Remove and close a connection.
    ///
    /// Returns `false` if it was already gone; repeated calls are no-ops.
    pub fn remove(&self, id: &ConnectionId) -> bool {
        let removed = self.connections.write().remove(id);
        match removed {
            Some(connection) => {
                let _ = connection.close();
                counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
                gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
                debug!(client_id = %id, "connection removed");
                true
            }
            None => false,
        }
    }

    /// Send an envelope to every open connection, the sender included.
    ///
    /// Serializes once. A failed enqueue on one recipient is logged and
    /// skipped. Returns how many recipients accepted the frame.
    pub fn broadcast(&self, envelope: &EventEnvelope) -> usize {
        let frame = match encode(envelope) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(event_type = envelope.event_type(), error = %e, "failed to serialize event");
                return 0;
            }
        };

        let conns = self.connections.read();
        let mut delivered = 0;
        for conn in conns.values() {
            if conn.send(frame.clone()) {
                delivered += 1;
            } else {
                counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
                warn!(client_id = %conn.id, event_type = envelope.event_type(), "failed to send event to client");
            }
        }
        debug!(
            event_type = envelope.event_type(),
            recipients = conns.len(),
            delivered,
            "broadcast event to all"
        );
        delivered
    }

    /// Send an envelope to one connection only.
    pub fn send_to(&self, connection: &ClientConnection, envelope: &EventEnvelope) -> bool {
        match encode(envelope) {
            Ok(frame) => connection.send(frame),
            Err(e) => {
                warn!(event_type = envelope.event_type(), error = %e, "failed to serialize event");
                false
            }
        }
    }

    /// Number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.read().contains_key(id)
    }
}
