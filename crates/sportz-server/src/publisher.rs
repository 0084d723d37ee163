//! The narrow interface REST handlers use to announce domain events.

use std::sync::Arc;

use metrics::counter;
use sportz_core::{Commentary, EventEnvelope, Match};
use tracing::debug;

use crate::metrics::HTTP_EVENTS_PUBLISHED_TOTAL;
use crate::websocket::hub::ConnectionHub;

/// Turns domain records into envelopes and hands them to the hub.
///
/// Announcing never fails the caller; an empty hub is a normal state.
#[derive(Clone, Debug)]
pub struct EventPublisher {
    hub: Arc<ConnectionHub>,
}

impl EventPublisher {
    /// Publish through `hub`.
    pub fn new(hub: Arc<ConnectionHub>) -> Self {
        Self { hub }
    }

    /// Broadcast `match_created`. Returns the number of recipients.
    pub fn announce_match_created(&self, record: &Match) -> usize {
        self.publish(&EventEnvelope::MatchCreated {
            data: record.clone(),
        })
    }

    /// Broadcast `match_updated`. Returns the number of recipients.
    pub fn announce_match_updated(&self, record: &Match) -> usize {
        self.publish(&EventEnvelope::MatchUpdated {
            data: record.clone(),
        })
    }

    /// Broadcast `commentary_added`. Returns the number of recipients.
    pub fn announce_commentary_added(&self, entry: &Commentary) -> usize {
        self.publish(&EventEnvelope::CommentaryAdded { data: entry.clone() })
    }

    fn publish(&self, envelope: &EventEnvelope) -> usize {
        let event_type = envelope.event_type();
        let delivered = self.hub.broadcast(envelope);
        counter!(HTTP_EVENTS_PUBLISHED_TOTAL, "type" => event_type).increment(1);
        debug!(event_type, delivered, "event published");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::Value;
    use sportz_core::{ConnectionId, MatchStatus};

    use crate::websocket::connection::Frame;
    use tokio::sync::mpsc;

    use crate::websocket::connection::ClientConnection;

    fn sample_match() -> Match {
        let now = Utc::now();
        Match {
            id: 11,
            sport: "cricket".into(),
            home_team: "North".into(),
            away_team: "South".into(),
            status: MatchStatus::Live,
            start_time: now,
            end_time: now,
            home_score: 120,
            away_score: 98,
            created_at: now,
        }
    }

    fn listener(hub: &ConnectionHub) -> mpsc::Receiver<Frame> {
        let (tx, mut rx) = mpsc::channel(8);
        hub.register(Arc::new(ClientConnection::new(ConnectionId::new(), tx)));
        let _welcome = rx.try_recv().unwrap();
        rx
    }

    #[test]
    fn announce_with_no_connections_is_ok() {
        let publisher = EventPublisher::new(Arc::new(ConnectionHub::new()));
        assert_eq!(publisher.announce_match_created(&sample_match()), 0);
    }

    #[test]
    fn match_events_carry_the_record() {
        let hub = Arc::new(ConnectionHub::new());
        let mut rx = listener(&hub);
        let publisher = EventPublisher::new(hub);

        assert_eq!(publisher.announce_match_created(&sample_match()), 1);
        assert_eq!(publisher.announce_match_updated(&sample_match()), 1);

        let created: Value = serde_json::from_str(rx.try_recv().unwrap().as_str()).unwrap();
        let updated: Value = serde_json::from_str(rx.try_recv().unwrap().as_str()).unwrap();
        assert_eq!(created["type"], "match_created");
        assert_eq!(created["data"]["id"], 11);
        assert_eq!(updated["type"], "match_updated");
        assert_eq!(updated["data"]["homeScore"], 120);
    }

    #[test]
    fn commentary_event() {
        let hub = Arc::new(ConnectionHub::new());
        let mut rx = listener(&hub);
        let entry = Commentary {
            id: 1,
            match_id: 11,
            minute: 33,
            sequence: None,
            period: "2nd innings".into(),
            event_type: "wicket".into(),
            actor: None,
            team: Some("South".into()),
            message: "Bowled him!".into(),
            metadata: None,
            tags: None,
            created_at: Utc::now(),
        };
        let _ = EventPublisher::new(hub).announce_commentary_added(&entry);
        let v: Value = serde_json::from_str(rx.try_recv().unwrap().as_str()).unwrap();
        assert_eq!(v["type"], "commentary_added");
        assert_eq!(v["data"]["message"], "Bowled him!");
    }
}
