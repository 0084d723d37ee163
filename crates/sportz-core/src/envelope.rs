//! Event envelopes pushed to WebSocket clients.
//!
//! Every outbound message is a JSON object tagged by `type`:
//!
//! | type               | body field | sent to            |
//! |--------------------|------------|--------------------|
//! | `welcome`          | `message`  | the new connection |
//! | `message`          | `data`     | everyone           |
//! | `error`            | `message`  | the sender         |
//! | `match_created`    | `data`     | everyone           |
//! | `match_updated`    | `data`     | everyone           |
//! | `commentary_added` | `data`     | everyone           |
//!
//! The hub serializes an envelope once per broadcast and shares the
//! resulting buffer with every recipient.

use serde::{Deserialize, Serialize};

use crate::commentary::Commentary;
use crate::matches::Match;

/// Greeting sent to a newly registered connection.
pub const WELCOME_MESSAGE: &str = "Connected to Sportz server";

/// Error text for an inbound frame that is not valid JSON.
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON";

/// Tagged payload describing one broadcastable occurrence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    /// Greeting for a freshly admitted connection.
    Welcome {
        /// Greeting text.
        message: String,
    },
    /// Relay of a client-originated JSON payload.
    Message {
        /// The decoded inbound payload.
        data: serde_json::Value,
    },
    /// Local failure report for the originating connection.
    Error {
        /// Failure description.
        message: String,
    },
    /// A match was created.
    MatchCreated {
        /// The new record.
        data: Match,
    },
    /// A match changed (score or status).
    MatchUpdated {
        /// The updated record.
        data: Match,
    },
    /// A commentary line was added.
    CommentaryAdded {
        /// The new entry.
        data: Commentary,
    },
}

impl EventEnvelope {
    /// The standard greeting.
    pub fn welcome() -> Self {
        Self::Welcome {
            message: WELCOME_MESSAGE.to_string(),
        }
    }

    /// The standard decode-failure report.
    pub fn invalid_json() -> Self {
        Self::Error {
            message: INVALID_JSON_MESSAGE.to_string(),
        }
    }

    /// Wire value of the `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::Message { .. } => "message",
            Self::Error { .. } => "error",
            Self::MatchCreated { .. } => "match_created",
            Self::MatchUpdated { .. } => "match_updated",
            Self::CommentaryAdded { .. } => "commentary_added",
        }
    }

    /// Serialize to the wire JSON text.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
