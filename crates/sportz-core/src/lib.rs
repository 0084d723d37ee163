//! # sportz-core
//!
//! Foundation types shared by every Sportz crate:
//!
//! - **Branded IDs**: [`ConnectionId`] for live WebSocket connections
//! - **Domain records**: [`Match`], [`MatchStatus`], [`Commentary`]
//! - **Event envelopes**: [`EventEnvelope`], the tagged `{type, data|message}` wire payload
//! - **Logging**: [`logging::init_subscriber`] for the `tracing` subscriber

#![deny(unsafe_code)]

pub mod commentary;
pub mod envelope;
pub mod ids;
pub mod logging;
pub mod matches;

pub use commentary::Commentary;
pub use envelope::EventEnvelope;
pub use ids::ConnectionId;
pub use matches::{Match, MatchStatus};
