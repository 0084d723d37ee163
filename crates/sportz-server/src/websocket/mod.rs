//! WebSocket connection hub, per-connection sessions, and inbound decoding.

pub mod connection;
pub mod decode;
pub mod handler;
pub mod hub;
pub mod session;
