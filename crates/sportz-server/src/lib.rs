//! # sportz-server
//!
//! Axum HTTP + WebSocket server for live match updates.
//!
//! - [`gate`]: admission gate in front of every HTTP request and WebSocket handshake
//! - [`websocket`]: connection hub, per-connection sessions, inbound decoding
//! - [`publisher`]: the narrow interface REST handlers use to announce domain events
//! - [`api`]: REST routes for matches and commentary
//! - [`server`]: router assembly and listener

#![deny(unsafe_code)]

pub mod api;
pub mod config;
pub mod gate;
pub mod health;
pub mod metrics;
pub mod publisher;
pub mod server;
pub mod shutdown;
pub mod websocket;
