//! # sportz-store
//!
//! SQLite persistence for matches and commentary.
//!
//! [`Database`] wraps a single connection behind a mutex; repositories
//! ([`MatchRepo`], [`CommentaryRepo`]) hold a cheap clone of it and run
//! parameterized queries through [`Database::with_conn`].

#![deny(unsafe_code)]

pub mod commentary;
pub mod database;
pub mod error;
pub mod matches;
mod row_helpers;
pub mod schema;

pub use commentary::{CommentaryRepo, NewCommentary};
pub use database::Database;
pub use error::StoreError;
pub use matches::{MatchRepo, NewMatch};
