//! REST routes for matches and commentary.
//!
//! All of these sit behind the HTTP admission gate.

pub mod commentary;
pub mod error;
pub mod matches;
pub mod validation;

use axum::Json;
use axum::Router;
use axum::routing::{get, patch};
use serde_json::{Value, json};

use crate::server::AppState;

pub use error::ApiError;

/// Root greeting.
pub async fn root() -> Json<Value> {
    Json(json!({"message": "Welcome to the Sportz Server!"}))
}

/// Gated REST routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/matches", get(matches::list_matches).post(matches::create_match))
        .route("/matches/{id}/score", patch(matches::update_score))
        .route(
            "/matches/{id}/commentary",
            get(commentary::list_commentary).post(commentary::create_commentary),
        )
}
