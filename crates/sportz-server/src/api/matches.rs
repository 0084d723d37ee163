//! `/matches` routes.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use sportz_core::Match;
use sportz_store::StoreError;
use tracing::{error, instrument};

use super::error::ApiError;
use super::validation::{self, Issue};
use crate::server::AppState;

/// Default page size for `GET /matches`.
pub const DEFAULT_MATCH_LIMIT: u32 = 50;

/// `?limit=` query string.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    /// Raw value, validated by hand for precise error details.
    pub limit: Option<String>,
}

pub(super) fn rejection_issue(text: String) -> Vec<Issue> {
    vec![Issue::new("", text)]
}

/// `GET /matches`
#[instrument(skip_all)]
pub async fn list_matches(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<Vec<Match>>, ApiError> {
    let Query(query) =
        query.map_err(|e| ApiError::bad_request("Invalid query.", rejection_issue(e.body_text())))?;
    let limit = validation::parse_limit(query.limit.as_deref())
        .map_err(|details| ApiError::bad_request("Invalid query.", details))?
        .unwrap_or(DEFAULT_MATCH_LIMIT);

    state.matches.list(limit).map(Json).map_err(|e| {
        error!(error = %e, "list matches failed");
        ApiError::Internal("Failed to list matches")
    })
}

/// `POST /matches`
#[instrument(skip_all)]
pub async fn create_match(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) =
        body.map_err(|e| ApiError::bad_request("Invalid payload", rejection_issue(e.body_text())))?;
    let new = validation::create_match(&body)
        .map_err(|details| ApiError::bad_request("Invalid payload", details))?;

    let created = state.matches.create(&new).map_err(|e| {
        error!(error = %e, "create match failed");
        ApiError::Internal("Failed to create match.")
    })?;
    let _ = state.publisher.announce_match_created(&created);
    Ok((StatusCode::CREATED, Json(json!({ "data": created }))))
}

/// `PATCH /matches/{id}/score`
#[instrument(skip_all, fields(match_id = %id))]
pub async fn update_score(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = validation::parse_match_id(&id)
        .map_err(|details| ApiError::bad_request("Invalid match ID.", details))?;
    let Json(body) =
        body.map_err(|e| ApiError::bad_request("Invalid payload", rejection_issue(e.body_text())))?;
    let (home, away) = validation::update_score(&body)
        .map_err(|details| ApiError::bad_request("Invalid payload", details))?;

    let updated = match state.matches.update_score(id, home, away) {
        Ok(m) => m,
        Err(StoreError::NotFound(_)) => return Err(ApiError::NotFound("Match not found")),
        Err(e) => {
            error!(error = %e, "update score failed");
            return Err(ApiError::Internal("Failed to update score."));
        }
    };
    let _ = state.publisher.announce_match_updated(&updated);
    Ok(Json(json!({ "data": updated })))
}
