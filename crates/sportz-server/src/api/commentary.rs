//! `/matches/{id}/commentary` routes.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::{Value, json};
use sportz_core::Commentary;
use sportz_store::StoreError;
use tracing::{error, instrument};

use super::error::ApiError;
use super::matches::{LimitQuery, rejection_issue};
use super::validation::{self, MAX_LIMIT};
use crate::server::AppState;

/// `GET /matches/{id}/commentary`
#[instrument(skip_all, fields(match_id = %id))]
pub async fn list_commentary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<Vec<Commentary>>, ApiError> {
    let id = validation::parse_match_id(&id)
        .map_err(|details| ApiError::bad_request("Invalid match ID.", details))?;
    let Query(query) = query.map_err(|e| {
        ApiError::bad_request("Invalid query parameters.", rejection_issue(e.body_text()))
    })?;
    let limit = validation::parse_limit(query.limit.as_deref())
        .map_err(|details| ApiError::bad_request("Invalid query parameters.", details))?
        .unwrap_or(MAX_LIMIT);

    state.commentary.list_for_match(id, limit).map(Json).map_err(|e| {
        error!(error = %e, "list commentary failed");
        ApiError::Internal("Failed to fetch commentary")
    })
}

/// `POST /matches/{id}/commentary`
#[instrument(skip_all, fields(match_id = %id))]
pub async fn create_commentary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let id = validation::parse_match_id(&id)
        .map_err(|details| ApiError::bad_request("Invalid match ID.", details))?;
    let Json(body) =
        body.map_err(|e| ApiError::bad_request("Invalid payload", rejection_issue(e.body_text())))?;
    let new = validation::create_commentary(&body)
        .map_err(|details| ApiError::bad_request("Invalid payload", details))?;

    let entry = match state.commentary.create(id, &new) {
        Ok(c) => c,
        Err(StoreError::NotFound(_)) => return Err(ApiError::NotFound("Match not found")),
        Err(e) => {
            error!(error = %e, "create commentary failed");
            return Err(ApiError::Internal("Failed to create commentary."));
        }
    };
    let _ = state.publisher.announce_commentary_added(&entry);
    Ok((StatusCode::CREATED, Json(json!({ "data": entry }))))
}
