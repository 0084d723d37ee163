//! HTTP admission: middleware in front of every REST route.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use sportz_shield::{Profile, Verdict};

use super::{AdmissionGate, describe, settle};

/// Terminal state of one HTTP admission attempt.
///
/// Only rate-limit denials and provider failures reject. Other deny
/// reasons pass through at this boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpOutcome {
    /// Continue to the handler.
    Allowed,
    /// `403 {"error":"Forbidden"}`.
    RejectedRateLimit,
    /// `502 {"error":"Service Unavailable"}`.
    RejectedProviderError,
}

impl HttpOutcome {
    /// Map a verdict to its HTTP outcome.
    pub fn from_verdict(verdict: &Verdict) -> Self {
        match verdict {
            Verdict::ProviderError(_) => Self::RejectedProviderError,
            v if v.is_rate_limit() => Self::RejectedRateLimit,
            _ => Self::Allowed,
        }
    }

    /// Whether the request is terminated.
    pub fn is_rejected(self) -> bool {
        self != Self::Allowed
    }

    /// The rejection response, if any.
    pub fn rejection(self) -> Option<Response> {
        match self {
            Self::Allowed => None,
            Self::RejectedRateLimit => {
                Some((StatusCode::FORBIDDEN, Json(json!({"error": "Forbidden"}))).into_response())
            }
            Self::RejectedProviderError => Some(
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({"error": "Service Unavailable"})),
                )
                    .into_response(),
            ),
        }
    }
}

impl AdmissionGate {
    /// Evaluate an HTTP request. Observe-only mode allows denials but not provider failures.
    pub async fn admit_http(&self, request: &sportz_shield::DecisionRequest) -> HttpOutcome {
        let Some((verdict, enforcing)) = self.evaluate(request, Profile::Http).await else {
            return HttpOutcome::Allowed;
        };
        let outcome = HttpOutcome::from_verdict(&verdict);
        if settle(Profile::Http, verdict.label(), outcome.is_rejected(), enforcing) {
            outcome
        } else {
            HttpOutcome::Allowed
        }
    }
}

/// `axum::middleware::from_fn_with_state` entry point.
pub async fn http_gate(
    State(gate): State<Arc<AdmissionGate>>,
    request: Request,
    next: Next,
) -> Response {
    if !gate.is_enabled() {
        return next.run(request).await;
    }
    let descriptor = describe(
        request.method(),
        request.uri(),
        request.headers(),
        request.extensions(),
    );
    match gate.admit_http(&descriptor).await.rejection() {
        Some(response) => response,
        None => next.run(request).await,
    }
}
