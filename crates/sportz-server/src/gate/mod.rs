//! Admission gate: consults the decision client before any HTTP request
//! or WebSocket handshake proceeds.
//!
//! Whether gating is on is settled once at startup. With no credential
//! the gate is [`AdmissionGate::Disabled`] and every attempt is admitted
//! without a provider call. Enabled gates map the verdict to a
//! transport-specific outcome ([`http::HttpOutcome`], [`ws::WsOutcome`]).
//! In observe-only mode the outcome is logged but never applied.

pub mod http;
pub mod ws;

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{Extensions, HeaderMap, Method, Uri, header};
use metrics::counter;
use sportz_settings::ShieldSettings;
use sportz_shield::{DecisionClient, DecisionRequest, Profile, ShieldError, Verdict};
use tracing::{info, warn};

use crate::metrics::ADMISSION_DECISIONS_TOTAL;

/// The gate, resolved once at startup.
#[derive(Debug)]
pub enum AdmissionGate {
    /// No credential configured: admit everything without asking.
    Disabled,
    /// Consult the provider for every attempt.
    Enabled(DecisionClient),
}

impl AdmissionGate {
    /// Resolve from settings. A missing credential disables gating; any
    /// other construction failure is returned.
    pub fn resolve(settings: &ShieldSettings) -> Result<Self, ShieldError> {
        match DecisionClient::from_settings(settings) {
            Ok(client) => {
                info!(mode = client.mode().as_str(), "admission gating enabled");
                Ok(Self::Enabled(client))
            }
            Err(ShieldError::MissingCredential) => {
                warn!("no decision provider credential configured, admission gating disabled");
                Ok(Self::Disabled)
            }
            Err(e) => Err(e),
        }
    }

    /// Whether attempts are evaluated.
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    /// Evaluate one attempt. `None` when gating is disabled.
    ///
    /// The second element is `true` when the outcome should be enforced.
    /// Observe-only mode suppresses deny verdicts but never provider
    /// failures: an unreachable provider always fails closed.
    async fn evaluate(&self, request: &DecisionRequest, profile: Profile) -> Option<(Verdict, bool)> {
        match self {
            Self::Disabled => None,
            Self::Enabled(client) => {
                let verdict = client.evaluate(request, profile).await;
                let enforcing = client.mode().is_enforcing()
                    || matches!(verdict, Verdict::ProviderError(_));
                Some((verdict, enforcing))
            }
        }
    }
}

/// Record an outcome and decide whether to apply it.
///
/// Returns `true` when a rejection must be enforced.
fn settle(profile: Profile, outcome: &'static str, rejected: bool, enforcing: bool) -> bool {
    counter!(
        ADMISSION_DECISIONS_TOTAL,
        "transport" => profile.as_str(),
        "outcome" => outcome
    )
    .increment(1);

    if !rejected {
        return false;
    }
    if enforcing {
        warn!(transport = profile.as_str(), outcome, "admission rejected");
        true
    } else {
        info!(transport = profile.as_str(), outcome, "observe-only: would have rejected");
        false
    }
}

/// Build the provider descriptor from request parts.
///
/// The client address is the first `X-Forwarded-For` entry when present,
/// otherwise the peer address from `ConnectInfo`.
pub fn describe(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    extensions: &Extensions,
) -> DecisionRequest {
    let mut request = DecisionRequest::new(method.as_str(), uri.path());

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let peer = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    if let Some(ip) = forwarded.map(str::to_string).or(peer) {
        request = request.with_ip(ip);
    }

    if let Some(host) = headers.get(header::HOST).and_then(|v| v.to_str().ok()) {
        request = request.with_host(host);
    }
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }
    request
}
