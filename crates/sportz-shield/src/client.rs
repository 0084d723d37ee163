//! The decision client: one configured rule set per transport, a bounded
//! deadline, and fail-closed error mapping.

use std::sync::Arc;
use std::time::Duration;

use sportz_settings::{ShieldMode, ShieldSettings};
use tracing::{debug, warn};

use crate::errors::{Result, ShieldError};
use crate::profile::{Profile, RuleSet};
use crate::provider::{DecisionProvider, HttpDecisionProvider};
use crate::request::DecisionRequest;
use crate::verdict::Verdict;

/// Evaluates admission attempts against the provider.
///
/// Exists only when a credential is configured. [`DecisionClient::from_settings`]
/// fails otherwise, which is how callers learn that gating is disabled.
#[derive(Clone)]
pub struct DecisionClient {
    provider: Arc<dyn DecisionProvider>,
    http_rules: RuleSet,
    ws_rules: RuleSet,
    timeout: Duration,
    mode: ShieldMode,
}

impl std::fmt::Debug for DecisionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionClient")
            .field("timeout", &self.timeout)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl DecisionClient {
    /// Build a client talking to the hosted provider.
    pub fn from_settings(settings: &ShieldSettings) -> Result<Self> {
        let key = settings
            .key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ShieldError::MissingCredential)?;
        let timeout = Duration::from_millis(settings.timeout_ms);
        let provider = HttpDecisionProvider::new(&settings.endpoint, key, timeout)?;
        Ok(Self::with_provider(Arc::new(provider), settings))
    }

    /// Build a client around an arbitrary provider.
    pub fn with_provider(provider: Arc<dyn DecisionProvider>, settings: &ShieldSettings) -> Self {
        Self {
            provider,
            http_rules: RuleSet::for_profile(Profile::Http, settings),
            ws_rules: RuleSet::for_profile(Profile::Websocket, settings),
            timeout: Duration::from_millis(settings.timeout_ms),
            mode: settings.mode,
        }
    }

    /// Enforce or observe-only.
    pub fn mode(&self) -> ShieldMode {
        self.mode
    }

    /// Rule set applied to `profile`.
    pub fn rules(&self, profile: Profile) -> &RuleSet {
        match profile {
            Profile::Http => &self.http_rules,
            Profile::Websocket => &self.ws_rules,
        }
    }

    /// Classify one admission attempt.
    ///
    /// Provider failures and timeouts become [`Verdict::ProviderError`];
    /// they are never treated as allow.
    pub async fn evaluate(&self, request: &DecisionRequest, profile: Profile) -> Verdict {
        let rules = self.rules(profile);
        let outcome = tokio::time::timeout(self.timeout, self.provider.decide(request, rules))
            .await
            .unwrap_or_else(|_| Err(ShieldError::Timeout(self.timeout)));

        match outcome {
            Ok(decision) => {
                let verdict = Verdict::from(decision);
                debug!(
                    profile = profile.as_str(),
                    path = %request.path,
                    verdict = verdict.label(),
                    "admission evaluated"
                );
                verdict
            }
            Err(e) => {
                warn!(
                    profile = profile.as_str(),
                    path = %request.path,
                    error = %e,
                    "decision provider failed"
                );
                Verdict::ProviderError(e.to_string())
            }
        }
    }
}
