//! Decision providers.
//!
//! [`DecisionProvider`] is the seam the gate depends on. The hosted
//! service is reached through [`HttpDecisionProvider`]; tests inject the
//! fakes in [`crate::testing`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::debug;

use crate::errors::{Result, ShieldError};
use crate::profile::{Profile, Rule, RuleSet};
use crate::request::DecisionRequest;
use crate::verdict::ProviderDecision;

/// Source of admit/deny decisions.
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    /// Classify `request` under `rules`.
    async fn decide(&self, request: &DecisionRequest, rules: &RuleSet)
    -> Result<ProviderDecision>;
}

#[derive(Serialize)]
struct DecideBody<'a> {
    profile: Profile,
    rules: &'a [Rule],
    request: &'a DecisionRequest,
}

/// Provider backed by the hosted decision API (`POST {endpoint}/v1/decide`).
#[derive(Debug)]
pub struct HttpDecisionProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpDecisionProvider {
    /// Build a provider for `endpoint` authenticating with `key`.
    pub fn new(endpoint: &str, key: &str, timeout: Duration) -> Result<Self> {
        if key.is_empty() {
            return Err(ShieldError::MissingCredential);
        }
        let client = reqwest::Client::builder()
            .default_headers(Self::build_headers(key)?)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/v1/decide", endpoint.trim_end_matches('/')),
        })
    }

    fn build_headers(key: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| ShieldError::InvalidCredential(e.to_string()))?;
        auth.set_sensitive(true);
        let _ = headers.insert(AUTHORIZATION, auth);
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl DecisionProvider for HttpDecisionProvider {
    async fn decide(
        &self,
        request: &DecisionRequest,
        rules: &RuleSet,
    ) -> Result<ProviderDecision> {
        let body = DecideBody {
            profile: rules.profile,
            rules: &rules.rules,
            request,
        };

        let response = self.client.post(&self.url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShieldError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let decision: ProviderDecision =
            serde_json::from_str(&text).map_err(|e| ShieldError::Decode(e.to_string()))?;
        debug!(
            profile = rules.profile.as_str(),
            conclusion = ?decision.conclusion,
            "decision received"
        );
        Ok(decision)
    }
}
