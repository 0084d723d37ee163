//! Deterministic providers for exercising every verdict branch without
//! network calls.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::{Result, ShieldError};
use crate::profile::{Profile, RuleSet};
use crate::provider::DecisionProvider;
use crate::request::DecisionRequest;
use crate::verdict::ProviderDecision;

/// Always returns the same decision and records which profiles asked.
#[derive(Debug)]
pub struct FixedProvider {
    decision: ProviderDecision,
    seen: Mutex<Vec<Profile>>,
}

impl FixedProvider {
    /// Always answer `decision`.
    pub fn new(decision: ProviderDecision) -> Self {
        Self {
            decision,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Always allow.
    pub fn allow() -> Self {
        Self::new(ProviderDecision::allow())
    }

    /// Always deny with `RATE_LIMIT`.
    pub fn rate_limited() -> Self {
        Self::new(ProviderDecision::deny("RATE_LIMIT"))
    }

    /// Always deny with `BOT`.
    pub fn bot() -> Self {
        Self::new(ProviderDecision::deny("BOT"))
    }

    /// Profiles evaluated so far, in call order.
    pub fn seen_profiles(&self) -> Vec<Profile> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl DecisionProvider for FixedProvider {
    async fn decide(&self, _request: &DecisionRequest, rules: &RuleSet) -> Result<ProviderDecision> {
        self.seen.lock().push(rules.profile);
        Ok(self.decision.clone())
    }
}

/// Always fails as if the provider were unreachable.
#[derive(Debug, Default)]
pub struct FailingProvider;

#[async_trait]
impl DecisionProvider for FailingProvider {
    async fn decide(&self, _request: &DecisionRequest, _rules: &RuleSet) -> Result<ProviderDecision> {
        Err(ShieldError::Status {
            status: 500,
            body: "provider unavailable".into(),
        })
    }
}

/// Allows, but only after `delay`.
#[derive(Debug)]
pub struct SlowProvider {
    delay: Duration,
}

impl SlowProvider {
    /// Wait `delay` before answering.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl DecisionProvider for SlowProvider {
    async fn decide(&self, _request: &DecisionRequest, _rules: &RuleSet) -> Result<ProviderDecision> {
        tokio::time::sleep(self.delay).await;
        Ok(ProviderDecision::allow())
    }
}
