//! Provider decisions and the verdicts the gate acts on.

use serde::Deserialize;

/// Top-level answer reported by the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Conclusion {
    /// Let the caller through.
    Allow,
    /// Reject the caller.
    Deny,
    /// The provider could not decide.
    Error,
}

/// Why the provider reached its conclusion.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ReasonDetail {
    /// Reason kind, e.g. `RATE_LIMIT`, `BOT`, `SHIELD`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Optional free-form detail.
    #[serde(default)]
    pub message: Option<String>,
}

/// Raw decision body returned by a provider.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ProviderDecision {
    /// Allow, deny, or error.
    pub conclusion: Conclusion,
    /// Reason accompanying the conclusion.
    #[serde(default)]
    pub reason: Option<ReasonDetail>,
}

impl ProviderDecision {
    /// An `ALLOW` decision.
    pub fn allow() -> Self {
        Self {
            conclusion: Conclusion::Allow,
            reason: None,
        }
    }

    /// A `DENY` decision with the given reason kind.
    pub fn deny(kind: &str) -> Self {
        Self {
            conclusion: Conclusion::Deny,
            reason: Some(ReasonDetail {
                kind: kind.to_string(),
                message: None,
            }),
        }
    }
}

/// Reason attached to a deny verdict.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DenyReason {
    /// Sliding window exhausted.
    RateLimit,
    /// Classified as an automated client outside the allow-list.
    Bot,
    /// Matched a common-attack signature.
    Shield,
    /// Any other reason kind the provider reports.
    Other(String),
}

impl DenyReason {
    fn from_kind(kind: &str) -> Self {
        match kind {
            "RATE_LIMIT" => Self::RateLimit,
            "BOT" => Self::Bot,
            "SHIELD" => Self::Shield,
            other => Self::Other(other.to_string()),
        }
    }
}

/// The classification the admission gate acts on.
///
/// Produced once per attempt and never retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Proceed.
    Allow,
    /// Reject for the given reason.
    Deny(DenyReason),
    /// The provider failed, timed out, or could not decide. Fail closed.
    ProviderError(String),
}

impl Verdict {
    /// Whether this verdict is a rate-limit denial.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::Deny(DenyReason::RateLimit))
    }

    /// Metric/log label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny(DenyReason::RateLimit) => "deny_rate_limit",
            Self::Deny(_) => "deny_other",
            Self::ProviderError(_) => "provider_error",
        }
    }
}

impl From<ProviderDecision> for Verdict {
    fn from(decision: ProviderDecision) -> Self {
        match decision.conclusion {
            Conclusion::Allow => Self::Allow,
            Conclusion::Deny => {
                let kind = decision.reason.as_ref().map_or("UNKNOWN", |r| r.kind.as_str());
                Self::Deny(DenyReason::from_kind(kind))
            }
            Conclusion::Error => {
                let detail = decision
                    .reason
                    .and_then(|r| r.message)
                    .unwrap_or_else(|| "provider reported an error".to_string());
                Self::ProviderError(detail)
            }
        }
    }
}
