//! WebSocket admission: evaluated after the upgrade, answered with a
//! close frame on rejection.

use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, close_code};
use sportz_shield::{DecisionRequest, Profile, Verdict};
use tracing::debug;

use super::{AdmissionGate, settle};

const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Terminal state of one handshake attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WsOutcome {
    /// Register the connection.
    Allowed,
    /// Close 1013 "Rate limit exceeded".
    RejectedRateLimit,
    /// Close 1008 "Access denied".
    RejectedOther,
    /// Close 1011 "Server security error".
    RejectedProviderError,
}

impl WsOutcome {
    /// Map a verdict to its handshake outcome.
    pub fn from_verdict(verdict: &Verdict) -> Self {
        match verdict {
            Verdict::Allow => Self::Allowed,
            Verdict::Deny(_) if verdict.is_rate_limit() => Self::RejectedRateLimit,
            Verdict::Deny(_) => Self::RejectedOther,
            Verdict::ProviderError(_) => Self::RejectedProviderError,
        }
    }

    /// Whether the connection is refused.
    pub fn is_rejected(self) -> bool {
        self != Self::Allowed
    }

    /// Close frame for a rejection.
    pub fn close_frame(self) -> Option<CloseFrame> {
        let (code, reason) = match self {
            Self::Allowed => return None,
            Self::RejectedRateLimit => (close_code::AGAIN, "Rate limit exceeded"),
            Self::RejectedOther => (close_code::POLICY, "Access denied"),
            Self::RejectedProviderError => (close_code::ERROR, "Server security error"),
        };
        Some(CloseFrame {
            code,
            reason: Utf8Bytes::from_static(reason),
        })
    }
}

impl AdmissionGate {
    /// Evaluate a handshake. Observe-only mode allows denials but not provider failures.
    pub async fn admit_ws(&self, request: &DecisionRequest) -> WsOutcome {
        let Some((verdict, enforcing)) = self.evaluate(request, Profile::Websocket).await else {
            return WsOutcome::Allowed;
        };
        let outcome = WsOutcome::from_verdict(&verdict);
        if settle(Profile::Websocket, verdict.label(), outcome.is_rejected(), enforcing) {
            outcome
        } else {
            WsOutcome::Allowed
        }
    }
}

/// Close an accepted socket with the rejection's code and reason.
pub async fn reject(mut socket: WebSocket, outcome: WsOutcome) {
    if let Some(frame) = outcome.close_frame() {
        debug!(code = frame.code, reason = frame.reason.as_str(), "closing rejected connection");
        if socket.send(Message::Close(Some(frame))).await.is_ok() {
            // Give the peer a moment to answer the close handshake
            let _ = tokio::time::timeout(CLOSE_GRACE, socket.recv()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sportz_shield::DenyReason;

    #[test]
    fn outcomes_per_verdict() {
        assert_eq!(WsOutcome::from_verdict(&Verdict::Allow), WsOutcome::Allowed);
        assert_eq!(
            WsOutcome::from_verdict(&Verdict::Deny(DenyReason::RateLimit)),
            WsOutcome::RejectedRateLimit
        );
        assert_eq!(
            WsOutcome::from_verdict(&Verdict::Deny(DenyReason::Bot)),
            WsOutcome::RejectedOther
        );
        assert_eq!(
            WsOutcome::from_verdict(&Verdict::Deny(DenyReason::Shield)),
            WsOutcome::RejectedOther
        );
        assert_eq!(
            WsOutcome::from_verdict(&Verdict::ProviderError("x".into())),
            WsOutcome::RejectedProviderError
        );
    }

    #[test]
    fn close_frames() {
        let f = WsOutcome::RejectedRateLimit.close_frame().unwrap();
        assert_eq!((f.code, f.reason.as_str()), (1013, "Rate limit exceeded"));
        let f = WsOutcome::RejectedOther.close_frame().unwrap();
        assert_eq!((f.code, f.reason.as_str()), (1008, "Access denied"));
        let f = WsOutcome::RejectedProviderError.close_frame().unwrap();
        assert_eq!((f.code, f.reason.as_str()), (1011, "Server security error"));
        assert!(WsOutcome::Allowed.close_frame().is_none());
    }
}
