//! # sportz-shield
//!
//! The decision client consulted by the admission gate before any HTTP
//! request or WebSocket handshake proceeds.
//!
//! - [`DecisionRequest`]: immutable descriptor of the caller (ip, method, path, headers)
//! - [`Profile`] / [`RuleSet`]: per-transport rule sets (shield, bot detection, sliding window)
//! - [`DecisionProvider`]: the black-box verdict source; [`HttpDecisionProvider`] talks to
//!   the hosted service, [`testing`] holds deterministic fakes
//! - [`DecisionClient`]: applies the deadline and collapses every failure into
//!   [`Verdict::ProviderError`]
//!
//! A client cannot be constructed without a credential. Callers treat that
//! construction failure as "gating disabled".

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod profile;
pub mod provider;
pub mod request;
pub mod testing;
pub mod verdict;

pub use client::DecisionClient;
pub use errors::{Result, ShieldError};
pub use profile::{Profile, Rule, RuleSet};
pub use provider::{DecisionProvider, HttpDecisionProvider};
pub use request::DecisionRequest;
pub use verdict::{Conclusion, DenyReason, ProviderDecision, ReasonDetail, Verdict};
