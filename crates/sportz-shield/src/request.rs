//! The caller descriptor handed to the provider.

use std::collections::BTreeMap;

use serde::Serialize;

/// Immutable description of one admission attempt.
///
/// Built once per request or handshake by the gate; the provider only
/// ever borrows it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DecisionRequest {
    /// Client address, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// HTTP method (`GET` for WebSocket handshakes).
    pub method: String,
    /// Request path without query.
    pub path: String,
    /// `Host` header value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Lower-cased header names to values. Credentials are never included.
    pub headers: BTreeMap<String, String>,
}

/// Headers never forwarded to the provider.
const REDACTED_HEADERS: &[&str] = &["authorization", "cookie", "proxy-authorization"];

impl DecisionRequest {
    /// Start a descriptor for `method path`.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set the client address.
    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Set the `Host` value.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Add a header. Credential-bearing headers are dropped.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        if !REDACTED_HEADERS.contains(&name.as_str()) {
            let _ = self.headers.insert(name, value.into());
        }
        self
    }
}
