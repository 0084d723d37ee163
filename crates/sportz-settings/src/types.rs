//! Settings types.
//!
//! Every struct uses `#[serde(default)]` so a settings file only needs to
//! name the fields it changes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SportzSettings {
    /// Network and connection settings.
    pub server: ServerSettings,
    /// Admission gate / decision provider settings.
    pub shield: ShieldSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Server network and runtime settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listen port (`0` auto-assigns).
    pub port: u16,
    /// Maximum inbound WebSocket message size in bytes.
    pub max_message_size: usize,
    /// Per-connection outbound queue capacity.
    pub send_queue_capacity: usize,
    /// Interval between server-initiated Ping frames.
    pub ping_interval_secs: u64,
    /// SQLite database path. `None` resolves to `~/.sportz/sportz.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_message_size: 1024 * 1024,
            send_queue_capacity: 256,
            ping_interval_secs: 30,
            db_path: None,
        }
    }
}

/// Whether the gate acts on deny verdicts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShieldMode {
    /// Deny verdicts terminate the request or connection.
    #[default]
    Live,
    /// Verdicts are computed and logged but never acted on.
    DryRun,
}

impl ShieldMode {
    /// `DRY_RUN` selects observe-only; any other value enforces.
    pub fn parse(s: &str) -> Self {
        if s == "DRY_RUN" { Self::DryRun } else { Self::Live }
    }

    /// Wire representation forwarded to the provider.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "LIVE",
            Self::DryRun => "DRY_RUN",
        }
    }

    /// Whether deny verdicts are acted on.
    pub fn is_enforcing(self) -> bool {
        self == Self::Live
    }
}

/// A sliding rate window: at most `max` requests per `interval_secs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateWindow {
    /// Window length in seconds.
    pub interval_secs: u32,
    /// Requests allowed per window.
    pub max: u32,
}

/// Decision provider and gate settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShieldSettings {
    /// Provider credential. Absent disables gating entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Enforce or observe-only.
    pub mode: ShieldMode,
    /// Provider base URL.
    pub endpoint: String,
    /// Per-call deadline for the provider.
    pub timeout_ms: u64,
    /// Bot categories that are let through.
    pub bot_allow: Vec<String>,
    /// Rate window applied to HTTP requests.
    pub http_window: RateWindow,
    /// Rate window applied to WebSocket handshakes.
    pub ws_window: RateWindow,
}

impl Default for ShieldSettings {
    fn default() -> Self {
        Self {
            key: None,
            mode: ShieldMode::Live,
            endpoint: "https://decide.sportz.dev".to_string(),
            timeout_ms: 2_000,
            bot_allow: vec![
                "CATEGORY:SEARCH_ENGINE".to_string(),
                "CATEGORY:PREVIEW".to_string(),
            ],
            http_window: RateWindow {
                interval_secs: 10,
                max: 50,
            },
            ws_window: RateWindow {
                interval_secs: 2,
                max: 5,
            },
        }
    }
}

impl fmt::Debug for ShieldSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShieldSettings")
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("mode", &self.mode)
            .field("endpoint", &self.endpoint)
            .field("timeout_ms", &self.timeout_ms)
            .field("bot_allow", &self.bot_allow)
            .field("http_window", &self.http_window)
            .field("ws_window", &self.ws_window)
            .finish()
    }
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive (overridden by `RUST_LOG`).
    pub level: String,
    /// `"compact"` or `"json"`.
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}
