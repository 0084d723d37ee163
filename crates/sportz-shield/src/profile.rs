//! Per-transport rule profiles.
//!
//! Both profiles run shield and bot detection. They differ only in the
//! sliding window: HTTP defaults to 50 requests per 10 s, WebSocket
//! handshakes to 5 per 2 s. Windows are keyed by caller identity as the
//! provider resolves it.

use serde::Serialize;
use sportz_settings::{RateWindow, ShieldMode, ShieldSettings};

/// Which transport an admission attempt arrived on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Plain HTTP request.
    Http,
    /// WebSocket handshake on `/ws`.
    Websocket,
}

impl Profile {
    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Websocket => "websocket",
        }
    }
}

/// One rule forwarded to the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    /// Common-attack protection.
    Shield {
        /// `LIVE` or `DRY_RUN`.
        mode: ShieldMode,
    },
    /// Automated-client detection.
    DetectBot {
        /// `LIVE` or `DRY_RUN`.
        mode: ShieldMode,
        /// Bot categories let through.
        allow: Vec<String>,
    },
    /// Sliding-window rate limit.
    #[serde(rename_all = "camelCase")]
    SlidingWindow {
        /// `LIVE` or `DRY_RUN`.
        mode: ShieldMode,
        /// Window length in seconds.
        interval_secs: u32,
        /// Requests allowed per window.
        max: u32,
    },
}

/// The rules evaluated for one profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    /// Transport this set applies to.
    pub profile: Profile,
    /// Rules in evaluation order.
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Build the rule set for `profile` from settings.
    pub fn for_profile(profile: Profile, settings: &ShieldSettings) -> Self {
        let window = match profile {
            Profile::Http => settings.http_window,
            Profile::Websocket => settings.ws_window,
        };
        Self::build(profile, settings.mode, &settings.bot_allow, window)
    }

    fn build(profile: Profile, mode: ShieldMode, allow: &[String], window: RateWindow) -> Self {
        Self {
            profile,
            rules: vec![
                Rule::Shield { mode },
                Rule::DetectBot {
                    mode,
                    allow: allow.to_vec(),
                },
                Rule::SlidingWindow {
                    mode,
                    interval_secs: window.interval_secs,
                    max: window.max,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn http_profile_uses_http_window() {
        let set = RuleSet::for_profile(Profile::Http, &ShieldSettings::default());
        assert_eq!(set.rules.len(), 3);
        assert_eq!(
            set.rules[2],
            Rule::SlidingWindow {
                mode: ShieldMode::Live,
                interval_secs: 10,
                max: 50
            }
        );
    }

    #[test]
    fn websocket_profile_uses_ws_window() {
        let set = RuleSet::for_profile(Profile::Websocket, &ShieldSettings::default());
        assert_eq!(
            set.rules[2],
            Rule::SlidingWindow {
                mode: ShieldMode::Live,
                interval_secs: 2,
                max: 5
            }
        );
    }

    #[test]
    fn mode_is_forwarded_to_every_rule() {
        let settings = ShieldSettings {
            mode: ShieldMode::DryRun,
            ..ShieldSettings::default()
        };
        let v = serde_json::to_value(RuleSet::for_profile(Profile::Http, &settings)).unwrap();
        for rule in v["rules"].as_array().unwrap() {
            assert_eq!(rule["mode"], "DRY_RUN");
        }
    }

    #[test]
    fn wire_shape() {
        let v = serde_json::to_value(RuleSet::for_profile(
            Profile::Websocket,
            &ShieldSettings::default(),
        ))
        .unwrap();
        assert_eq!(v["profile"], "websocket");
        assert_eq!(v["rules"][0], json!({"type": "shield", "mode": "LIVE"}));
        assert_eq!(v["rules"][1]["type"], "detect_bot");
        assert_eq!(v["rules"][1]["allow"][0], "CATEGORY:SEARCH_ENGINE");
        assert_eq!(
            v["rules"][2],
            json!({"type": "sliding_window", "mode": "LIVE", "intervalSecs": 2, "max": 5})
        );
    }
}
