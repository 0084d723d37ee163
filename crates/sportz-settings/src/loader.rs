//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`SportzSettings::default()`]
//! 2. If `~/.sportz/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `SPORTZ_*` environment overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{ShieldMode, SportzSettings};

/// Resolve the Sportz home directory (`~/.sportz`).
pub fn sportz_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".sportz")
}

/// Resolve the path to the settings file (`~/.sportz/settings.json`).
pub fn settings_path() -> PathBuf {
    sportz_home().join("settings.json")
}

/// Default database location when `server.dbPath` is unset.
pub fn default_db_path() -> PathBuf {
    sportz_home().join("sportz.db")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<SportzSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. A file with invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<SportzSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults merged with the settings file, without env overrides.
pub fn load_file_layer(path: &Path) -> Result<SportzSettings> {
    let defaults = serde_json::to_value(SportzSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Integers must parse and fall within range. Invalid values are logged
/// and ignored, leaving the file/default value in place.
pub fn apply_env_overrides(settings: &mut SportzSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup` instead of the process environment.
pub fn apply_overrides_from<F>(settings: &mut SportzSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = env.string("SPORTZ_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env.u16("SPORTZ_PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = env.string("SPORTZ_DB_PATH") {
        settings.server.db_path = Some(v);
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string("SPORTZ_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.string("SPORTZ_LOG_FORMAT") {
        settings.logging.format = v;
    }

    // ── Shield ──────────────────────────────────────────────────────
    if let Some(v) = env.string("SPORTZ_SHIELD_KEY") {
        settings.shield.key = Some(v);
    }
    if let Some(v) = env.raw("SPORTZ_SHIELD_MODE") {
        settings.shield.mode = parse_shield_mode(&v);
    }
    if let Some(v) = env.string("SPORTZ_SHIELD_ENDPOINT") {
        settings.shield.endpoint = v;
    }
    if let Some(v) = env.u64("SPORTZ_SHIELD_TIMEOUT_MS", 50, 60_000) {
        settings.shield.timeout_ms = v;
    }
    if let Some(v) = env.u32("SPORTZ_HTTP_WINDOW_MAX", 1, 100_000) {
        settings.shield.http_window.max = v;
    }
    if let Some(v) = env.u32("SPORTZ_WS_WINDOW_MAX", 1, 100_000) {
        settings.shield.ws_window.max = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// `DRY_RUN` selects observe-only; any other value enforces.
pub fn parse_shield_mode(val: &str) -> ShieldMode {
    ShieldMode::parse(val)
}

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
    }

    fn string(&self, name: &str) -> Option<String> {
        self.raw(name).filter(|v| !v.is_empty())
    }

    fn u16(&self, name: &str, min: u16, max: u16) -> Option<u16> {
        let val = self.raw(name)?;
        let result = parse_u16_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid u16 env var, ignoring");
        }
        result
    }

    fn u32(&self, name: &str, min: u32, max: u32) -> Option<u32> {
        let val = self.raw(name)?;
        let result = parse_u32_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid u32 env var, ignoring");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = self.raw(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }
}
