//! # sportz-settings
//!
//! Configuration for the Sportz server, loaded in layers:
//!
//! 1. Compiled [`SportzSettings::default()`]
//! 2. `~/.sportz/settings.json`, deep-merged over the defaults
//! 3. `SPORTZ_*` environment overrides
//!
//! The decision-provider credential (`shield.key`) is optional. Its absence
//! disables admission gating; it is never an error here.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use types::{
    LoggingSettings, RateWindow, ServerSettings, ShieldMode, ShieldSettings, SportzSettings,
};
pub use loader::{default_db_path, load_settings, load_settings_from_path};
