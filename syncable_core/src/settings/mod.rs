//! Tunable intervals for replicated entities.
//!
//! Settings are read as [`RawSyncSettings`] (straight from a settings file, no guarantees), then
//! validated into [`SyncSettings`]. Only validated settings can be used to build a scheduler.

use bevy::prelude::*;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// Intervals above this many seconds are clamped down to it
pub const MAX_INTERVAL_SECS: f64 = 99.0;
/// The interval used for anything not specified
pub const DEFAULT_INTERVAL_SECS: f64 = 1.0;

#[derive(Error, Display, Debug)]
/// Something was wrong with the provided settings
pub enum ConfigError {
    /// Intervals cannot be negative
    #[display("{name} must not be negative (got {value})")]
    NegativeInterval {
        /// The setting that was invalid
        name: &'static str,
        /// The value it was set to
        value: f64,
    },
    /// The interval was NaN
    #[display("{name} must be a number")]
    NotANumber {
        /// The setting that was invalid
        name: &'static str,
    },
    /// The settings document could not be parsed
    #[display("invalid settings document: {_0}")]
    Parse(toml::de::Error),
}

/// Settings exactly as they were written in a settings file.
///
/// BEWARE: These are NOT guarenteed to be within any sort of bounds. Turn them into
/// [`SyncSettings`] before using them.
///
/// Any setting missing from the file will use [`DEFAULT_INTERVAL_SECS`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSyncSettings {
    /// How often (in seconds) the throttled server/client updates run. 0 means every frame.
    pub manager_update_interval: f64,
    /// How long (in seconds) a cached value is kept before it is re-calculated
    pub cache_ttl: f64,
}

impl Default for RawSyncSettings {
    fn default() -> Self {
        Self {
            manager_update_interval: DEFAULT_INTERVAL_SECS,
            cache_ttl: DEFAULT_INTERVAL_SECS,
        }
    }
}

impl RawSyncSettings {
    /// Parses a TOML document without validating any of its values
    pub fn from_toml(document: &str) -> Result<Self, ConfigError> {
        toml::from_str(document).map_err(ConfigError::Parse)
    }
}

#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq)]
/// Validated intervals every replicated entity is scheduled with unless it brings its own.
pub struct SyncSettings {
    manager_update_interval: f64,
    cache_ttl: f64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            manager_update_interval: DEFAULT_INTERVAL_SECS,
            cache_ttl: DEFAULT_INTERVAL_SECS,
        }
    }
}

impl SyncSettings {
    /// Validates both intervals (in seconds).
    ///
    /// Negative or NaN values are rejected. Anything above [`MAX_INTERVAL_SECS`] is clamped.
    pub fn new(manager_update_interval: f64, cache_ttl: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            manager_update_interval: validate_interval("manager_update_interval", manager_update_interval)?,
            cache_ttl: validate_interval("cache_ttl", cache_ttl)?,
        })
    }

    /// Parses + validates a TOML document such as:
    ///
    /// ```toml
    /// manager_update_interval = 0.5
    /// cache_ttl = 2.0
    /// ```
    pub fn from_toml(document: &str) -> Result<Self, ConfigError> {
        Self::try_from(RawSyncSettings::from_toml(document)?)
    }

    /// How often (in seconds) the throttled server/client updates run. 0 means every frame.
    pub fn manager_update_interval(&self) -> f64 {
        self.manager_update_interval
    }

    /// How long (in seconds) a cached value is kept before it is re-calculated
    pub fn cache_ttl(&self) -> f64 {
        self.cache_ttl
    }
}

impl TryFrom<RawSyncSettings> for SyncSettings {
    type Error = ConfigError;

    fn try_from(raw: RawSyncSettings) -> Result<Self, Self::Error> {
        Self::new(raw.manager_update_interval, raw.cache_ttl)
    }
}

impl From<SyncSettings> for RawSyncSettings {
    fn from(settings: SyncSettings) -> Self {
        Self {
            manager_update_interval: settings.manager_update_interval,
            cache_ttl: settings.cache_ttl,
        }
    }
}

fn validate_interval(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_nan() {
        return Err(ConfigError::NotANumber { name });
    }

    if value < 0.0 {
        return Err(ConfigError::NegativeInterval { name, value });
    }

    if value > MAX_INTERVAL_SECS {
        warn!("{name} of {value}s is above the {MAX_INTERVAL_SECS}s limit - using {MAX_INTERVAL_SECS}s instead.");
        return Ok(MAX_INTERVAL_SECS);
    }

    Ok(value)
}

pub(super) fn register(app: &mut App) {
    app.register_type::<SyncSettings>();
}
