//! Engine settings
//!
//! Loaded from `STORYLOOM_*` environment variables, with `.env` support via
//! dotenvy. Every value has a default, so an empty environment is valid.
//!
//! | Variable                          | Default |
//! |-----------------------------------|---------|
//! | `STORYLOOM_THREAD_AGE_HIGH`       | 4       |
//! | `STORYLOOM_THREAD_AGE_MEDIUM`     | 7       |
//! | `STORYLOOM_THREAD_AGE_LOW`        | 10      |
//! | `STORYLOOM_PROMISE_AGING_NOTICE`  | 5       |
//! | `STORYLOOM_THREAD_PANEL_ROWS`     | 6       |

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use storyloom_domain::{
    ThreadAgingThresholds, DEFAULT_PROMISE_AGING_NOTICE, DEFAULT_THREAD_PANEL_ROWS,
};

pub const THREAD_AGE_HIGH_VAR: &str = "STORYLOOM_THREAD_AGE_HIGH";
pub const THREAD_AGE_MEDIUM_VAR: &str = "STORYLOOM_THREAD_AGE_MEDIUM";
pub const THREAD_AGE_LOW_VAR: &str = "STORYLOOM_THREAD_AGE_LOW";
pub const PROMISE_AGING_NOTICE_VAR: &str = "STORYLOOM_PROMISE_AGING_NOTICE";
pub const THREAD_PANEL_ROWS_VAR: &str = "STORYLOOM_THREAD_PANEL_ROWS";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{key} has invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    #[serde(default)]
    pub thread_aging: ThreadAgingThresholds,
    #[serde(default = "default_promise_aging_notice")]
    pub promise_aging_notice: u32,
    #[serde(default = "default_thread_panel_rows")]
    pub thread_panel_rows: usize,
}

fn default_promise_aging_notice() -> u32 {
    DEFAULT_PROMISE_AGING_NOTICE
}

fn default_thread_panel_rows() -> usize {
    DEFAULT_THREAD_PANEL_ROWS
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            thread_aging: ThreadAgingThresholds::default(),
            promise_aging_notice: default_promise_aging_notice(),
            thread_panel_rows: default_thread_panel_rows(),
        }
    }
}

impl EngineSettings {
    /// Load `.env` (if present) and read the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Failed to read .env file, using process environment");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let defaults = Self::default();
        let high = parse_or(&lookup, THREAD_AGE_HIGH_VAR, defaults.thread_aging.high)?;
        let medium = parse_or(&lookup, THREAD_AGE_MEDIUM_VAR, defaults.thread_aging.medium)?;
        let low = parse_or(&lookup, THREAD_AGE_LOW_VAR, defaults.thread_aging.low)?;

        let settings = Self {
            thread_aging: ThreadAgingThresholds::new(high, medium, low)
                .map_err(|e| SettingsError::Invalid(e.to_string()))?,
            promise_aging_notice: parse_or(
                &lookup,
                PROMISE_AGING_NOTICE_VAR,
                defaults.promise_aging_notice,
            )?,
            thread_panel_rows: parse_or(&lookup, THREAD_PANEL_ROWS_VAR, defaults.thread_panel_rows)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let aging = &self.thread_aging;
        if aging.high == 0 || aging.medium == 0 || aging.low == 0 {
            return Err(SettingsError::Invalid(
                "Thread aging thresholds must be greater than 0".to_string(),
            ));
        }
        if self.promise_aging_notice == 0 {
            return Err(SettingsError::Invalid(
                "Promise aging notice must be greater than 0".to_string(),
            ));
        }
        if self.thread_panel_rows == 0 {
            return Err(SettingsError::Invalid(
                "Thread panel must show at least one row".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, SettingsError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| SettingsError::InvalidValue {
            key,
            value: raw.clone(),
        }),
    }
}
