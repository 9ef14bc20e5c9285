//! Provider configuration
//!
//! The provider block is handed over as an attribute map. Settings missing
//! from the block fall back to environment variables, then to defaults.

use std::collections::HashMap;
use std::time::Duration;

use gspaas_core::resource::Value;
use thiserror::Error;

use crate::retry::RetryPolicy;
use crate::timeouts::TimeoutOverrides;

pub const ENV_RETRY_INTERVAL_MS: &str = "GSPAAS_RETRY_INTERVAL_MS";
pub const ENV_RETRY_MAX_ELAPSED_SECS: &str = "GSPAAS_RETRY_MAX_ELAPSED_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("provider attribute '{key}' {message}")]
    InvalidAttribute { key: String, message: String },

    #[error("environment variable {key} is not a valid number: {value}")]
    InvalidEnv { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Provider-wide replacements for the per-kind default timeouts
    pub timeouts: TimeoutOverrides,
    /// Retry policy for idempotent lookups
    pub retry: RetryPolicy,
}

impl ProviderConfig {
    /// Build the configuration from a provider block, consulting the process environment
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> Result<Self, ConfigError> {
        Self::from_sources(attributes, |key| std::env::var(key).ok())
    }

    /// Build the configuration with an explicit environment lookup
    pub fn from_sources(
        attributes: &HashMap<String, Value>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(interval) = int_setting(
            attributes,
            "retry_interval_ms",
            ENV_RETRY_INTERVAL_MS,
            &env,
        )? {
            config.retry.interval = Duration::from_millis(interval);
        }
        if let Some(budget) = int_setting(
            attributes,
            "retry_max_elapsed_secs",
            ENV_RETRY_MAX_ELAPSED_SECS,
            &env,
        )? {
            config.retry.max_elapsed = Duration::from_secs(budget);
        }

        match attributes.get("timeouts") {
            None => {}
            Some(Value::Map(map)) => {
                config.timeouts =
                    TimeoutOverrides::from_map(map).map_err(|message| ConfigError::InvalidAttribute {
                        key: "timeouts".to_string(),
                        message,
                    })?;
            }
            Some(_) => {
                return Err(ConfigError::InvalidAttribute {
                    key: "timeouts".to_string(),
                    message: "must be a block".to_string(),
                });
            }
        }

        Ok(config)
    }
}

fn int_setting(
    attributes: &HashMap<String, Value>,
    key: &str,
    env_key: &str,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<Option<u64>, ConfigError> {
    match attributes.get(key) {
        Some(Value::Int(n)) if *n >= 0 => return Ok(Some(*n as u64)),
        Some(_) => {
            return Err(ConfigError::InvalidAttribute {
                key: key.to_string(),
                message: "must be a non-negative integer".to_string(),
            });
        }
        None => {}
    }
    match env(env_key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                key: env_key.to_string(),
                value,
            }),
        None => Ok(None),
    }
}
