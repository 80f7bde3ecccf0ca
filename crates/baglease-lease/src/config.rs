use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_LEASE_TTL_SECS: u64 = 300;
pub const MIN_LEASE_TTL_SECS: u64 = 10;
pub const MAX_LEASE_TTL_SECS: u64 = 3600;

pub const ENV_LEASE_TTL_SECS: &str = "BAGLEASE_LEASE_TTL_SECS";
pub const ENV_NOTIFY_READ_ONLY_VIEWERS: &str = "BAGLEASE_NOTIFY_READ_ONLY_VIEWERS";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "BAGLEASE_SWEEP_INTERVAL_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(
        "lease_ttl_secs must be in range [{min}, {max}] (got {actual})",
        min = MIN_LEASE_TTL_SECS,
        max = MAX_LEASE_TTL_SECS
    )]
    LeaseTtlOutOfRange { actual: u64 },

    #[error("{var} has an invalid value {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Arbitrator settings.
///
/// Deserializes with every field defaulted, so an embedding application
/// can nest it in its own config document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbitratorConfig {
    /// Seconds after which an unreleased lease is abandoned.
    pub lease_ttl_secs: u64,
    /// Tell read-only viewers when the owner takes the page.
    pub notify_read_only_viewers: bool,
    /// Period of the proactive expiry sweep; 0 disables it.
    pub sweep_interval_secs: u64,
}

impl Default for ArbitratorConfig {
    fn default() -> Self {
        Self {
            lease_ttl_secs: DEFAULT_LEASE_TTL_SECS,
            notify_read_only_viewers: true,
            sweep_interval_secs: 0,
        }
    }
}

impl ArbitratorConfig {
    /// Creates a new configuration builder with default settings.
    pub fn builder() -> ArbitratorConfigBuilder {
        ArbitratorConfigBuilder::default()
    }

    /// Reads overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads overrides through `lookup`; unset variables keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_LEASE_TTL_SECS) {
            config.lease_ttl_secs = parse_u64(ENV_LEASE_TTL_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_NOTIFY_READ_ONLY_VIEWERS) {
            config.notify_read_only_viewers = parse_bool(ENV_NOTIFY_READ_ONLY_VIEWERS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SWEEP_INTERVAL_SECS) {
            config.sweep_interval_secs = parse_u64(ENV_SWEEP_INTERVAL_SECS, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_LEASE_TTL_SECS..=MAX_LEASE_TTL_SECS).contains(&self.lease_ttl_secs) {
            return Err(ConfigError::LeaseTtlOutOfRange {
                actual: self.lease_ttl_secs,
            });
        }
        Ok(())
    }

    pub fn lease_ttl(&self) -> Duration {
        Duration::from_secs(self.lease_ttl_secs)
    }

    /// `None` when the sweep is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

/// Builder for [`ArbitratorConfig`].
#[derive(Debug, Default)]
pub struct ArbitratorConfigBuilder {
    lease_ttl_secs: Option<u64>,
    notify_read_only_viewers: Option<bool>,
    sweep_interval_secs: Option<u64>,
}

impl ArbitratorConfigBuilder {
    /// Sets the lease timeout in seconds (default: 300).
    pub fn lease_ttl_secs(mut self, secs: u64) -> Self {
        self.lease_ttl_secs = Some(secs);
        self
    }

    /// Enables or disables viewer notices (default: enabled).
    pub fn notify_read_only_viewers(mut self, enabled: bool) -> Self {
        self.notify_read_only_viewers = Some(enabled);
        self
    }

    /// Sets the sweep period in seconds (default: 0, disabled).
    pub fn sweep_interval_secs(mut self, secs: u64) -> Self {
        self.sweep_interval_secs = Some(secs);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<ArbitratorConfig, ConfigError> {
        let defaults = ArbitratorConfig::default();
        let config = ArbitratorConfig {
            lease_ttl_secs: self.lease_ttl_secs.unwrap_or(defaults.lease_ttl_secs),
            notify_read_only_viewers: self
                .notify_read_only_viewers
                .unwrap_or(defaults.notify_read_only_viewers),
            sweep_interval_secs: self
                .sweep_interval_secs
                .unwrap_or(defaults.sweep_interval_secs),
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_u64(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: raw.to_string(),
    })
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: raw.to_string(),
        }),
    }
}
