use backon::ExponentialBuilder;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff policy applied to every connection attempt during bootstrap
///
/// No attempt limit: a connection is retried until it succeeds or the
/// connection-phase deadline cancels it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackoffConfig {
    /// Delay before the second attempt (in milliseconds)
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound for any single delay (in milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Multiplier applied to the delay after every failed attempt
    #[serde(default = "default_factor")]
    pub factor: f32,

    /// Whether to randomize delays
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            factor: default_factor(),
            jitter: default_jitter(),
        }
    }
}

impl BackoffConfig {
    /// Create a BackoffConfig with sensible defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic backoff without jitter, useful when delays must be predictable
    pub fn fixed_growth(min_delay_ms: u64, max_delay_ms: u64, factor: f32) -> Self {
        Self {
            min_delay_ms,
            max_delay_ms,
            factor,
            jitter: false,
        }
    }

    /// Validate the configuration and return errors if invalid
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_delay_ms > self.max_delay_ms {
            return Err(anyhow::anyhow!(
                "min_delay_ms cannot be greater than max_delay_ms"
            ));
        }

        if self.factor.is_nan() || self.factor < 1.0 {
            return Err(anyhow::anyhow!("factor must be at least 1.0"));
        }

        if self.factor > 10.0 {
            return Err(anyhow::anyhow!("factor should not exceed 10.0"));
        }

        if self.max_delay_ms > 60_000 {
            return Err(anyhow::anyhow!("max_delay_ms should not exceed 60 seconds"));
        }

        Ok(())
    }

    /// Get the minimum delay as Duration
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    /// Get the maximum delay as Duration
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Creates the open-ended exponential strategy described by this config
    pub fn strategy(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay())
            .with_max_delay(self.max_delay())
            .with_factor(self.factor)
            .without_max_times();

        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }
}

/// Main lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Builder)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into))]
pub struct LifecycleConfig {
    /// Deadline for each connection during bootstrap (in milliseconds)
    #[serde(default = "default_connection_timeout_ms")]
    #[builder(default = "default_connection_timeout_ms()")]
    pub connection_timeout_ms: u64,

    /// Deadline for the service's shutdown once cancellation is observed (in milliseconds)
    #[serde(default = "default_shutdown_timeout_ms")]
    #[builder(default = "default_shutdown_timeout_ms()")]
    pub shutdown_timeout_ms: u64,

    /// Treat an error returned by a timely shutdown as fatal instead of only logging it
    #[serde(default)]
    #[builder(default)]
    pub strict_shutdown: bool,

    #[serde(default)]
    #[builder(default)]
    pub backoff: BackoffConfig,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            connection_timeout_ms: default_connection_timeout_ms(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            strict_shutdown: false,
            backoff: BackoffConfig::default(),
        }
    }
}

impl LifecycleConfig {
    pub fn builder() -> LifecycleConfigBuilder {
        LifecycleConfigBuilder::default()
    }

    /// Parse a JSON document and validate the result
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.connection_timeout_ms == 0 {
            return Err(anyhow::anyhow!("connection_timeout_ms must be positive"));
        }

        if self.shutdown_timeout_ms == 0 {
            return Err(anyhow::anyhow!("shutdown_timeout_ms must be positive"));
        }

        self.backoff.validate()
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

// Default value functions for serde
fn default_min_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    60_000
}
fn default_factor() -> f32 {
    1.5
}
fn default_jitter() -> bool {
    true
}
fn default_connection_timeout_ms() -> u64 {
    5 * 60 * 1000
}
fn default_shutdown_timeout_ms() -> u64 {
    5_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LifecycleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.connection_timeout(), Duration::from_secs(300));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
        assert!(!config.strict_shutdown);
        assert!(config.backoff.jitter);
    }

    #[test]
    fn test_builder_defaults_match_default() {
        let built = LifecycleConfig::builder().build().unwrap();
        assert_eq!(built, LifecycleConfig::default());

        let built = LifecycleConfig::builder()
            .shutdown_timeout_ms(250u64)
            .strict_shutdown(true)
            .build()
            .unwrap();
        assert_eq!(built.shutdown_timeout(), Duration::from_millis(250));
        assert!(built.strict_shutdown);
        assert_eq!(built.connection_timeout_ms, 300_000);
    }

    #[test]
    fn test_invalid_config() {
        let mut config = LifecycleConfig {
            backoff: BackoffConfig {
                min_delay_ms: 1000,
                max_delay_ms: 500,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.backoff = BackoffConfig::fixed_growth(10, 100, 0.5);
        assert!(config.validate().is_err());

        config.backoff = BackoffConfig::default();
        config.shutdown_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_growth_is_bounded() {
        assert!(BackoffConfig::fixed_growth(500, 60_000, 10.0).validate().is_ok());
        assert!(BackoffConfig::fixed_growth(500, 60_000, 1e30).validate().is_err());
        assert!(BackoffConfig::fixed_growth(500, 60_000, f32::INFINITY).validate().is_err());
        assert!(BackoffConfig::fixed_growth(500, u64::MAX, 1.5).validate().is_err());

        let config = LifecycleConfig {
            backoff: BackoffConfig::fixed_growth(500, 3_600_000, 1.5),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config =
            LifecycleConfig::from_json_str(r#"{"shutdownTimeoutMs": 1500, "backoff": {"jitter": false}}"#)
                .unwrap();
        assert_eq!(config.shutdown_timeout(), Duration::from_millis(1500));
        assert_eq!(config.connection_timeout_ms, 300_000);
        assert!(!config.backoff.jitter);
        assert_eq!(config.backoff.min_delay_ms, 500);

        assert!(LifecycleConfig::from_json_str(r#"{"connectionTimeoutMs": 0}"#).is_err());
    }

    #[test]
    fn test_serialization() {
        let config = LifecycleConfig {
            strict_shutdown: true,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("strictShutdown"));
        let deserialized: LifecycleConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
