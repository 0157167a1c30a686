//! Application configuration loaded from `config.toml`.
//!
//! Every key is optional; omitted keys take the defaults below.

use anyhow::{Context, bail};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::telemetry::LatencyMode;

/// Polling cadence and history settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PollingConfig {
    /// Seconds between readings in High latency mode.
    pub high_latency_interval_secs: u64,
    /// Seconds between readings in Low latency mode.
    pub low_latency_interval_secs: u64,
    /// Points kept per channel for the chart.
    pub series_capacity: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            high_latency_interval_secs: 60,
            low_latency_interval_secs: 3,
            series_capacity: crate::telemetry::DEFAULT_SERIES_CAPACITY,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self, mode: LatencyMode) -> Duration {
        mode.interval(
            Duration::from_secs(self.high_latency_interval_secs),
            Duration::from_secs(self.low_latency_interval_secs),
        )
    }
}

/// Bounds and scale of the power-limit slider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PowerLimitConfig {
    pub min_percent: i32,
    pub max_percent: i32,
    /// Output power that 100% corresponds to.
    pub rated_watts: f64,
}

impl Default for PowerLimitConfig {
    fn default() -> Self {
        Self {
            min_percent: 80,
            max_percent: 100,
            rated_watts: 145.0,
        }
    }
}

impl PowerLimitConfig {
    pub fn contains(&self, percent: i32) -> bool {
        (self.min_percent..=self.max_percent).contains(&percent)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AppConfig {
    /// Base URL of the backend API, without a trailing endpoint.
    pub base_url: String,
    /// Connect and read timeout for each backend call.
    pub timeout_ms: u64,
    /// Devices offered on the selection screen.
    pub devices: Vec<String>,
    pub polling: PollingConfig,
    pub power_limit: PowerLimitConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://10.173.158.2:4020/api/v1".to_string(),
            timeout_ms: crate::control::DEFAULT_TIMEOUT.as_millis() as u64,
            devices: vec!["Device 1".to_string(), "Device 2".to_string(), "Device 3".to_string()],
            polling: PollingConfig::default(),
            power_limit: PowerLimitConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::parse(&content).with_context(|| format!("Invalid config file: {}", config_path.display()))
    }

    /// Load `config_path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            log::warn!("Config file {} not found, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("base-url must not be empty");
        }
        if self.timeout_ms == 0 {
            bail!("timeout-ms must be greater than zero");
        }
        if self.devices.is_empty() {
            bail!("at least one device must be configured");
        }
        if self.polling.high_latency_interval_secs == 0 || self.polling.low_latency_interval_secs == 0 {
            bail!("polling intervals must be greater than zero");
        }
        if self.polling.series_capacity == 0 {
            bail!("series-capacity must be greater than zero");
        }
        let limit = &self.power_limit;
        if limit.min_percent > limit.max_percent {
            bail!(
                "power-limit min-percent ({}) exceeds max-percent ({})",
                limit.min_percent,
                limit.max_percent
            );
        }
        if !(limit.rated_watts > 0.0) {
            bail!("power-limit rated-watts must be positive");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.polling.interval(LatencyMode::High), Duration::from_secs(60));
        assert_eq!(config.polling.interval(LatencyMode::Low), Duration::from_secs(3));
        assert_eq!(config.polling.series_capacity, 300);
        assert_eq!(config.timeout(), Duration::from_millis(2000));
        assert!(config.power_limit.contains(80) && config.power_limit.contains(100));
        assert!(!config.power_limit.contains(79) && !config.power_limit.contains(101));
    }

    #[test]
    fn overrides_are_applied_per_key() {
        let config = AppConfig::parse(
            r#"
            base-url = "http://127.0.0.1:9000/api/v1"
            devices = ["Bench PSU"]

            [polling]
            low-latency-interval-secs = 1

            [power-limit]
            min-percent = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url, "http://127.0.0.1:9000/api/v1");
        assert_eq!(config.devices, vec!["Bench PSU".to_string()]);
        assert_eq!(config.polling.low_latency_interval_secs, 1);
        assert_eq!(config.polling.high_latency_interval_secs, 60);
        assert_eq!(config.power_limit.min_percent, 50);
        assert_eq!(config.power_limit.max_percent, 100);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(AppConfig::parse("timeout-ms = 0").is_err());
        assert!(AppConfig::parse("devices = []").is_err());
        assert!(AppConfig::parse("[polling]\nhigh-latency-interval-secs = 0").is_err());
        assert!(AppConfig::parse("[polling]\nseries-capacity = 0").is_err());
        assert!(AppConfig::parse("[power-limit]\nmin-percent = 101").is_err());
        assert!(AppConfig::parse("[power-limit]\nrated-watts = 0.0").is_err());
        assert!(AppConfig::parse("base-url = 5").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("cpeodesic-config-that-does-not-exist.toml");
        assert_eq!(AppConfig::load_or_default(&path).unwrap(), AppConfig::default());
    }
}
