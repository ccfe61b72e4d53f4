//! Configuration management
//!
//! Settings that are not command-line flags come from `STACKFORM_*`
//! environment variables. Flags override the same fields when given.

use crate::transform::Distro;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Prefix of every environment variable read by stackform
pub const ENV_PREFIX: &str = "STACKFORM_";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target distribution
    pub distro: Distro,
    /// Output directory; `-` or empty writes to stdout
    pub output_dir: PathBuf,
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Attempts when fetching a URL
    pub fetch_attempts: u32,
    /// Pause between fetch attempts, in milliseconds
    pub fetch_backoff_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            distro: Distro::Kubernetes,
            output_dir: PathBuf::from("./"),
            log_level: "warn".to_string(),
            fetch_attempts: 3,
            fetch_backoff_ms: 1000,
        }
    }
}

impl Config {
    /// Reads overrides from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`, which maps a variable name to its value
    ///
    /// Unparseable values keep the default and log a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(value) = var("FETCH_ATTEMPTS") {
            match value.parse() {
                Ok(attempts) if attempts > 0 => config.fetch_attempts = attempts,
                _ => tracing::warn!(%value, "ignoring invalid STACKFORM_FETCH_ATTEMPTS"),
            }
        }
        if let Some(value) = var("FETCH_BACKOFF_MS") {
            match value.parse() {
                Ok(backoff) => config.fetch_backoff_ms = backoff,
                Err(_) => tracing::warn!(%value, "ignoring invalid STACKFORM_FETCH_BACKOFF_MS"),
            }
        }
        config
    }

    /// Pause between fetch attempts
    #[must_use]
    pub fn fetch_backoff(&self) -> Duration {
        Duration::from_millis(self.fetch_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.distro, Distro::Kubernetes);
        assert_eq!(config.output_dir, PathBuf::from("./"));
        assert_eq!(config.fetch_attempts, 3);
        assert_eq!(config.fetch_backoff(), Duration::from_secs(1));
    }

    #[test]
    fn test_config_from_lookup() {
        let env = HashMap::from([
            ("STACKFORM_FETCH_ATTEMPTS", "5"),
            ("STACKFORM_FETCH_BACKOFF_MS", "10"),
        ]);
        let config = Config::from_lookup(|key| env.get(key).map(ToString::to_string));
        assert_eq!(config.fetch_attempts, 5);
        assert_eq!(config.fetch_backoff_ms, 10);
    }

    #[test]
    fn test_config_ignores_invalid_values() {
        let env = HashMap::from([
            ("STACKFORM_FETCH_ATTEMPTS", "0"),
            ("STACKFORM_FETCH_BACKOFF_MS", "soon"),
        ]);
        let config = Config::from_lookup(|key| env.get(key).map(ToString::to_string));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_deserializes_partial() {
        let config: Config = serde_yaml::from_str("distro: openshift\n").unwrap();
        assert_eq!(config.distro, Distro::OpenShift);
        assert_eq!(config.fetch_attempts, 3);
    }
}
