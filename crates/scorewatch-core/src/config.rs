//! Engine configuration and its YAML loader.
//!
//! Every tunable has a default so an empty document (or no file at all)
//! yields a working engine. Durations are expressed in milliseconds in the
//! file and exposed as [`Duration`] through accessors.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is outside its allowed range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Tunables for the polling engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Cycle cadence in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Maximum enrichment grants per window. Zero disables enrichment
    /// without turning it off.
    #[serde(default = "default_acquire_threshold")]
    pub acquire_threshold: u32,

    /// Window length in milliseconds.
    #[serde(default = "default_reset_delay_ms")]
    pub reset_delay_ms: u64,

    /// Response length cap passed to the summarizer backend.
    #[serde(default = "default_max_enriched_tokens")]
    pub max_enriched_tokens: u32,

    /// Sampling temperature passed to the summarizer backend.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Whether snapshots are routed to the summarizer at all.
    #[serde(default = "default_enrichment_enabled")]
    pub enrichment_enabled: bool,

    /// Upper bound on a single summarizer call in milliseconds.
    #[serde(default = "default_enrichment_timeout_ms")]
    pub enrichment_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            acquire_threshold: default_acquire_threshold(),
            reset_delay_ms: default_reset_delay_ms(),
            max_enriched_tokens: default_max_enriched_tokens(),
            temperature: default_temperature(),
            enrichment_enabled: default_enrichment_enabled(),
            enrichment_timeout_ms: default_enrichment_timeout_ms(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// A zero threshold or zero reset delay are accepted: the first never
    /// grants, the second never limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(invalid("tick_interval_ms must be at least 1"));
        }
        if self.max_enriched_tokens == 0 {
            return Err(invalid("max_enriched_tokens must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(invalid("temperature must be within 0.0..=2.0"));
        }
        if self.enrichment_timeout_ms == 0 {
            return Err(invalid("enrichment_timeout_ms must be at least 1"));
        }
        Ok(())
    }

    /// Cycle cadence.
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Budget window length.
    pub const fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    /// Summarizer call deadline.
    pub const fn enrichment_timeout(&self) -> Duration {
        Duration::from_millis(self.enrichment_timeout_ms)
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

const fn default_tick_interval_ms() -> u64 {
    10_000
}

const fn default_acquire_threshold() -> u32 {
    2
}

const fn default_reset_delay_ms() -> u64 {
    60_000
}

const fn default_max_enriched_tokens() -> u32 {
    1024
}

const fn default_temperature() -> f64 {
    0.8
}

const fn default_enrichment_enabled() -> bool {
    true
}

const fn default_enrichment_timeout_ms() -> u64 {
    30_000
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_secs(10));
        assert_eq!(config.acquire_threshold, 2);
        assert_eq!(config.reset_delay(), Duration::from_secs(60));
        assert_eq!(config.max_enriched_tokens, 1024);
        assert!(config.enrichment_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_document_gives_defaults() {
        let config = EngineConfig::parse("").ok();
        assert_eq!(config, Some(EngineConfig::default()));
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let yaml = "tick_interval_ms: 2500\nacquire_threshold: 5\n";
        let config = EngineConfig::parse(yaml).unwrap();
        assert_eq!(config.tick_interval(), Duration::from_millis(2500));
        assert_eq!(config.acquire_threshold, 5);
        assert_eq!(config.reset_delay_ms, 60_000);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let result = EngineConfig::parse("tick_interval_ms: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn out_of_range_temperature_is_rejected() {
        let result = EngineConfig::parse("temperature: 3.5\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn zero_threshold_and_zero_reset_are_allowed() {
        let yaml = "acquire_threshold: 0\nreset_delay_ms: 0\n";
        assert!(EngineConfig::parse(yaml).is_ok());
    }

    #[test]
    fn malformed_yaml_is_reported() {
        let result = EngineConfig::parse("tick_interval_ms: [not a number");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = EngineConfig::from_file(Path::new("/nonexistent/scorewatch.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
