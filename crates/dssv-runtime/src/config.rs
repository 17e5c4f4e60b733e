//! Runtime configuration, loadable from YAML.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::oracle::CompletionConfig;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Pipeline configuration.
///
/// Durations are humantime strings in YAML ("30s", "2m").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Oracle model name
    pub model: String,

    /// Maximum tokens per completion
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Timeout per oracle call; a timeout yields an ERROR outcome, never
    /// a pipeline failure
    #[serde(with = "humantime_duration")]
    pub oracle_timeout: Duration,

    /// Bounded worker pool size for sentence validation
    pub concurrency: usize,

    /// Character budget for the source transcript inside a prompt
    pub source_char_budget: usize,

    /// Character budget for the summary inside a prompt
    pub summary_char_budget: usize,

    /// Sections shorter than this are skipped
    pub min_section_chars: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model: std::env::var("CLAUDE_MODEL")
                .unwrap_or_else(|_| "claude-3-haiku-20240307".to_string()),
            max_tokens: 4096,
            temperature: 0.0,
            oracle_timeout: Duration::from_secs(30),
            concurrency: 4,
            source_char_budget: 30_000,
            summary_char_budget: 10_000,
            min_section_chars: 50,
        }
    }
}

impl RuntimeConfig {
    /// Parse a config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Check invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".into()));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid("max_tokens must be positive".into()));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        if self.source_char_budget == 0 {
            return Err(ConfigError::Invalid(
                "source_char_budget must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Per-request completion settings derived from this config.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.oracle_timeout,
        }
    }
}

/// Serde adapter for humantime duration strings.
mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = RuntimeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn test_yaml_roundtrip_with_humantime() {
        let yaml = "\
model: claude-3-haiku-20240307
oracle_timeout: 45s
concurrency: 8
";
        let config = RuntimeConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.oracle_timeout, Duration::from_secs(45));
        assert_eq!(config.concurrency, 8);
        // Unspecified fields keep defaults.
        assert_eq!(config.source_char_budget, 30_000);

        let serialized = serde_yaml::to_string(&config).unwrap();
        let reparsed = RuntimeConfig::from_yaml(&serialized).unwrap();
        assert_eq!(reparsed.oracle_timeout, config.oracle_timeout);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = RuntimeConfig::from_yaml("concurrency: 0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_empty_model_rejected() {
        let result = RuntimeConfig::from_yaml("model: \"  \"");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
