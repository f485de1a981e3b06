// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration for the session layer.
//!
//! Settings are read from a TOML or YAML file, chosen by extension.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Session-layer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Quiescence window of change aggregators, in milliseconds
    #[serde(default)]
    pub quiescence_delay_ms: i64,
    /// Open links found in a song's memo when it is opened and activated
    #[serde(default = "default_open_memo_links")]
    pub open_memo_links: bool,
    /// Buffered lifecycle events per subscriber
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Maximum log level ("trace", "debug", "info", "warn", "error")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_open_memo_links() -> bool {
    true
}
fn default_event_capacity() -> usize {
    64
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            quiescence_delay_ms: 0,
            open_memo_links: default_open_memo_links(),
            event_capacity: default_event_capacity(),
            log_level: default_log_level(),
        }
    }
}

impl SessionConfig {
    /// Load from a `.toml`, `.yaml` or `.yml` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&contents)?,
            Some("yaml") | Some("yml") => Self::from_yaml(&contents)?,
            _ => bail!("Unsupported config file extension: {:?}", path),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML configuration")
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("Failed to parse YAML configuration")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize configuration to TOML")
    }

    /// Reject values no component would accept
    pub fn validate(&self) -> std::result::Result<(), SessionError> {
        if self.quiescence_delay_ms < 0 {
            return Err(SessionError::NegativeDelay {
                delay_ms: self.quiescence_delay_ms,
            });
        }
        Ok(())
    }

    /// Parsed log level, falling back to INFO
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_toml() {
        let text = r#"
quiescence_delay_ms = 250
open_memo_links = false
log_level = "debug"
"#;
        let config = SessionConfig::from_toml(text).unwrap();
        assert_eq!(config.quiescence_delay_ms, 250);
        assert!(!config.open_memo_links);
        assert_eq!(config.event_capacity, 64);
        assert_eq!(config.tracing_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_parse_yaml_defaults() {
        let config = SessionConfig::from_yaml("quiescence_delay_ms: 100\n").unwrap();
        assert_eq!(config.quiescence_delay_ms, 100);
        assert!(config.open_memo_links);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_negative_delay_invalid() {
        let config = SessionConfig {
            quiescence_delay_ms: -10,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SessionError::NegativeDelay { delay_ms: -10 })
        ));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempdir().unwrap();

        let toml_path = dir.path().join("session.toml");
        fs::write(&toml_path, "event_capacity = 8\n").unwrap();
        assert_eq!(SessionConfig::load(&toml_path).unwrap().event_capacity, 8);

        let yaml_path = dir.path().join("session.yml");
        fs::write(&yaml_path, "event_capacity: 16\n").unwrap();
        assert_eq!(SessionConfig::load(&yaml_path).unwrap().event_capacity, 16);

        let bad_path = dir.path().join("session.ini");
        fs::write(&bad_path, "event_capacity=1").unwrap();
        assert!(SessionConfig::load(&bad_path).is_err());

        let negative = dir.path().join("negative.toml");
        fs::write(&negative, "quiescence_delay_ms = -1\n").unwrap();
        assert!(SessionConfig::load(&negative).is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SessionConfig {
            quiescence_delay_ms: 300,
            ..Default::default()
        };
        let text = config.to_toml().unwrap();
        assert_eq!(SessionConfig::from_toml(&text).unwrap(), config);
    }
}
