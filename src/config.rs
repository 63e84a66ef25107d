//! Engine configuration

use crate::store::DEFAULT_DATABASES;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options recognized when creating an engine
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Accept commands the engine knows but does not emulate, as no-ops
    /// returning nil
    pub bypass_unsupported: bool,

    /// Number of logical databases
    pub databases: usize,

    /// RNG seed; `None` seeds from OS entropy
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            bypass_unsupported: false,
            databases: DEFAULT_DATABASES,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document
    pub fn from_json(text: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(text).context("Invalid engine configuration")?;
        if config.databases == 0 {
            anyhow::bail!("Engine configuration must declare at least one database");
        }
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_json(&text).with_context(|| format!("Failed to load config from {:?}", path))
    }

    /// Builder-style toggle for the unsupported-command bypass
    pub fn bypass_unsupported(mut self, bypass: bool) -> Self {
        self.bypass_unsupported = bypass;
        self
    }

    /// Builder-style RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.databases, 16);
        assert!(!config.bypass_unsupported);
    }

    #[test]
    fn test_partial_document() {
        let config = EngineConfig::from_json(r#"{"bypass_unsupported": true, "seed": 42}"#).unwrap();
        assert!(config.bypass_unsupported);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.databases, 16);
    }

    #[test]
    fn test_rejects_zero_databases() {
        assert!(EngineConfig::from_json(r#"{"databases": 0}"#).is_err());
        assert!(EngineConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load("/nonexistent/memcache-rs.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
