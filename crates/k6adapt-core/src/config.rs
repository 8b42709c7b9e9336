use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AdaptError, Result};

/// Policy for documents containing more than one matching export clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultiMatchPolicy {
    /// Rewrite only the lexically earliest clause; the surplus is reported,
    /// never silently dropped.
    #[serde(rename = "first")]
    First,
    /// Treat multiple matches as a fatal ambiguity.
    #[serde(rename = "error")]
    Error,
}

impl Default for MultiMatchPolicy {
    fn default() -> Self {
        MultiMatchPolicy::First
    }
}

/// Adapter configuration, loaded from `k6adapt.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterConfig {
    /// Build artifact to rewrite (default: dist/script.js)
    #[serde(default = "default_entry")]
    pub entry: String,

    /// Policy when more than one export clause matches (default: first)
    #[serde(default)]
    pub multi_match: MultiMatchPolicy,
}

fn default_entry() -> String {
    "dist/script.js".to_string()
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            entry: default_entry(),
            multi_match: MultiMatchPolicy::First,
        }
    }
}

impl AdapterConfig {
    /// Conventional configuration file name, discovered in the working
    /// directory when no explicit path is given.
    pub const DEFAULT_FILE: &'static str = "k6adapt.json";

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| AdaptError::Config(e.to_string()))
    }

    /// Create a default configuration and write it to a file
    pub fn init_file(path: &Path) -> Result<()> {
        let config = AdapterConfig::default();
        let json = serde_json::to_string_pretty(&config)
            .map_err(|e| AdaptError::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AdapterConfig::default();
        assert_eq!(config.entry, "dist/script.js");
        assert_eq!(config.multi_match, MultiMatchPolicy::First);
    }

    #[test]
    fn test_deserialize_config() {
        let json = r#"{
            "entry": "build/out.js",
            "multiMatch": "error"
        }"#;
        let config: AdapterConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.entry, "build/out.js");
        assert_eq!(config.multi_match, MultiMatchPolicy::Error);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: AdapterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.entry, "dist/script.js");
        assert_eq!(config.multi_match, MultiMatchPolicy::First);
    }

    #[test]
    fn test_init_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(AdapterConfig::DEFAULT_FILE);

        AdapterConfig::init_file(&path).unwrap();
        let config = AdapterConfig::from_file(&path).unwrap();
        assert_eq!(config.entry, AdapterConfig::default().entry);
    }

    #[test]
    fn test_malformed_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = AdapterConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, AdaptError::Config(_)));
    }

    #[test]
    fn test_missing_config_is_io_error() {
        let err = AdapterConfig::from_file(Path::new("/nonexistent/k6adapt.json")).unwrap_err();
        assert!(matches!(err, AdaptError::Io(_)));
    }
}
