//! Engine configuration
//!
//! The only engine-level setting is the arbitrator identity, fixed for the
//! lifetime of an engine. It can be read from a JSON document or from the
//! `ENERGY_TRADE_ARBITRATOR` environment variable.

use serde::{Deserialize, Serialize};
use std::path::Path;
use types::ids::Identity;

use crate::errors::ConfigError;

/// Environment variable holding the arbitrator identity
pub const ARBITRATOR_ENV: &str = "ENERGY_TRADE_ARBITRATOR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sole authority allowed to resolve disputes
    pub arbitrator: Identity,
}

impl EngineConfig {
    pub fn new(arbitrator: impl Into<Identity>) -> Self {
        Self {
            arbitrator: arbitrator.into(),
        }
    }

    /// Parse a JSON document such as `{"arbitrator": "0xowner"}`.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Read the arbitrator from [`ARBITRATOR_ENV`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let arbitrator =
            std::env::var(ARBITRATOR_ENV).map_err(|_| ConfigError::Missing(ARBITRATOR_ENV))?;
        Self::new(arbitrator).validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.arbitrator.as_str().trim().is_empty() {
            return Err(ConfigError::Missing("arbitrator"));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_str() {
        let config = EngineConfig::from_json_str(r#"{"arbitrator": "0xowner"}"#).unwrap();
        assert_eq!(config.arbitrator, Identity::new("0xowner"));
    }

    #[test]
    fn test_from_json_str_rejects_empty_arbitrator() {
        let result = EngineConfig::from_json_str(r#"{"arbitrator": "  "}"#);
        assert!(matches!(result, Err(ConfigError::Missing("arbitrator"))));
    }

    #[test]
    fn test_from_json_str_rejects_malformed() {
        let result = EngineConfig::from_json_str("{not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_file_missing() {
        let result = EngineConfig::from_file("/nonexistent/engine.json");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
