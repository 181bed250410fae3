//! Server configuration file

use std::path::Path;

use modelsnip_engine::EngineConfig;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the bind address
pub const BIND_ENV: &str = "MODELSNIP_BIND";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3001".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read a JSON config file; omitted fields keep their defaults
    pub fn load(path: &Path) -> Result<Self, String> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        serde_json::from_str(&json).map_err(|e| format!("failed to parse {}: {e}", path.display()))
    }

    /// Apply environment overrides
    pub fn with_env(mut self) -> Self {
        if let Ok(bind) = std::env::var(BIND_ENV) {
            self.bind = bind;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config() {
        let config: ServerConfig =
            serde_json::from_str(r#"{ "engine": { "max_steps": 50 } }"#).unwrap();
        assert_eq!(config.bind, "0.0.0.0:3001");
        assert_eq!(config.engine.max_steps, 50);
        assert_eq!(config.engine.max_parts, EngineConfig::default().max_parts);
    }

    #[test]
    fn test_missing_file() {
        let err = ServerConfig::load(Path::new("/nonexistent/modelsnip.json")).unwrap_err();
        assert!(err.contains("failed to read"));
    }
}
