//! Engine limits

use serde::{Deserialize, Serialize};

/// Resource limits applied to every replace attempt.
///
/// Compile-time limits produce compile diagnostics, runtime limits produce
/// execution faults. Missing fields fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest accepted snippet, in bytes
    pub max_snippet_bytes: usize,
    /// Deepest accepted nesting of expressions and blocks
    pub max_nesting: usize,
    /// Evaluation steps one invocation may spend
    pub max_steps: u64,
    /// Total vertices across all generated meshes
    pub max_vertices: usize,
    /// Mesh parts a builder may create
    pub max_parts: usize,
    /// Nodes a builder may create
    pub max_nodes: usize,
    /// Upper bound for primitive `divisions` arguments
    pub max_divisions: u32,
    /// Longest string value a snippet may build
    pub max_string_len: usize,
    /// Bytes one invocation may allocate for strings, arrays and objects
    pub max_heap_bytes: usize,
    /// Elements a single array may hold
    pub max_array_len: usize,
    /// Compile diagnostics reported per attempt
    pub max_diagnostics: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_snippet_bytes: 64 * 1024,
            max_nesting: 96,
            max_steps: 1_000_000,
            max_vertices: 2_000_000,
            max_parts: 4096,
            max_nodes: 4096,
            max_divisions: 256,
            max_string_len: 64 * 1024,
            max_heap_bytes: 64 * 1024 * 1024,
            max_array_len: 65_536,
            max_diagnostics: 32,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config, filling omitted fields with defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = EngineConfig::from_json(r#"{ "max_steps": 10 }"#).unwrap();
        assert_eq!(cfg.max_steps, 10);
        assert_eq!(cfg.max_parts, EngineConfig::default().max_parts);
    }

    #[test]
    fn test_empty_json_is_default() {
        let cfg = EngineConfig::from_json("{}").unwrap();
        assert_eq!(cfg, EngineConfig::default());
    }
}
