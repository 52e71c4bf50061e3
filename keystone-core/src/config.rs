//! Runtime Configuration
//!
//! A [`GraphConfig`] controls how dependency key-paths are parsed. The
//! defaults suit most object graphs; a config can also be loaded from JSON:
//!
//! ```rust
//! use keystone_core::GraphConfig;
//!
//! let config = GraphConfig::from_json(r#"{ "max_key_path_depth": 4 }"#).unwrap();
//! assert_eq!(config.max_key_path_depth, 4);
//! assert!(config.brace_expansion);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Default limit on the number of segments in a dependency key-path.
pub const DEFAULT_MAX_KEY_PATH_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    /// Maximum number of dot-separated segments in a dependency key-path.
    pub max_key_path_depth: usize,

    /// Expand `a.{b,c}` dependency patterns into `a.b` and `a.c`.
    pub brace_expansion: bool,
}

impl GraphConfig {
    /// Parse and validate a config from a JSON document.
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the config describes a usable runtime.
    pub fn validate(&self) -> Result<()> {
        if self.max_key_path_depth == 0 {
            return Err(GraphError::InvalidConfig(
                "max_key_path_depth must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_key_path_depth: DEFAULT_MAX_KEY_PATH_DEPTH,
            brace_expansion: true,
        }
    }
}
