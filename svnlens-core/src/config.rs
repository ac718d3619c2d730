//! Query configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::properties::svn_props;

/// Tunables for the query layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Context lines around each diff hunk
    pub diff_context: usize,
    /// Leading bytes scanned for NUL when deciding if content is binary
    pub binary_sniff_len: usize,
    /// MIME type reported when a path has no `svn:mime-type`
    pub default_mime_type: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            diff_context: 3,
            binary_sniff_len: 8000,
            default_mime_type: svn_props::DEFAULT_MIME_TYPE.to_string(),
        }
    }
}

impl QueryConfig {
    /// Load from a TOML file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
