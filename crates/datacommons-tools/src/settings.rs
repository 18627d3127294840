//! Export settings.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// How exported files are named and written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExportSettings {
    #[serde(default = "default_config_file_name")]
    pub config_file_name: String,

    /// File name used for the default metadata scope.
    #[serde(default = "default_metadata_file_name")]
    pub metadata_file_name: String,

    /// Truncate existing metadata files; append to them when false.
    #[serde(default = "default_true")]
    pub overwrite_metadata: bool,

    #[serde(default = "default_true")]
    pub pretty_json: bool,
}

fn default_config_file_name() -> String {
    "config.json".to_string()
}

fn default_metadata_file_name() -> String {
    crate::store::DEFAULT_METADATA_SCOPE.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            config_file_name: default_config_file_name(),
            metadata_file_name: default_metadata_file_name(),
            overwrite_metadata: true,
            pretty_json: true,
        }
    }
}

impl ExportSettings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }
}
