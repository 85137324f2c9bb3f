//! Runtime options with TOML preset support.
//!
//! Storage policy, group naming and transform tolerance are consolidated
//! here. Options serialize to/from TOML so a studio can ship presets.

mod naming;
mod storage;
mod transform;

use std::path::Path;

pub use naming::NamingOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use storage::{StorageMode, StorageOptions};
pub use transform::TransformOptions;

use crate::error::GroupError;

/// Top-level options container. Each section maps to a TOML table.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Container storage policy.
    pub storage: StorageOptions,
    /// Group naming.
    pub naming: NamingOptions,
    /// Transform capture tolerance.
    pub transform: TransformOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, GroupError> {
        let content = std::fs::read_to_string(path).map_err(GroupError::Io)?;
        toml::from_str(&content)
            .map_err(|e| GroupError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), GroupError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GroupError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(GroupError::Io)?;
        }
        std::fs::write(path, content).map_err(GroupError::Io)
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) =
                        path.file_stem().and_then(|s| s.to_str())
                    {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }
}
