use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where the host keeps group containers.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Default,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    /// Hidden collection inside the current scene.
    #[default]
    Collection,
    /// Dedicated scene holding every group's content (legacy layout).
    SeparateScene,
}

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema,
)]
#[schemars(title = "Storage", inline)]
#[serde(default)]
/// Container storage policy handed to the host on allocation.
pub struct StorageOptions {
    /// Storage layout for newly created groups. Existing groups keep the
    /// layout they were created with.
    #[schemars(title = "Storage Mode")]
    pub mode: StorageMode,
}
