use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::transform::DEFAULT_TOLERANCE;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Transform", inline)]
#[serde(default)]
/// Numeric policy for transform capture.
pub struct TransformOptions {
    /// Per-component tolerance. Edits smaller than this are not written
    /// back into a member's local transform.
    #[schemars(title = "Tolerance", range(min = 0.0, max = 0.01))]
    pub tolerance: f64,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}
