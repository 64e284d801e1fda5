use moddiff_patch::PatchConfig;
use serde::{Deserialize, Serialize};

/// Configuration for a [`DiffHandler`](crate::DiffHandler).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Passed to every patcher the handler creates.
    pub patch: PatchConfig,
}

impl HandlerConfig {
    pub fn with_patch(patch: PatchConfig) -> Self {
        Self { patch }
    }
}
