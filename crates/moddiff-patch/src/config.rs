use serde::{Deserialize, Serialize};

/// Knobs for [`DiffPatcher`](crate::DiffPatcher).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    /// Fail on fields the class does not declare instead of skipping them.
    pub strict_fields: bool,
    /// Set text fields to null on removal. When off, a removal leaves the
    /// existing text in place.
    pub clear_removed_text: bool,
}

impl PatchConfig {
    /// Reject diffs that name undeclared fields.
    pub fn strict() -> Self {
        Self {
            strict_fields: true,
            ..Default::default()
        }
    }
}
