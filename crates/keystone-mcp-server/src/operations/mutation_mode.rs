use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Clone, Default, Debug, Deserialize, Serialize, PartialEq, Eq, Copy, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MutationMode {
    /// Don't expose any mutations
    None,
    /// Expose the hand-declared model mutations only
    #[default]
    Explicit,
    /// Also expose schema mutation fields and allow ad hoc mutations
    All,
}

impl MutationMode {
    /// Whether hand-declared mutation tools are exposed
    pub fn allows_explicit(self) -> bool {
        !matches!(self, MutationMode::None)
    }

    /// Whether mutations built from the schema or by the caller are allowed
    pub fn allows_all(self) -> bool {
        matches!(self, MutationMode::All)
    }
}
