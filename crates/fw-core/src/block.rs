use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a block type as reported by the host (e.g. `"target"`).
///
/// Comparison is exact; the host is responsible for canonical names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub String);

impl BlockId {
    /// Name the host uses for an empty block.
    pub const AIR_NAME: &'static str = "air";

    /// Create a block identity from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The empty block.
    pub fn air() -> Self {
        Self::new(Self::AIR_NAME)
    }

    /// Returns true for the empty block.
    pub fn is_air(&self) -> bool {
        self.0 == Self::AIR_NAME
    }

    /// The block name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::air()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
