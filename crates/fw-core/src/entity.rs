use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable unique identity of a live entity (players included).
///
/// Used as the key for device sessions and presence bookkeeping, so it must
/// not change for the lifetime of the entity in the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Generate a new random entity ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Build a deterministic ID from a 128-bit value.
    pub fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(EntityId::new(), EntityId::new());
    }

    #[test]
    fn display_is_short_prefix() {
        let id = EntityId::from_u128(0x1234_5678_9abc_def0_0000_0000_0000_0001);
        assert_eq!(id.to_string(), "12345678");
    }

    #[test]
    fn from_u128_is_deterministic() {
        assert_eq!(EntityId::from_u128(7), EntityId::from_u128(7));
    }
}
