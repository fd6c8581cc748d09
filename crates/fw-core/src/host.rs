//! Collaborator traits implemented by the game host.
//!
//! The coordination core never talks to the game directly: every read goes
//! through [`WorldQuery`] and every mutation through [`WorldMutation`].
//! Returning `None` from a query means the host could not answer for that
//! entity right now (offline, unloaded, despawned).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::block::BlockId;
use crate::entity::EntityId;
use crate::geometry::{BlockPos, Vec3};

/// Player game mode as understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Unrestricted mode players hold outside the region.
    #[default]
    Survival,
    /// Restricted: may interact but not build or break.
    Adventure,
    /// Restricted: observe only.
    Spectator,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Survival => write!(f, "survival"),
            Self::Adventure => write!(f, "adventure"),
            Self::Spectator => write!(f, "spectator"),
        }
    }
}

/// Read access to entity and world state.
pub trait WorldQuery {
    /// Feet position of an entity.
    fn position(&self, entity: EntityId) -> Option<Vec3>;

    /// Unit look direction of an entity.
    fn orientation(&self, entity: EntityId) -> Option<Vec3>;

    /// Identity of the block at a coordinate.
    fn block_at(&self, pos: BlockPos) -> BlockId;

    /// Whether the entity is still holding its use-action.
    fn is_using_item(&self, entity: EntityId) -> bool;

    /// Display name of a player, used for whitelist matching.
    fn player_name(&self, entity: EntityId) -> Option<String>;
}

/// Write access to the world.
pub trait WorldMutation {
    /// Replace the block at a coordinate.
    fn set_block(&mut self, pos: BlockPos, block: BlockId);

    /// Apply an explosion effect centered on a block.
    fn trigger_explosion(&mut self, pos: BlockPos, power: f32);

    /// Set the overlay text shown to one entity. An empty string clears it.
    fn set_display_text(&mut self, entity: EntityId, text: &str);

    /// Send a chat message to every connected player.
    fn broadcast(&mut self, message: &str);

    /// Send a chat message to one entity.
    fn send_message(&mut self, entity: EntityId, message: &str);

    /// Switch a player's game mode.
    fn set_game_mode(&mut self, entity: EntityId, mode: GameMode);
}

/// A full host: queries plus mutations.
pub trait WorldHost: WorldQuery + WorldMutation {}

impl<T: WorldQuery + WorldMutation> WorldHost for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_mode_serializes_snake_case() {
        let json = serde_json::to_string(&GameMode::Spectator).unwrap();
        assert_eq!(json, "\"spectator\"");
    }

    #[test]
    fn default_mode_is_unrestricted() {
        assert_eq!(GameMode::default(), GameMode::Survival);
    }
}
