use std::collections::HashMap;

use crate::block::BlockId;
use crate::entity::EntityId;
use crate::error::{CoreError, CoreResult};
use crate::geometry::{BlockPos, Vec3};
use crate::host::{GameMode, WorldMutation, WorldQuery};

/// Live state of one entity in a [`MemoryWorld`].
#[derive(Debug, Clone)]
pub struct MemoryEntity {
    /// Display name (players only need one).
    pub name: String,
    /// Feet position.
    pub position: Vec3,
    /// Unit look direction.
    pub orientation: Vec3,
    /// Whether the use-action is held.
    pub using_item: bool,
    /// Current game mode.
    pub mode: GameMode,
    /// Overlay text, empty when cleared.
    pub display_text: String,
}

impl MemoryEntity {
    /// An entity standing at `position`, looking north.
    pub fn at(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
            orientation: Vec3::new(0.0, 0.0, -1.0),
            using_item: false,
            mode: GameMode::Survival,
            display_text: String::new(),
        }
    }
}

/// One recorded mutation, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldRecord {
    /// A block was replaced.
    BlockSet {
        /// Where.
        pos: BlockPos,
        /// The new block.
        block: BlockId,
    },
    /// An explosion effect was applied.
    Explosion {
        /// Center block.
        pos: BlockPos,
        /// Effect strength.
        power: f32,
    },
    /// A message went to everyone.
    Broadcast(String),
    /// A message went to one entity.
    Message {
        /// Recipient.
        to: EntityId,
        /// Text.
        text: String,
    },
    /// An entity's game mode changed.
    ModeChanged {
        /// Whose mode.
        entity: EntityId,
        /// The new mode.
        mode: GameMode,
    },
}

/// Headless host that keeps the world in memory and records every mutation.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorld {
    entities: HashMap<EntityId, MemoryEntity>,
    blocks: HashMap<BlockPos, BlockId>,
    by_name_lower: HashMap<String, EntityId>,
    records: Vec<WorldRecord>,
}

impl MemoryWorld {
    /// An empty world where every block is air.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Entities
    // -----------------------------------------------------------------------

    /// Add an entity. Names are unique case-insensitively.
    pub fn add_entity(&mut self, entity: MemoryEntity) -> CoreResult<EntityId> {
        let name_lower = entity.name.to_lowercase();
        if self.by_name_lower.contains_key(&name_lower) {
            return Err(CoreError::Validation(format!(
                "entity already exists: \"{}\"",
                entity.name
            )));
        }
        let id = EntityId::new();
        self.by_name_lower.insert(name_lower, id);
        self.entities.insert(id, entity);
        Ok(id)
    }

    /// Remove an entity (logout, despawn).
    pub fn remove_entity(&mut self, id: EntityId) -> Option<MemoryEntity> {
        let entity = self.entities.remove(&id)?;
        self.by_name_lower.remove(&entity.name.to_lowercase());
        Some(entity)
    }

    /// Get an entity by ID.
    pub fn entity(&self, id: EntityId) -> Option<&MemoryEntity> {
        self.entities.get(&id)
    }

    /// Get a mutable entity by ID.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut MemoryEntity> {
        self.entities.get_mut(&id)
    }

    /// Find an entity ID by name (case-insensitive).
    pub fn find_id_by_name(&self, name: &str) -> Option<EntityId> {
        self.by_name_lower.get(&name.to_lowercase()).copied()
    }

    /// Move an entity. Returns false if it does not exist.
    pub fn move_to(&mut self, id: EntityId, position: Vec3) -> bool {
        match self.entities.get_mut(&id) {
            Some(e) => {
                e.position = position;
                true
            }
            None => false,
        }
    }

    /// Turn an entity. Returns false if it does not exist.
    pub fn look(&mut self, id: EntityId, orientation: Vec3) -> bool {
        match self.entities.get_mut(&id) {
            Some(e) => {
                e.orientation = orientation;
                true
            }
            None => false,
        }
    }

    /// Start or stop an entity's use-action.
    pub fn set_using(&mut self, id: EntityId, using: bool) -> bool {
        match self.entities.get_mut(&id) {
            Some(e) => {
                e.using_item = using;
                true
            }
            None => false,
        }
    }

    /// Number of entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // -----------------------------------------------------------------------
    // Blocks
    // -----------------------------------------------------------------------

    /// Place a block without recording it as a mutation (world setup).
    pub fn put_block(&mut self, pos: BlockPos, block: BlockId) {
        if block.is_air() {
            self.blocks.remove(&pos);
        } else {
            self.blocks.insert(pos, block);
        }
    }

    // -----------------------------------------------------------------------
    // Recorded mutations
    // -----------------------------------------------------------------------

    /// Every mutation, in call order.
    pub fn records(&self) -> &[WorldRecord] {
        &self.records
    }

    /// Explosions applied so far.
    pub fn explosions(&self) -> Vec<(BlockPos, f32)> {
        self.records
            .iter()
            .filter_map(|r| match r {
                WorldRecord::Explosion { pos, power } => Some((*pos, *power)),
                _ => None,
            })
            .collect()
    }

    /// Broadcast messages sent so far.
    pub fn broadcasts(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter_map(|r| match r {
                WorldRecord::Broadcast(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Messages sent to one entity.
    pub fn messages_to(&self, id: EntityId) -> Vec<&str> {
        self.records
            .iter()
            .filter_map(|r| match r {
                WorldRecord::Message { to, text } if *to == id => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Mode changes applied to one entity.
    pub fn mode_changes(&self, id: EntityId) -> Vec<GameMode> {
        self.records
            .iter()
            .filter_map(|r| match r {
                WorldRecord::ModeChanged { entity, mode } if *entity == id => Some(*mode),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded mutations.
    pub fn clear_records(&mut self) {
        self.records.clear();
    }
}

impl WorldQuery for MemoryWorld {
    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.entities.get(&entity).map(|e| e.position)
    }

    fn orientation(&self, entity: EntityId) -> Option<Vec3> {
        self.entities.get(&entity).map(|e| e.orientation)
    }

    fn block_at(&self, pos: BlockPos) -> BlockId {
        self.blocks.get(&pos).cloned().unwrap_or_default()
    }

    fn is_using_item(&self, entity: EntityId) -> bool {
        self.entities.get(&entity).is_some_and(|e| e.using_item)
    }

    fn player_name(&self, entity: EntityId) -> Option<String> {
        self.entities.get(&entity).map(|e| e.name.clone())
    }
}

impl WorldMutation for MemoryWorld {
    fn set_block(&mut self, pos: BlockPos, block: BlockId) {
        self.put_block(pos, block.clone());
        self.records.push(WorldRecord::BlockSet { pos, block });
    }

    fn trigger_explosion(&mut self, pos: BlockPos, power: f32) {
        self.records.push(WorldRecord::Explosion { pos, power });
    }

    fn set_display_text(&mut self, entity: EntityId, text: &str) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.display_text = text.to_string();
        }
    }

    fn broadcast(&mut self, message: &str) {
        self.records.push(WorldRecord::Broadcast(message.to_string()));
    }

    fn send_message(&mut self, entity: EntityId, message: &str) {
        self.records.push(WorldRecord::Message {
            to: entity,
            text: message.to_string(),
        });
    }

    fn set_game_mode(&mut self, entity: EntityId, mode: GameMode) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.mode = mode;
        }
        self.records.push(WorldRecord::ModeChanged { entity, mode });
    }
}
