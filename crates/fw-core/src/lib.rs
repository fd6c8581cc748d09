//! Core types for Fusewarden: identities, geometry, and the host boundary.
//!
//! This crate defines everything the coordination core exchanges with the
//! game host: entity identities, world coordinates, block identities, the
//! [`WorldQuery`]/[`WorldMutation`] collaborator traits, and the persisted
//! [`AdminConfig`] record with its [`ConfigStore`]. [`MemoryWorld`] is a
//! headless host for tests and offline tooling.

/// Block identity values.
pub mod block;
/// Persisted administrative configuration.
pub mod config;
/// Entity identifiers.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// World coordinates: continuous points and discrete blocks.
pub mod geometry;
/// Collaborator traits implemented by the game host.
pub mod host;
/// In-memory host that records mutations.
pub mod memory;
/// Get/put storage of the config blob.
pub mod store;

/// Re-export block identity.
pub use block::BlockId;
/// Re-export config types.
pub use config::{AdminConfig, MAX_RADIUS, MIN_RADIUS, RegionCenter, RegionMode};
/// Re-export entity identity.
pub use entity::EntityId;
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export geometry types.
pub use geometry::{Axis, BlockPos, Vec3};
/// Re-export host traits.
pub use host::{GameMode, WorldHost, WorldMutation, WorldQuery};
/// Re-export the in-memory host.
pub use memory::{MemoryEntity, MemoryWorld, WorldRecord};
/// Re-export config stores.
pub use store::{ConfigStore, JsonFileStore, MemoryStore, load_config, save_config};
