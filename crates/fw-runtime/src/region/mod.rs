//! Presence tracking for the administered region.

mod bounds;
mod presence;
mod warden;

pub use bounds::BoundaryCache;
pub use presence::{CheckOutcome, Crossing, Presence, PresenceTracker};
pub use warden::RegionWarden;
