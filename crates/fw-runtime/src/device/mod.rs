//! Timed explosive device sessions: arming, placement, countdown and the
//! terminal transitions.

mod authority;
mod session;
mod snapshot;

pub use authority::DeviceAuthority;
pub use session::{DeviceSession, ExplosionRecord, SessionState};
pub use snapshot::{Drift, EntitySnapshot, Tolerance, support_block, validate};

use fw_core::{BlockPos, EntityId};

use crate::context::TickContext;
use crate::error::RuntimeResult;

/// The side that owns device state.
///
/// Bus handlers reach the sessions only through this trait, so a host that
/// splits client and server can put the implementation on the server alone.
pub trait PlacementAuthority {
    /// Start an arming session for `entity`.
    fn begin_arming(&mut self, ctx: &mut TickContext<'_>, entity: EntityId) -> RuntimeResult<()>;

    /// Place the device for a session whose arming completed.
    fn place_device(&mut self, ctx: &mut TickContext<'_>, entity: EntityId) -> RuntimeResult<BlockPos>;
}
