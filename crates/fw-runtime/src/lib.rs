//! Tick-driven coordination core for Fusewarden.
//!
//! A [`Coordinator`] owns every piece of runtime state: the discrete-time
//! [`Scheduler`], the single-handler [`EventBus`], the device sessions held
//! by the [`DeviceAuthority`], and the region presence cache held by the
//! [`RegionWarden`]. The host drives it with one [`Coordinator::step`] per
//! world tick and forwards use-actions, broken blocks, logins and
//! administrative commands through its hooks. Nothing here blocks or spawns
//! threads.

/// Administrative command parsing and execution.
pub mod admin;
/// Synchronous single-handler publish/subscribe registry.
pub mod bus;
/// Tick counter and tick/second conversion.
pub mod clock;
/// Tuning for device sessions and the coordinator.
pub mod config;
/// Mutable context passed to subsystems during a tick or hook.
pub mod context;
/// The owner of all runtime state and the host-facing entry points.
pub mod coordinator;
/// Device sessions: arming, placement, countdown, detonation.
pub mod device;
/// Error types for the runtime crate.
pub mod error;
/// Runtime event types and the event log.
pub mod event;
/// Region bounds, presence cache and the warden applying them.
pub mod region;
/// Discrete-time timer registry.
pub mod scheduler;
/// Timer payloads dispatched by the coordinator.
pub mod task;

/// Re-exports of the admin surface.
pub use admin::{AdminCommand, AdminError, CommandOutcome};
/// Re-exports of [`bus::EventBus`] and its topic names.
pub use bus::{EventBus, Topic, topics};
/// Re-exports of the tick types.
pub use clock::{TICKS_PER_SECOND, Tick, TickClock};
/// Re-exports of [`config::RuntimeConfig`] and [`config::DeviceConfig`].
pub use config::{DeviceConfig, RuntimeConfig};
/// Re-export of [`context::TickContext`].
pub use context::TickContext;
/// Re-exports of [`coordinator::Coordinator`] and its handler state.
pub use coordinator::{Coordinator, RuntimeState};
/// Re-exports of the device types.
pub use device::{
    DeviceAuthority, DeviceSession, Drift, EntitySnapshot, ExplosionRecord, PlacementAuthority,
    SessionState, Tolerance,
};
/// Re-exports of [`error::RuntimeError`] and [`error::RuntimeResult`].
pub use error::{RuntimeError, RuntimeResult};
/// Re-exports of the event log types.
pub use event::{EventLog, InvalidationReason, RuntimeEvent, RuntimeEventKind};
/// Re-exports of the region types.
pub use region::{BoundaryCache, Crossing, PresenceTracker, RegionWarden};
/// Re-exports of [`scheduler::Scheduler`] and its handles.
pub use scheduler::{Recurrence, Scheduler, TimerHandle};
/// Re-export of [`task::Task`].
pub use task::Task;
