use std::collections::HashMap;

use tracing::{debug, info, warn};

use fw_core::{BlockId, BlockPos, EntityId, WorldHost};

use crate::clock::seconds_ceil;
use crate::config::DeviceConfig;
use crate::context::TickContext;
use crate::device::PlacementAuthority;
use crate::device::session::{DeviceSession, SessionState};
use crate::device::snapshot::{EntitySnapshot, validate};
use crate::error::{RuntimeError, RuntimeResult};
use crate::event::{InvalidationReason, RuntimeEventKind};

/// Result of comparing an arming entity against its snapshot.
#[derive(Debug, Clone, PartialEq)]
enum Inspection {
    Passed,
    Failed(InvalidationReason),
    Unavailable,
}

fn inspect(world: &dyn WorldHost, session: &DeviceSession, config: &DeviceConfig) -> Inspection {
    let entity = session.entity();
    let Some(current) = EntitySnapshot::capture(world, entity) else {
        return Inspection::Unavailable;
    };
    if !world.is_using_item(entity) {
        return Inspection::Failed(InvalidationReason::UseReleased);
    }
    match validate(session.snapshot(), &current, &config.tolerance) {
        Ok(()) => Inspection::Passed,
        Err(drift) => Inspection::Failed(InvalidationReason::Drift(drift.to_string())),
    }
}

/// World-authoritative owner of every device session.
///
/// Sessions are keyed by entity; placed devices are additionally indexed by
/// block so a broken-block signal can find its session.
#[derive(Debug)]
pub struct DeviceAuthority {
    config: DeviceConfig,
    sessions: HashMap<EntityId, DeviceSession>,
    devices: HashMap<BlockPos, EntityId>,
}

impl DeviceAuthority {
    /// An authority with no sessions.
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
            devices: HashMap::new(),
        }
    }

    /// Session tuning.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// The session owned by `entity`.
    pub fn session(&self, entity: EntityId) -> Option<&DeviceSession> {
        self.sessions.get(&entity)
    }

    /// State of `entity`'s session, `Idle` if none.
    pub fn state_of(&self, entity: EntityId) -> SessionState {
        self.sessions
            .get(&entity)
            .map_or(SessionState::Idle, DeviceSession::state)
    }

    /// Owner of the device at `pos`.
    pub fn device_at(&self, pos: BlockPos) -> Option<EntityId> {
        self.devices.get(&pos).copied()
    }

    /// Number of live sessions.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn session_in(&mut self, entity: EntityId, state: SessionState) -> RuntimeResult<&mut DeviceSession> {
        let session = self
            .sessions
            .get_mut(&entity)
            .ok_or(RuntimeError::NoSession(entity))?;
        session.expect_state(state)?;
        Ok(session)
    }

    // -----------------------------------------------------------------------
    // Arming
    // -----------------------------------------------------------------------

    /// `Idle -> Arming`. Rejected if a session exists or the entity is not
    /// standing on the target block.
    pub fn arm(&mut self, ctx: &mut TickContext<'_>, entity: EntityId) -> RuntimeResult<()> {
        if self.sessions.contains_key(&entity) {
            return Err(RuntimeError::SessionExists(entity));
        }
        let snapshot = EntitySnapshot::capture(&*ctx.world, entity)
            .ok_or(RuntimeError::EntityUnavailable(entity))?;

        let found = ctx.world.block_at(snapshot.support);
        if found != self.config.target_block {
            return Err(RuntimeError::TargetMismatch {
                at: snapshot.support,
                found,
                expected: self.config.target_block.clone(),
            });
        }

        let session = DeviceSession::begin(entity, snapshot, ctx.scheduler, &self.config);
        self.sessions.insert(entity, session);

        info!(%entity, support = %snapshot.support, "arming started");
        ctx.world.set_display_text(entity, "Arming... hold still");
        ctx.emit(
            RuntimeEventKind::ArmingStarted {
                entity,
                support: snapshot.support,
            },
            format!("{entity} started arming on {}", snapshot.support),
        );
        Ok(())
    }

    /// Periodic hold-still check. Drift or a released use-action
    /// invalidates the session; an unavailable entity skips this check.
    pub fn revalidate(&mut self, ctx: &mut TickContext<'_>, entity: EntityId) -> RuntimeResult<()> {
        let config = &self.config;
        let session = self
            .sessions
            .get_mut(&entity)
            .ok_or(RuntimeError::NoSession(entity))?;
        session.expect_state(SessionState::Arming)?;

        match inspect(&*ctx.world, session, config) {
            Inspection::Passed => {
                session.record_check();
                Ok(())
            }
            Inspection::Unavailable => {
                warn!(%entity, tick = ctx.now(), "entity unavailable during hold-still check, skipping");
                Ok(())
            }
            Inspection::Failed(reason) => {
                self.invalidate(ctx, entity, reason);
                Ok(())
            }
        }
    }

    /// The arming duration elapsed: run the final check. Returns true when
    /// the device is ready for placement.
    pub fn complete_arming(&mut self, ctx: &mut TickContext<'_>, entity: EntityId) -> RuntimeResult<bool> {
        let config = &self.config;
        let session = self
            .sessions
            .get_mut(&entity)
            .ok_or(RuntimeError::NoSession(entity))?;
        session.expect_state(SessionState::Arming)?;

        let reason = match inspect(&*ctx.world, session, config) {
            Inspection::Passed => {
                session.mark_ready();
                debug!(%entity, checks = session.checks_passed(), "arming complete");
                return Ok(true);
            }
            Inspection::Unavailable => InvalidationReason::EntityUnavailable,
            Inspection::Failed(reason) => reason,
        };
        self.invalidate(ctx, entity, reason);
        Ok(false)
    }

    /// Drop a session that finished arming but was never placed. Returns
    /// true if one was dropped.
    pub fn abandon_unplaced(&mut self, ctx: &mut TickContext<'_>, entity: EntityId) -> bool {
        if self.state_of(entity) != SessionState::Arming {
            return false;
        }
        warn!(%entity, tick = ctx.now(), "armed device was never placed");
        self.invalidate(ctx, entity, InvalidationReason::PlacementFailed);
        true
    }

    /// End an arming session without placing anything.
    fn invalidate(&mut self, ctx: &mut TickContext<'_>, entity: EntityId, reason: InvalidationReason) {
        let Some(mut session) = self.sessions.remove(&entity) else {
            return;
        };
        session.finish(SessionState::Invalidated, ctx.scheduler);

        info!(%entity, %reason, "arming invalidated");
        ctx.world.set_display_text(entity, "");
        ctx.world
            .send_message(entity, &format!("Arming interrupted: {reason}"));
        ctx.emit(
            RuntimeEventKind::ArmingInvalidated {
                entity,
                reason: reason.clone(),
            },
            format!("{entity} arming invalidated: {reason}"),
        );
    }

    // -----------------------------------------------------------------------
    // Placement and countdown
    // -----------------------------------------------------------------------

    /// `Arming -> Placed`: put the device at the entity's feet and start the fuse.
    pub fn place(&mut self, ctx: &mut TickContext<'_>, entity: EntityId) -> RuntimeResult<BlockPos> {
        let config = &self.config;
        let session = self
            .sessions
            .get_mut(&entity)
            .ok_or(RuntimeError::NoSession(entity))?;

        let at = EntitySnapshot::capture(&*ctx.world, entity)
            .map_or_else(|| session.snapshot().feet(), |s| s.feet());
        session.place(at, ctx.scheduler, config)?;

        ctx.world.set_block(at, config.device_block.clone());
        self.devices.insert(at, entity);

        let secs = seconds_ceil(config.fuse_ticks);
        info!(%entity, %at, fuse = config.fuse_ticks, "device placed");
        ctx.world.set_display_text(entity, &format!("{secs}s"));
        ctx.world
            .broadcast(&format!("A device was planted at {at}. Detonation in {secs}s"));
        ctx.emit(
            RuntimeEventKind::DevicePlaced { entity, at },
            format!("{entity} placed a device at {at}"),
        );
        Ok(at)
    }

    /// Countdown broadcast. Suppressed once the fuse reaches zero.
    pub fn countdown(&mut self, ctx: &mut TickContext<'_>, entity: EntityId) -> RuntimeResult<()> {
        let fuse = self.config.fuse_ticks;
        let now = ctx.now();
        let session = self.session_in(entity, SessionState::Placed)?;
        let remaining = session.remaining(now, fuse);
        if remaining == 0 {
            return Ok(());
        }

        let secs = seconds_ceil(remaining);
        ctx.world.set_display_text(entity, &format!("{secs}s"));
        ctx.world.broadcast(&format!("Device detonates in {secs}s"));
        ctx.emit(
            RuntimeEventKind::CountdownBroadcast { entity, remaining },
            format!("{entity}'s device: {secs}s left"),
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Terminal transitions
    // -----------------------------------------------------------------------

    /// `Placed -> Detonated`. If the device block is gone, the explosion is
    /// skipped and the session is simply cleared.
    pub fn detonate(&mut self, ctx: &mut TickContext<'_>, entity: EntityId) -> RuntimeResult<()> {
        let record = self
            .session_in(entity, SessionState::Placed)?
            .explosion()
            .ok_or(RuntimeError::WrongState {
                entity,
                expected: "placed",
                actual: "placed without device",
            })?;
        let Some(mut session) = self.sessions.remove(&entity) else {
            return Err(RuntimeError::NoSession(entity));
        };
        self.devices.remove(&record.at);

        ctx.world.set_display_text(entity, "");
        if ctx.world.block_at(record.at) != self.config.device_block {
            session.finish(SessionState::Defused, ctx.scheduler);
            debug!(%entity, at = %record.at, "device already gone at detonation, skipping");
            ctx.emit(
                RuntimeEventKind::DetonationSkipped {
                    entity,
                    at: record.at,
                },
                format!("{entity}'s device at {} was already gone", record.at),
            );
            return Ok(());
        }

        session.finish(SessionState::Detonated, ctx.scheduler);
        ctx.world.set_block(record.at, BlockId::air());
        ctx.world.trigger_explosion(record.at, record.power);
        info!(%entity, at = %record.at, power = record.power, "device detonated");
        ctx.emit(
            RuntimeEventKind::Detonated {
                entity,
                at: record.at,
            },
            format!("{entity}'s device detonated at {}", record.at),
        );
        Ok(())
    }

    /// `Placed -> Defused` when the device block is broken. Returns false if
    /// no device sits at `pos`.
    pub fn on_block_broken(&mut self, ctx: &mut TickContext<'_>, pos: BlockPos) -> bool {
        let Some(entity) = self.devices.remove(&pos) else {
            return false;
        };
        let Some(mut session) = self.sessions.remove(&entity) else {
            return false;
        };
        session.finish(SessionState::Defused, ctx.scheduler);

        info!(%entity, at = %pos, "device defused");
        ctx.world.set_display_text(entity, "");
        ctx.world
            .broadcast(&format!("The device at {pos} was neutralized"));
        ctx.emit(
            RuntimeEventKind::Defused { entity, at: pos },
            format!("{entity}'s device at {pos} was defused"),
        );
        true
    }
}

impl PlacementAuthority for DeviceAuthority {
    fn begin_arming(&mut self, ctx: &mut TickContext<'_>, entity: EntityId) -> RuntimeResult<()> {
        self.arm(ctx, entity)
    }

    fn place_device(&mut self, ctx: &mut TickContext<'_>, entity: EntityId) -> RuntimeResult<BlockPos> {
        self.place(ctx, entity)
    }
}
