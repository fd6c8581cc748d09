use std::fmt;

use fw_core::{BlockPos, EntityId};

use crate::clock::Tick;
use crate::config::DeviceConfig;
use crate::device::snapshot::EntitySnapshot;
use crate::error::{RuntimeError, RuntimeResult};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::task::Task;

/// Lifecycle of one device session.
///
/// `Idle` means no session exists. `Detonated`, `Defused` and `Invalidated`
/// are terminal: a session reaching them is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No session.
    Idle,
    /// Holding still until the arming duration elapses.
    Arming,
    /// Device in the world, fuse burning.
    Placed,
    /// Exploded.
    Detonated,
    /// Removed before the fuse ran out.
    Defused,
    /// Arming failed; no device was placed.
    Invalidated,
}

impl SessionState {
    /// Lowercase state name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Arming => "arming",
            Self::Placed => "placed",
            Self::Detonated => "detonated",
            Self::Defused => "defused",
            Self::Invalidated => "invalidated",
        }
    }

    /// Whether the session ends in this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Detonated | Self::Defused | Self::Invalidated)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a placed device will explode and how hard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplosionRecord {
    /// Device block.
    pub at: BlockPos,
    /// Explosion strength.
    pub power: f32,
}

/// One entity's device, from arming to its terminal state.
#[derive(Debug, Clone)]
pub struct DeviceSession {
    entity: EntityId,
    snapshot: EntitySnapshot,
    state: SessionState,
    started_at: Tick,
    checks_passed: u32,
    ready: bool,
    placed_at: Option<Tick>,
    explosion: Option<ExplosionRecord>,
    revalidate: Option<TimerHandle>,
    completion: Option<TimerHandle>,
    countdown: Option<TimerHandle>,
    detonation: Option<TimerHandle>,
}

impl DeviceSession {
    /// Start arming: take ownership of the snapshot and register the
    /// hold-still check and completion timers.
    pub fn begin(
        entity: EntityId,
        snapshot: EntitySnapshot,
        scheduler: &mut Scheduler<Task>,
        config: &DeviceConfig,
    ) -> Self {
        let revalidate =
            scheduler.schedule_repeating(config.validation_period, Task::Revalidate(entity));
        let completion = scheduler.schedule_once(config.arming_ticks, Task::CompleteArming(entity));
        Self {
            entity,
            snapshot,
            state: SessionState::Arming,
            started_at: scheduler.now(),
            checks_passed: 0,
            ready: false,
            placed_at: None,
            explosion: None,
            revalidate: Some(revalidate),
            completion: Some(completion),
            countdown: None,
            detonation: None,
        }
    }

    /// Session owner.
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// The reading captured when arming started.
    pub fn snapshot(&self) -> &EntitySnapshot {
        &self.snapshot
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Tick arming started.
    pub fn started_at(&self) -> Tick {
        self.started_at
    }

    /// Periodic hold-still checks passed so far.
    pub fn checks_passed(&self) -> u32 {
        self.checks_passed
    }

    /// Tick the device was placed.
    pub fn placed_at(&self) -> Option<Tick> {
        self.placed_at
    }

    /// Explosion parameters, once placed.
    pub fn explosion(&self) -> Option<ExplosionRecord> {
        self.explosion
    }

    /// Ticks left on the fuse at `now`. Zero before placement.
    pub fn remaining(&self, now: Tick, fuse_ticks: Tick) -> Tick {
        match self.placed_at {
            Some(placed) => fuse_ticks.saturating_sub(now.saturating_sub(placed)),
            None => 0,
        }
    }

    pub(crate) fn expect_state(&self, expected: SessionState) -> RuntimeResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RuntimeError::WrongState {
                entity: self.entity,
                expected: expected.name(),
                actual: self.state.name(),
            })
        }
    }

    pub(crate) fn record_check(&mut self) {
        self.checks_passed += 1;
    }

    /// The completion check passed; placement may proceed.
    pub(crate) fn mark_ready(&mut self) {
        self.completion = None;
        self.ready = true;
    }

    /// Whether the completion check passed.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// `Arming -> Placed`: stop hold-still checks, start the countdown
    /// broadcast and the detonation timer.
    pub(crate) fn place(
        &mut self,
        at: BlockPos,
        scheduler: &mut Scheduler<Task>,
        config: &DeviceConfig,
    ) -> RuntimeResult<()> {
        self.expect_state(SessionState::Arming)?;
        if !self.ready {
            return Err(RuntimeError::WrongState {
                entity: self.entity,
                expected: "arming (validated)",
                actual: self.state.name(),
            });
        }
        if let Some(handle) = self.revalidate.take() {
            scheduler.cancel(handle);
        }
        self.countdown = Some(
            scheduler.schedule_repeating(config.broadcast_period, Task::Countdown(self.entity)),
        );
        self.detonation = Some(scheduler.schedule_once(config.fuse_ticks, Task::Detonate(self.entity)));
        self.placed_at = Some(scheduler.now());
        self.explosion = Some(ExplosionRecord {
            at,
            power: config.power,
        });
        self.state = SessionState::Placed;
        Ok(())
    }

    /// Enter a terminal state and cancel every timer the session holds.
    pub(crate) fn finish(&mut self, terminal: SessionState, scheduler: &mut Scheduler<Task>) {
        debug_assert!(terminal.is_terminal());
        for handle in [
            self.revalidate.take(),
            self.completion.take(),
            self.countdown.take(),
            self.detonation.take(),
        ]
        .into_iter()
        .flatten()
        {
            scheduler.cancel(handle);
        }
        self.state = terminal;
    }

    /// Handles of timers still registered for this session.
    pub fn timers(&self) -> Vec<TimerHandle> {
        [
            self.revalidate,
            self.completion,
            self.countdown,
            self.detonation,
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fw_core::Vec3;

    fn begin(sched: &mut Scheduler<Task>) -> DeviceSession {
        let snapshot = EntitySnapshot::new(Vec3::new(0.5, 65.0, 0.5), Vec3::new(0.0, 0.0, -1.0));
        DeviceSession::begin(EntityId::new(), snapshot, sched, &DeviceConfig::default())
    }

    #[test]
    fn begin_registers_two_timers() {
        let mut sched = Scheduler::new();
        let session = begin(&mut sched);
        assert_eq!(session.state(), SessionState::Arming);
        assert_eq!(session.timers().len(), 2);
        assert_eq!(sched.len(), 2);
    }

    #[test]
    fn place_requires_ready() {
        let mut sched = Scheduler::new();
        let mut session = begin(&mut sched);
        let err = session
            .place(BlockPos::new(0, 65, 0), &mut sched, &DeviceConfig::default())
            .unwrap_err();
        assert!(matches!(err, RuntimeError::WrongState { .. }));
        assert_eq!(session.state(), SessionState::Arming);
    }

    #[test]
    fn place_swaps_timers() {
        let mut sched = Scheduler::new();
        let mut session = begin(&mut sched);
        let completion = session.completion.unwrap();
        sched.cancel(completion);
        session.mark_ready();
        session
            .place(BlockPos::new(0, 65, 0), &mut sched, &DeviceConfig::default())
            .unwrap();
        assert_eq!(session.state(), SessionState::Placed);
        // Countdown + detonation, hold-still check cancelled.
        assert_eq!(session.timers().len(), 2);
        assert_eq!(sched.len(), 2);
        assert_eq!(session.explosion().unwrap().at, BlockPos::new(0, 65, 0));
    }

    #[test]
    fn finish_cancels_everything() {
        let mut sched = Scheduler::new();
        let mut session = begin(&mut sched);
        session.finish(SessionState::Invalidated, &mut sched);
        assert!(session.timers().is_empty());
        assert!(sched.is_empty());
        assert!(session.state().is_terminal());
    }

    #[test]
    fn remaining_counts_down_from_placement() {
        let mut sched = Scheduler::new();
        let mut session = begin(&mut sched);
        assert_eq!(session.remaining(10, 60), 0);
        session.mark_ready();
        session
            .place(BlockPos::new(0, 65, 0), &mut sched, &DeviceConfig::default())
            .unwrap();
        assert_eq!(session.remaining(0, 60), 60);
        assert_eq!(session.remaining(20, 60), 40);
        assert_eq!(session.remaining(90, 60), 0);
    }

    #[test]
    fn state_names() {
        assert_eq!(SessionState::Placed.to_string(), "placed");
        assert!(!SessionState::Arming.is_terminal());
        assert!(SessionState::Defused.is_terminal());
    }
}
