use tracing::{debug, error, info};

use fw_core::{
    AdminConfig, BlockPos, ConfigStore, EntityId, WorldHost, load_config, save_config,
};

use crate::admin::{self, AdminCommand, CommandOutcome};
use crate::bus::{EventBus, Topic, topics};
use crate::clock::Tick;
use crate::config::RuntimeConfig;
use crate::context::TickContext;
use crate::device::{DeviceAuthority, DeviceSession, PlacementAuthority, SessionState};
use crate::error::{RuntimeError, RuntimeResult};
use crate::event::{EventLog, RuntimeEventKind};
use crate::region::{Crossing, RegionWarden};
use crate::scheduler::Scheduler;
use crate::task::Task;

/// Everything bus handlers may touch.
pub struct RuntimeState<H> {
    host: H,
    scheduler: Scheduler<Task>,
    events: EventLog,
    devices: DeviceAuthority,
    warden: RegionWarden,
    primed: bool,
}

impl<H: WorldHost> RuntimeState<H> {
    /// Split into a tick context plus the two subsystems.
    pub fn parts(&mut self) -> (TickContext<'_>, &mut DeviceAuthority, &mut RegionWarden) {
        let Self {
            host,
            scheduler,
            events,
            devices,
            warden,
            ..
        } = self;
        let ctx = TickContext {
            world: host,
            scheduler,
            events,
        };
        (ctx, devices, warden)
    }

    /// The game host.
    pub fn host(&self) -> &H {
        &self.host
    }
}

/// Single owner of all runtime state.
///
/// The host calls [`Coordinator::step`] once per world tick and feeds the
/// remaining hooks as things happen. Sessions, presence and bounds are
/// private; every mutation goes through a method here.
pub struct Coordinator<H: WorldHost + 'static> {
    state: RuntimeState<H>,
    bus: EventBus<RuntimeState<H>, EntityId, RuntimeResult<()>>,
    store: Box<dyn ConfigStore>,
}

impl<H: WorldHost + 'static> std::fmt::Debug for Coordinator<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("tick", &self.state.scheduler.now())
            .field("primed", &self.state.primed)
            .field("timers", &self.state.scheduler.len())
            .field("sessions", &self.state.devices.active_sessions())
            .field("events", &self.state.events.len())
            .field("bus", &self.bus)
            .finish()
    }
}

impl<H: WorldHost + 'static> Coordinator<H> {
    /// Load the admin config, wire the bus and issue the bootstrap timer.
    pub fn new(host: H, config: RuntimeConfig, mut store: Box<dyn ConfigStore>) -> Self {
        let admin = load_or_init(store.as_mut());
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(1, Task::Bootstrap);

        let mut bus: EventBus<RuntimeState<H>, EntityId, RuntimeResult<()>> = EventBus::new();
        bus.register(topics::ARM_INTENT, |state: &mut RuntimeState<H>, entity| {
            let (mut ctx, devices, _) = state.parts();
            devices.begin_arming(&mut ctx, entity)
        });
        bus.register(
            topics::DEVICE_READY_FOR_PLACEMENT,
            |state: &mut RuntimeState<H>, entity| {
                let (mut ctx, devices, _) = state.parts();
                devices.place_device(&mut ctx, entity).map(|_| ())
            },
        );

        Self {
            state: RuntimeState {
                host,
                scheduler,
                events: EventLog::new(config.max_events),
                devices: DeviceAuthority::new(config.device),
                warden: RegionWarden::new(admin),
                primed: false,
            },
            bus,
            store,
        }
    }

    /// Bind a handler to one of the cross-module topics, replacing the
    /// current one. Returns true if a handler was replaced.
    pub fn register_handler(
        &mut self,
        topic: Topic,
        handler: impl FnMut(&mut RuntimeState<H>, EntityId) -> RuntimeResult<()> + 'static,
    ) -> bool {
        self.bus.register(topic, handler)
    }

    /// Unbind a topic. Publishing to it then fails as host-unavailable.
    pub fn unregister_handler(&mut self, topic: Topic) -> bool {
        self.bus.unregister(topic)
    }

    fn publish(&mut self, topic: Topic, entity: EntityId) -> RuntimeResult<()> {
        match self.bus.emit(&mut self.state, topic, entity) {
            Some(result) => result,
            None => {
                error!(topic, %entity, "no handler bound");
                Err(RuntimeError::HostUnavailable(format!("no handler bound to {topic}")))
            }
        }
    }

    fn with_devices<R>(&mut self, f: impl FnOnce(&mut DeviceAuthority, &mut TickContext<'_>) -> R) -> R {
        let (mut ctx, devices, _) = self.state.parts();
        f(devices, &mut ctx)
    }

    fn with_warden<R>(&mut self, f: impl FnOnce(&mut RegionWarden, &mut TickContext<'_>) -> R) -> R {
        let (mut ctx, _, warden) = self.state.parts();
        f(warden, &mut ctx)
    }

    // -----------------------------------------------------------------------
    // Tick loop
    // -----------------------------------------------------------------------

    /// Advance one tick and fire every due timer in registration order.
    /// A failing timer is logged and the rest of the batch still runs.
    pub fn step(&mut self) -> Tick {
        let now = self.state.scheduler.advance();
        while let Some((_, task)) = self.state.scheduler.next_due() {
            if let Err(err) = self.dispatch(task) {
                error!(tick = now, ?task, error = %err, "timer task failed");
            }
        }
        now
    }

    /// Advance `n` ticks.
    pub fn run(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }

    fn dispatch(&mut self, task: Task) -> RuntimeResult<()> {
        match task {
            Task::Bootstrap => {
                self.state.primed = true;
                debug!(tick = self.state.scheduler.now(), "runtime primed");
                let (mut ctx, _, _) = self.state.parts();
                ctx.emit(RuntimeEventKind::Primed, "runtime primed");
                Ok(())
            }
            Task::Revalidate(entity) => self.with_devices(|d, ctx| d.revalidate(ctx, entity)),
            Task::CompleteArming(entity) => {
                if !self.with_devices(|d, ctx| d.complete_arming(ctx, entity))? {
                    return Ok(());
                }
                let placed = self.publish(topics::DEVICE_READY_FOR_PLACEMENT, entity);
                self.with_devices(|d, ctx| d.abandon_unplaced(ctx, entity));
                placed
            }
            Task::Countdown(entity) => self.with_devices(|d, ctx| d.countdown(ctx, entity)),
            Task::Detonate(entity) => self.with_devices(|d, ctx| d.detonate(ctx, entity)),
        }
    }

    // -----------------------------------------------------------------------
    // Host hooks
    // -----------------------------------------------------------------------

    /// The entity started its use-action: publish an arm-intent. A rejected
    /// intent is reported to the entity and returned.
    pub fn on_use_started(&mut self, entity: EntityId) -> RuntimeResult<()> {
        let result = self.publish(topics::ARM_INTENT, entity);
        if let Err(err) = &result {
            debug!(%entity, error = %err, "arm-intent rejected");
            self.state
                .host
                .send_message(entity, &format!("Cannot arm: {err}"));
        }
        result
    }

    /// A block was broken. Returns true if it was a placed device.
    pub fn on_block_broken(&mut self, pos: BlockPos) -> bool {
        self.with_devices(|d, ctx| d.on_block_broken(ctx, pos))
    }

    /// A player joined; presence starts as outside.
    pub fn on_player_login(&mut self, player: EntityId) {
        self.state.warden.on_login(player);
    }

    /// A player left; its presence bookkeeping is dropped.
    pub fn on_player_logout(&mut self, player: EntityId) {
        self.state.warden.on_logout(player);
    }

    /// Per-player tick. Ignored until the bootstrap timer has fired.
    pub fn on_player_tick(&mut self, player: EntityId) -> Option<Crossing> {
        if !self.state.primed {
            return None;
        }
        self.with_warden(|w, ctx| w.on_player_tick(ctx, player))
    }

    /// Run one administrative command line for `actor` (`None` = console).
    pub fn run_admin(&mut self, actor: Option<EntityId>, input: &str) -> CommandOutcome {
        let Self { state, store, .. } = self;
        let (mut ctx, _, warden) = state.parts();
        let result = AdminCommand::parse(input)
            .and_then(|cmd| admin::execute(cmd, warden, store.as_mut(), &mut ctx, actor));
        if let Err(err) = &result {
            info!(input, error = %err, "admin command failed");
        }
        CommandOutcome::from(result)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The game host.
    pub fn host(&self) -> &H {
        &self.state.host
    }

    /// Mutable access to the game host, for driving it between ticks.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.state.host
    }

    /// The observable event log.
    pub fn events(&self) -> &EventLog {
        &self.state.events
    }

    /// Current tick.
    pub fn now(&self) -> Tick {
        self.state.scheduler.now()
    }

    /// Whether the bootstrap timer has fired.
    pub fn is_primed(&self) -> bool {
        self.state.primed
    }

    /// Registered timers, including ones due in the current batch.
    pub fn pending_timers(&self) -> usize {
        self.state.scheduler.len()
    }

    /// State of `entity`'s device session, `Idle` if it has none.
    pub fn session_state(&self, entity: EntityId) -> SessionState {
        self.state.devices.state_of(entity)
    }

    /// The live device session of `entity`.
    pub fn session(&self, entity: EntityId) -> Option<&DeviceSession> {
        self.state.devices.session(entity)
    }

    /// The device authority.
    pub fn devices(&self) -> &DeviceAuthority {
        &self.state.devices
    }

    /// The region warden.
    pub fn warden(&self) -> &RegionWarden {
        &self.state.warden
    }

    /// Current administrative config.
    pub fn admin_config(&self) -> &AdminConfig {
        self.state.warden.config()
    }
}

/// Read the stored config, writing defaults when none exists.
fn load_or_init(store: &mut dyn ConfigStore) -> AdminConfig {
    match load_config(store) {
        Ok(Some(config)) => config,
        Ok(None) => {
            let config = AdminConfig::default();
            if let Err(err) = save_config(store, &config) {
                error!(error = %err, "could not write default admin config");
            }
            config
        }
        Err(err) => {
            error!(error = %err, "stored admin config unreadable, using defaults");
            AdminConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;
    use fw_core::{BlockId, GameMode, MemoryEntity, MemoryStore, MemoryWorld, Vec3};

    fn world_with_player(name: &str, pos: Vec3, target: &BlockId) -> (MemoryWorld, EntityId) {
        let mut world = MemoryWorld::new();
        let mut entity = MemoryEntity::at(name, pos);
        entity.using_item = true;
        let id = world.add_entity(entity).unwrap();
        world.put_block(BlockPos::containing(pos).below(), target.clone());
        (world, id)
    }

    fn coordinator(device: DeviceConfig) -> (Coordinator<MemoryWorld>, EntityId) {
        let (world, id) = world_with_player("Alex", Vec3::new(0.5, 65.0, 0.5), &device.target_block);
        let config = RuntimeConfig::default()
            .with_device(device)
            .with_max_events(0);
        let admin = AdminConfig {
            center: fw_core::RegionCenter::new(1000.0, 1000.0),
            ..AdminConfig::default()
        };
        let store = MemoryStore::with_blob(admin.to_json().unwrap());
        (Coordinator::new(world, config, Box::new(store)), id)
    }

    fn placed_ticks(c: &Coordinator<MemoryWorld>) -> Vec<Tick> {
        c.events()
            .matching(|k| matches!(k, RuntimeEventKind::DevicePlaced { .. }))
            .iter()
            .map(|e| e.tick)
            .collect()
    }

    #[test]
    fn still_entity_is_placed_after_fifty_checks() {
        let (mut c, alex) = coordinator(
            DeviceConfig::default()
                .with_arming_ticks(100)
                .with_validation_period(2),
        );
        c.on_use_started(alex).unwrap();
        c.run(99);
        assert_eq!(c.session_state(alex), SessionState::Arming);
        assert_eq!(c.session(alex).unwrap().checks_passed(), 49);

        c.step();
        assert_eq!(placed_ticks(&c), vec![100]);
        let session = c.session(alex).unwrap();
        assert_eq!(session.state(), SessionState::Placed);
        assert_eq!(session.checks_passed(), 50);
        assert!(
            c.events()
                .matching(|k| matches!(k, RuntimeEventKind::ArmingInvalidated { .. }))
                .is_empty()
        );
    }

    #[test]
    fn fuse_broadcasts_twice_then_detonates() {
        let (mut c, alex) = coordinator(
            DeviceConfig::default()
                .with_arming_ticks(10)
                .with_fuse_ticks(60)
                .with_broadcast_period(20),
        );
        c.on_use_started(alex).unwrap();
        c.run(10);
        c.host_mut().clear_records();
        c.run(60);

        let countdowns: Vec<Tick> = c
            .events()
            .matching(|k| matches!(k, RuntimeEventKind::CountdownBroadcast { .. }))
            .iter()
            .map(|e| e.tick)
            .collect();
        assert_eq!(countdowns, vec![30, 50]);
        assert_eq!(
            c.host().broadcasts(),
            vec!["Device detonates in 2s", "Device detonates in 1s"]
        );
        assert_eq!(c.host().explosions(), vec![(BlockPos::new(0, 65, 0), 4.0)]);
        assert_eq!(c.session_state(alex), SessionState::Idle);
        assert_eq!(c.pending_timers(), 0);
    }

    #[test]
    fn removal_one_tick_before_detonation_defuses() {
        let (mut c, alex) = coordinator(
            DeviceConfig::default()
                .with_arming_ticks(10)
                .with_fuse_ticks(60),
        );
        c.on_use_started(alex).unwrap();
        c.run(10 + 59);
        let at = BlockPos::new(0, 65, 0);
        c.host_mut().put_block(at, BlockId::air());
        assert!(c.on_block_broken(at));
        c.run(10);

        assert!(c.host().explosions().is_empty());
        let defused = c
            .events()
            .matching(|k| matches!(k, RuntimeEventKind::Defused { .. }));
        assert_eq!(defused.len(), 1);
        assert_eq!(defused[0].tick, 69);
        assert!(
            c.events()
                .matching(|k| matches!(k, RuntimeEventKind::Detonated { .. }))
                .is_empty()
        );
    }

    #[test]
    fn invalidated_session_stays_down_until_rearmed() {
        let (mut c, alex) = coordinator(DeviceConfig::default().with_arming_ticks(20));
        c.on_use_started(alex).unwrap();
        c.run(5);
        c.host_mut().move_to(alex, Vec3::new(0.7, 65.0, 0.5));
        c.run(5);
        // Moving back does not resurrect the session.
        c.host_mut().move_to(alex, Vec3::new(0.5, 65.0, 0.5));
        c.run(40);
        assert!(placed_ticks(&c).is_empty());
        assert_eq!(c.session_state(alex), SessionState::Idle);

        c.on_use_started(alex).unwrap();
        c.run(20);
        assert_eq!(placed_ticks(&c), vec![70]);
    }

    #[test]
    fn second_intent_is_rejected_and_reported() {
        let (mut c, alex) = coordinator(DeviceConfig::default());
        c.on_use_started(alex).unwrap();
        assert!(matches!(
            c.on_use_started(alex),
            Err(RuntimeError::SessionExists(_))
        ));
        assert!(
            c.host()
                .messages_to(alex)
                .iter()
                .any(|m| m.starts_with("Cannot arm"))
        );
        assert_eq!(c.session_state(alex), SessionState::Arming);
    }

    #[test]
    fn wrong_surface_is_rejected() {
        let (mut c, alex) = coordinator(DeviceConfig::default());
        c.host_mut()
            .put_block(BlockPos::new(0, 64, 0), BlockId::new("grass"));
        assert!(c.on_use_started(alex).is_err());
        assert_eq!(c.session_state(alex), SessionState::Idle);
        assert_eq!(c.pending_timers(), 1);
    }

    #[test]
    fn replaced_handler_wins() {
        let (mut c, alex) = coordinator(DeviceConfig::default().with_arming_ticks(4));
        let replaced = c.register_handler(topics::DEVICE_READY_FOR_PLACEMENT, |state, entity| {
            let (ctx, _, _) = state.parts();
            ctx.world.send_message(entity, "placement vetoed");
            Ok(())
        });
        assert!(replaced);
        c.on_use_started(alex).unwrap();
        c.run(4);
        assert!(placed_ticks(&c).is_empty());
        assert_eq!(
            c.host().messages_to(alex),
            vec!["placement vetoed", "Arming interrupted: placement failed"]
        );
        assert_eq!(c.session_state(alex), SessionState::Idle);
    }

    #[test]
    fn unplaced_device_frees_the_entity() {
        let (mut c, alex) = coordinator(DeviceConfig::default().with_arming_ticks(10));
        assert!(c.unregister_handler(topics::DEVICE_READY_FOR_PLACEMENT));
        c.on_use_started(alex).unwrap();
        c.run(1000);

        assert_eq!(c.session_state(alex), SessionState::Idle);
        assert_eq!(c.pending_timers(), 0);
        let invalidated = c
            .events()
            .matching(|k| matches!(k, RuntimeEventKind::ArmingInvalidated { .. }));
        assert_eq!(invalidated.len(), 1);
        assert_eq!(invalidated[0].tick, 10);
        assert_eq!(
            invalidated[0].kind,
            RuntimeEventKind::ArmingInvalidated {
                entity: alex,
                reason: crate::event::InvalidationReason::PlacementFailed,
            }
        );

        c.on_use_started(alex).unwrap();
        assert_eq!(c.session_state(alex), SessionState::Arming);
    }

    #[test]
    fn unbound_topic_is_host_unavailable() {
        let (mut c, alex) = coordinator(DeviceConfig::default());
        assert!(c.unregister_handler(topics::ARM_INTENT));
        assert!(matches!(
            c.on_use_started(alex),
            Err(RuntimeError::HostUnavailable(_))
        ));
        assert_eq!(c.session_state(alex), SessionState::Idle);
    }

    #[test]
    fn bootstrap_primes_on_first_step() {
        let (mut c, _) = coordinator(DeviceConfig::default());
        assert!(!c.is_primed());
        c.step();
        assert!(c.is_primed());
        assert_eq!(c.events().events_at_tick(1).len(), 1);
    }

    #[test]
    fn presence_waits_for_priming() {
        let (mut c, alex) = coordinator(DeviceConfig::default());
        c.on_player_login(alex);
        assert!(c.run_admin(None, "set-radius 16").is_success());
        assert!(c.run_admin(None, "set-interval 0").is_success());
        c.host_mut().move_to(alex, Vec3::new(1000.0, 64.0, 1000.0));
        assert_eq!(c.on_player_tick(alex), None);
        c.step();
        assert_eq!(c.on_player_tick(alex), Some(Crossing::Entered));
        assert_eq!(c.host().entity(alex).unwrap().mode, GameMode::Adventure);
        c.on_player_logout(alex);
        assert!(c.warden().presence().get(alex).is_none());
    }

    #[test]
    fn defaults_written_when_store_empty() {
        let (world, _) = world_with_player("Alex", Vec3::new(0.5, 65.0, 0.5), &BlockId::new("target"));
        let c = Coordinator::new(world, RuntimeConfig::default(), Box::new(MemoryStore::new()));
        assert_eq!(c.admin_config(), &AdminConfig::default());
    }

    #[test]
    fn admin_set_center_from_actor() {
        let (mut c, alex) = coordinator(DeviceConfig::default());
        let out = c.run_admin(Some(alex), "set-center");
        assert!(out.is_success());
        assert_eq!(c.admin_config().center, fw_core::RegionCenter::new(0.5, 0.5));
        assert_eq!(c.run_admin(None, "bogus").status, CommandOutcome::FAILURE);
    }
}
