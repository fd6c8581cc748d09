use fw_core::{BlockPos, EntityId};

use crate::clock::Tick;

/// Why an arming session was invalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationReason {
    /// Position, orientation or support block drifted.
    Drift(String),
    /// The use-action was released.
    UseReleased,
    /// The host could not report the entity at completion.
    EntityUnavailable,
    /// Arming completed but no device was placed.
    PlacementFailed,
}

impl std::fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Drift(what) => write!(f, "moved ({what})"),
            Self::UseReleased => write!(f, "use released"),
            Self::EntityUnavailable => write!(f, "entity unavailable"),
            Self::PlacementFailed => write!(f, "placement failed"),
        }
    }
}

/// What kind of runtime event occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEventKind {
    // Lifecycle
    /// The bootstrap timer fired.
    Primed,

    // Device
    /// An arming session began.
    ArmingStarted {
        /// Session owner.
        entity: EntityId,
        /// The target block under the entity.
        support: BlockPos,
    },
    /// An arming session ended without placing a device.
    ArmingInvalidated {
        /// Session owner.
        entity: EntityId,
        /// Why it ended.
        reason: InvalidationReason,
    },
    /// A device was placed and its fuse started.
    DevicePlaced {
        /// Session owner.
        entity: EntityId,
        /// Device block.
        at: BlockPos,
    },
    /// A countdown broadcast went out.
    CountdownBroadcast {
        /// Session owner.
        entity: EntityId,
        /// Ticks left on the fuse.
        remaining: Tick,
    },
    /// The device exploded.
    Detonated {
        /// Session owner.
        entity: EntityId,
        /// Device block.
        at: BlockPos,
    },
    /// The fuse ran out but the device was already gone.
    DetonationSkipped {
        /// Session owner.
        entity: EntityId,
        /// Where the device was.
        at: BlockPos,
    },
    /// The device was removed before the fuse ran out.
    Defused {
        /// Session owner.
        entity: EntityId,
        /// Where the device was.
        at: BlockPos,
    },

    // Region
    /// A player entered the region.
    RegionEntered {
        /// The player.
        player: EntityId,
    },
    /// A player left the region.
    RegionLeft {
        /// The player.
        player: EntityId,
    },
    /// A crossing was deferred by the toggle cooldown.
    RegionCooldown {
        /// The player.
        player: EntityId,
    },

    // Admin
    /// An administrative setting changed.
    ConfigChanged {
        /// Human-readable summary of the change.
        setting: String,
    },
}

impl RuntimeEventKind {
    /// Check whether a given entity is involved in this event.
    pub fn involves(&self, id: EntityId) -> bool {
        match self {
            Self::ArmingStarted { entity, .. }
            | Self::ArmingInvalidated { entity, .. }
            | Self::DevicePlaced { entity, .. }
            | Self::CountdownBroadcast { entity, .. }
            | Self::Detonated { entity, .. }
            | Self::DetonationSkipped { entity, .. }
            | Self::Defused { entity, .. } => *entity == id,
            Self::RegionEntered { player }
            | Self::RegionLeft { player }
            | Self::RegionCooldown { player } => *player == id,
            Self::Primed | Self::ConfigChanged { .. } => false,
        }
    }
}

/// A record of something that happened in the runtime.
#[derive(Debug, Clone)]
pub struct RuntimeEvent {
    /// The tick when this event occurred.
    pub tick: Tick,
    /// The specific kind of event that occurred.
    pub kind: RuntimeEventKind,
    /// A human-readable description of the event.
    pub description: String,
}

impl RuntimeEvent {
    /// Create a new event with the given tick, kind, and description.
    pub fn new(tick: Tick, kind: RuntimeEventKind, description: impl Into<String>) -> Self {
        Self {
            tick,
            kind,
            description: description.into(),
        }
    }
}

/// Accumulates observable transitions.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<RuntimeEvent>,
    max_events: usize,
}

impl EventLog {
    /// Create a new event log with the given maximum capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
        }
    }

    /// Append an event, dropping the oldest events if the log exceeds its capacity.
    pub fn push(&mut self, event: RuntimeEvent) {
        self.events.push(event);
        if self.max_events > 0 && self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(..drain_count);
        }
    }

    /// Return a slice of all recorded events.
    pub fn events(&self) -> &[RuntimeEvent] {
        &self.events
    }

    /// Return all events that occurred at the given tick.
    pub fn events_at_tick(&self, tick: Tick) -> Vec<&RuntimeEvent> {
        self.events.iter().filter(|e| e.tick == tick).collect()
    }

    /// Return all events involving the given entity.
    pub fn events_for_entity(&self, id: EntityId) -> Vec<&RuntimeEvent> {
        self.events.iter().filter(|e| e.kind.involves(id)).collect()
    }

    /// Return the events matching a predicate on their kind.
    pub fn matching(&self, pred: impl Fn(&RuntimeEventKind) -> bool) -> Vec<&RuntimeEvent> {
        self.events.iter().filter(|e| pred(&e.kind)).collect()
    }

    /// Return the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
