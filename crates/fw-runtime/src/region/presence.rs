use std::collections::HashMap;

use fw_core::EntityId;

use crate::clock::Tick;

/// Direction of a boundary crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    /// Outside to inside.
    Entered,
    /// Inside to outside.
    Left,
}

/// Result of one presence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Membership matches the cache.
    Unchanged,
    /// Membership changed but the player toggled too recently; the cache is
    /// left alone so the crossing is seen again on the next check.
    CoolingDown,
    /// Membership changed and the cache was updated.
    Crossed(Crossing),
}

/// Per-player bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Presence {
    /// Inside as of the last applied check.
    pub inside: bool,
    /// Tick of the last check.
    pub last_check: Option<Tick>,
    /// Tick of the last applied crossing.
    pub last_toggle: Option<Tick>,
}

/// Edge-triggered inside/outside cache keyed by player.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    players: HashMap<EntityId, Presence>,
}

impl PresenceTracker {
    /// An empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a player as outside. Existing bookkeeping is kept.
    pub fn login(&mut self, player: EntityId) {
        self.players.entry(player).or_default();
    }

    /// Drop everything known about a player.
    pub fn logout(&mut self, player: EntityId) -> bool {
        self.players.remove(&player).is_some()
    }

    /// Bookkeeping for a player.
    pub fn get(&self, player: EntityId) -> Option<&Presence> {
        self.players.get(&player)
    }

    /// Whether the player is cached as inside.
    pub fn is_inside(&self, player: EntityId) -> bool {
        self.players.get(&player).is_some_and(|p| p.inside)
    }

    /// Whether at least `interval` ticks passed since the player's last check.
    /// A player never checked is always due.
    pub fn is_due(&self, player: EntityId, now: Tick, interval: Tick) -> bool {
        match self.players.get(&player).and_then(|p| p.last_check) {
            Some(last) => now.saturating_sub(last) >= interval,
            None => true,
        }
    }

    /// Compare fresh membership against the cache.
    ///
    /// A player with no entry counts as outside, so a first check inside the
    /// region reports [`Crossing::Entered`].
    pub fn check(&mut self, player: EntityId, now: Tick, inside: bool, cooldown: Tick) -> CheckOutcome {
        let entry = self.players.entry(player).or_default();
        entry.last_check = Some(now);
        if entry.inside == inside {
            return CheckOutcome::Unchanged;
        }
        if entry
            .last_toggle
            .is_some_and(|toggled| now.saturating_sub(toggled) < cooldown)
        {
            return CheckOutcome::CoolingDown;
        }
        entry.inside = inside;
        entry.last_toggle = Some(now);
        CheckOutcome::Crossed(if inside {
            Crossing::Entered
        } else {
            Crossing::Left
        })
    }

    /// Players cached as inside, in id order.
    pub fn inside_players(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self
            .players
            .iter()
            .filter(|(_, p)| p.inside)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Number of tracked players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether no player is tracked.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Forget every player.
    pub fn clear(&mut self) {
        self.players.clear();
    }
}
