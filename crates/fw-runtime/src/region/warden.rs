use tracing::{debug, info, warn};

use fw_core::{AdminConfig, EntityId, GameMode, RegionCenter, RegionMode};

use crate::clock::Tick;
use crate::context::TickContext;
use crate::event::RuntimeEventKind;
use crate::region::bounds::BoundaryCache;
use crate::region::presence::{CheckOutcome, Crossing, PresenceTracker};

/// Applies the restricted mode to players inside the administered region.
#[derive(Debug)]
pub struct RegionWarden {
    config: AdminConfig,
    bounds: BoundaryCache,
    presence: PresenceTracker,
}

impl RegionWarden {
    /// A warden over `config` with an empty presence cache.
    pub fn new(config: AdminConfig) -> Self {
        let bounds = BoundaryCache::compute(config.center, config.radius);
        Self {
            config,
            bounds,
            presence: PresenceTracker::new(),
        }
    }

    /// Current administrative config.
    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    /// Current bounds.
    pub fn bounds(&self) -> &BoundaryCache {
        &self.bounds
    }

    /// The presence cache.
    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// Start tracking a player, cached as outside.
    pub fn on_login(&mut self, player: EntityId) {
        self.presence.login(player);
    }

    /// Forget a player's presence and cooldown. False if it was not tracked.
    pub fn on_logout(&mut self, player: EntityId) -> bool {
        self.presence.logout(player)
    }

    /// Per-player tick hook. Runs a presence check when one is due and
    /// applies the side effects of a crossing.
    pub fn on_player_tick(&mut self, ctx: &mut TickContext<'_>, player: EntityId) -> Option<Crossing> {
        if !self.config.enabled {
            return None;
        }
        let now = ctx.now();
        if !self
            .presence
            .is_due(player, now, self.config.check_interval_ticks)
        {
            return None;
        }
        let Some(position) = ctx.world.position(player) else {
            warn!(%player, tick = now, "player position unavailable, presence check abandoned");
            return None;
        };
        let exempt = ctx
            .world
            .player_name(player)
            .is_some_and(|name| self.config.is_whitelisted(&name));
        let inside = !exempt && self.bounds.contains(position.x, position.z);

        match self
            .presence
            .check(player, now, inside, self.config.cooldown_ticks)
        {
            CheckOutcome::Unchanged => None,
            CheckOutcome::CoolingDown => {
                debug!(%player, tick = now, "crossing deferred by cooldown");
                ctx.emit(
                    RuntimeEventKind::RegionCooldown { player },
                    format!("{player} crossing deferred by cooldown"),
                );
                None
            }
            CheckOutcome::Crossed(crossing) => {
                self.apply(ctx, player, crossing);
                Some(crossing)
            }
        }
    }

    fn apply(&self, ctx: &mut TickContext<'_>, player: EntityId, crossing: Crossing) {
        match crossing {
            Crossing::Entered => {
                info!(%player, mode = %self.config.mode, "player entered region");
                ctx.world.set_game_mode(player, self.config.mode.game_mode());
                ctx.world.send_message(
                    player,
                    &format!("You entered the restricted region ({} mode)", self.config.mode),
                );
                ctx.emit(
                    RuntimeEventKind::RegionEntered { player },
                    format!("{player} entered the region"),
                );
            }
            Crossing::Left => {
                info!(%player, "player left region");
                ctx.world.set_game_mode(player, GameMode::Survival);
                ctx.world
                    .send_message(player, "You left the restricted region");
                ctx.emit(
                    RuntimeEventKind::RegionLeft { player },
                    format!("{player} left the region"),
                );
            }
        }
    }

    /// Turn tracking on or off. Returns false if nothing changed.
    ///
    /// Disabling restores everyone cached as inside and clears the cache.
    pub fn set_enabled(&mut self, ctx: &mut TickContext<'_>, enabled: bool) -> bool {
        if self.config.enabled == enabled {
            return false;
        }
        self.config.enabled = enabled;
        if !enabled {
            for player in self.presence.inside_players() {
                ctx.world.set_game_mode(player, GameMode::Survival);
                ctx.emit(
                    RuntimeEventKind::RegionLeft { player },
                    format!("{player} released, region disabled"),
                );
            }
            self.presence.clear();
        }
        true
    }

    /// Move the region and recompute its bounds.
    pub fn set_center(&mut self, center: RegionCenter) {
        self.config.center = center;
        self.recompute();
    }

    /// Resize the region and recompute its bounds. The radius must
    /// already be validated.
    pub fn set_radius(&mut self, radius: u32) {
        self.config.radius = radius;
        self.recompute();
    }

    /// Change the restricted mode and re-apply it to players inside.
    pub fn set_mode(&mut self, ctx: &mut TickContext<'_>, mode: RegionMode) {
        self.config.mode = mode;
        for player in self.presence.inside_players() {
            ctx.world.set_game_mode(player, mode.game_mode());
        }
    }

    /// Minimum ticks between two applied crossings of one player.
    pub fn set_cooldown(&mut self, ticks: Tick) {
        self.config.cooldown_ticks = ticks;
    }

    /// Ticks between presence checks of one player, 0 for every tick.
    pub fn set_check_interval(&mut self, ticks: Tick) {
        self.config.check_interval_ticks = ticks;
    }

    /// Exempt a player name. False if already exempt.
    pub fn whitelist_add(&mut self, name: &str) -> bool {
        self.config.whitelist_add(name)
    }

    /// Remove an exemption. False if absent.
    pub fn whitelist_remove(&mut self, name: &str) -> bool {
        self.config.whitelist_remove(name)
    }

    /// Swap in a freshly loaded config, applying enable and mode changes.
    pub fn replace_config(&mut self, ctx: &mut TickContext<'_>, config: AdminConfig) {
        let enabled = config.enabled;
        let mode = config.mode;
        let mode_changed = mode != self.config.mode;
        self.set_enabled(ctx, enabled);
        self.config = config;
        if mode_changed {
            self.set_mode(ctx, mode);
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        self.bounds = BoundaryCache::compute(self.config.center, self.config.radius);
        debug!(
            center_x = self.config.center.x,
            center_z = self.config.center.z,
            radius = self.config.radius,
            "region bounds recomputed"
        );
    }
}
