/// One discrete world-simulation step. The only unit of time in the runtime.
pub type Tick = u64;

/// Host ticks per wall-clock second, used for human-facing countdowns.
pub const TICKS_PER_SECOND: Tick = 20;

/// Monotonic tick counter.
#[derive(Debug, Clone, Default)]
pub struct TickClock {
    tick: Tick,
}

impl TickClock {
    /// Create a new clock starting at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by one tick. Returns the new tick number.
    pub fn advance(&mut self) -> Tick {
        self.tick += 1;
        self.tick
    }

    /// Return the current tick number.
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Ticks elapsed since `earlier`, saturating at zero.
    pub fn since(&self, earlier: Tick) -> Tick {
        self.tick.saturating_sub(earlier)
    }
}

/// Whole seconds covering `ticks`, rounded up.
pub fn seconds_ceil(ticks: Tick) -> Tick {
    ticks.div_ceil(TICKS_PER_SECOND)
}
