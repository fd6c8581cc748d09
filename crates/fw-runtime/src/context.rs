use fw_core::WorldHost;

use crate::clock::Tick;
use crate::event::{EventLog, RuntimeEvent, RuntimeEventKind};
use crate::scheduler::Scheduler;
use crate::task::Task;

/// Mutable context passed to subsystems while handling a tick or a hook.
pub struct TickContext<'a> {
    /// The game host.
    pub world: &'a mut dyn WorldHost,
    /// The shared timer scheduler.
    pub scheduler: &'a mut Scheduler<Task>,
    /// The observable event log.
    pub events: &'a mut EventLog,
}

impl TickContext<'_> {
    /// Record an event at the current tick.
    pub fn emit(&mut self, kind: RuntimeEventKind, description: impl Into<String>) {
        self.events
            .push(RuntimeEvent::new(self.scheduler.now(), kind, description));
    }

    /// The current tick.
    pub fn now(&self) -> Tick {
        self.scheduler.now()
    }
}
