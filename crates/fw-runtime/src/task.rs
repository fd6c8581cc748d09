use fw_core::EntityId;

/// Payload of every timer the coordinator schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// One-tick priming timer issued at load.
    Bootstrap,
    /// Periodic hold-still check during arming.
    Revalidate(EntityId),
    /// Arming duration elapsed.
    CompleteArming(EntityId),
    /// Countdown broadcast while placed.
    Countdown(EntityId),
    /// Fuse elapsed.
    Detonate(EntityId),
}

impl Task {
    /// The session owner this task belongs to, if any.
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Self::Bootstrap => None,
            Self::Revalidate(e)
            | Self::CompleteArming(e)
            | Self::Countdown(e)
            | Self::Detonate(e) => Some(*e),
        }
    }
}
