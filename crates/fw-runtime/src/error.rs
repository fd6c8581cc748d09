use fw_core::{BlockId, BlockPos, EntityId};

/// Alias for `Result<T, RuntimeError>`.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Precondition failures and host problems raised by the runtime.
///
/// Drift during arming and device removal are not errors: they are
/// session transitions recorded in the event log.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The entity already owns a device session.
    #[error("entity {0} already has an active device session")]
    SessionExists(EntityId),

    /// No session exists for the entity.
    #[error("entity {0} has no device session")]
    NoSession(EntityId),

    /// The session is not in the state the operation requires.
    #[error("session for {entity} is {actual}, expected {expected}")]
    WrongState {
        /// Session owner.
        entity: EntityId,
        /// Required state.
        expected: &'static str,
        /// Actual state.
        actual: &'static str,
    },

    /// The block under the entity is not the arming target.
    #[error("block under entity at {at} is '{found}', expected '{expected}'")]
    TargetMismatch {
        /// Support block coordinate.
        at: BlockPos,
        /// Block found there.
        found: BlockId,
        /// Required target block.
        expected: BlockId,
    },

    /// The host could not report the entity's state.
    #[error("entity {0} is not available in the world")]
    EntityUnavailable(EntityId),

    /// A required host collaborator could not be reached.
    #[error("host unavailable: {0}")]
    HostUnavailable(String),
}
