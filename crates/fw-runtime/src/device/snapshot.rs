use std::fmt;

use fw_core::{Axis, BlockPos, EntityId, Vec3, WorldQuery};

/// Frozen reading of an entity taken when arming starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntitySnapshot {
    /// Feet position.
    pub position: Vec3,
    /// Unit look direction.
    pub orientation: Vec3,
    /// The block directly below the feet.
    pub support: BlockPos,
}

impl EntitySnapshot {
    /// Build a snapshot from raw readings.
    pub fn new(position: Vec3, orientation: Vec3) -> Self {
        Self {
            position,
            orientation,
            support: support_block(position),
        }
    }

    /// Read the entity's current state from the host.
    pub fn capture<W: WorldQuery + ?Sized>(world: &W, entity: EntityId) -> Option<Self> {
        let position = world.position(entity)?;
        let orientation = world.orientation(entity)?;
        Some(Self::new(position, orientation))
    }

    /// The block the entity's feet are in.
    pub fn feet(&self) -> BlockPos {
        BlockPos::containing(self.position)
    }
}

/// The block an entity stands on: one below the block containing its feet.
pub fn support_block(position: Vec3) -> BlockPos {
    BlockPos::containing(position).below()
}

/// Maximum drift allowed before a value counts as changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Per-axis absolute epsilon on position.
    pub position: f64,
    /// Per-axis absolute epsilon on orientation.
    pub orientation: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            position: 0.01,
            orientation: 0.001,
        }
    }
}

/// The first check a snapshot comparison failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Drift {
    /// Position moved past tolerance on `axis`.
    Position {
        /// Offending axis.
        axis: Axis,
        /// Absolute difference.
        delta: f64,
    },
    /// Orientation turned past tolerance on `axis`.
    Orientation {
        /// Offending axis.
        axis: Axis,
        /// Absolute difference.
        delta: f64,
    },
    /// The entity is standing on a different block.
    SupportBlock {
        /// Block at arming start.
        expected: BlockPos,
        /// Block now.
        found: BlockPos,
    },
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position { axis, delta } => write!(f, "position {axis} off by {delta:.4}"),
            Self::Orientation { axis, delta } => {
                write!(f, "orientation {axis} off by {delta:.4}")
            }
            Self::SupportBlock { expected, found } => {
                write!(f, "support block {found}, expected {expected}")
            }
        }
    }
}

/// Compare a current reading against the arming snapshot.
///
/// Position and orientation are checked per axis against their own epsilon;
/// the support block must match exactly. Non-finite readings always fail.
pub fn validate(
    snapshot: &EntitySnapshot,
    current: &EntitySnapshot,
    tolerance: &Tolerance,
) -> Result<(), Drift> {
    if let Some((axis, delta)) = exceeds(snapshot.position, current.position, tolerance.position)
    {
        return Err(Drift::Position { axis, delta });
    }
    if let Some((axis, delta)) = exceeds(
        snapshot.orientation,
        current.orientation,
        tolerance.orientation,
    ) {
        return Err(Drift::Orientation { axis, delta });
    }
    if snapshot.support != current.support {
        return Err(Drift::SupportBlock {
            expected: snapshot.support,
            found: current.support,
        });
    }
    Ok(())
}

fn exceeds(before: Vec3, now: Vec3, epsilon: f64) -> Option<(Axis, f64)> {
    if !now.is_finite() {
        return Some((Axis::X, f64::INFINITY));
    }
    let (axis, delta) = before.max_axis_delta(now);
    (delta > epsilon).then_some((axis, delta))
}
