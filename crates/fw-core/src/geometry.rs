use std::fmt;

use serde::{Deserialize, Serialize};

/// A continuous world-space triple (position or direction).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// East-west axis.
    pub x: f64,
    /// Vertical axis.
    pub y: f64,
    /// North-south axis.
    pub z: f64,
}

impl Vec3 {
    /// Create a vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component-wise sum.
    pub fn offset(self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Largest absolute per-axis difference, together with the axis it occurred on.
    pub fn max_axis_delta(self, other: Self) -> (Axis, f64) {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        let dz = (self.z - other.z).abs();
        if dx >= dy && dx >= dz {
            (Axis::X, dx)
        } else if dy >= dz {
            (Axis::Y, dy)
        } else {
            (Axis::Z, dz)
        }
    }

    /// Returns true if every component is finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// One of the three world axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// East-west.
    X,
    /// Vertical.
    Y,
    /// North-south.
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "x"),
            Self::Y => write!(f, "y"),
            Self::Z => write!(f, "z"),
        }
    }
}

/// A discretized block coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    /// East-west axis.
    pub x: i32,
    /// Vertical axis.
    pub y: i32,
    /// North-south axis.
    pub z: i32,
}

impl BlockPos {
    /// Create a block coordinate from its components.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The block containing a world-space point (floor on every axis).
    pub fn containing(point: Vec3) -> Self {
        Self::new(
            point.x.floor() as i32,
            point.y.floor() as i32,
            point.z.floor() as i32,
        )
    }

    /// The block directly beneath this one.
    pub fn below(self) -> Self {
        Self::new(self.x, self.y - 1, self.z)
    }

    /// The block directly above this one.
    pub fn above(self) -> Self {
        Self::new(self.x, self.y + 1, self.z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containing_floors_negative_coordinates() {
        let pos = BlockPos::containing(Vec3::new(-0.5, 64.0, 3.99));
        assert_eq!(pos, BlockPos::new(-1, 64, 3));
    }

    #[test]
    fn below_and_above_are_inverse() {
        let pos = BlockPos::new(4, 10, -2);
        assert_eq!(pos.below(), BlockPos::new(4, 9, -2));
        assert_eq!(pos.below().above(), pos);
    }

    #[test]
    fn max_axis_delta_picks_largest() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(0.1, -0.3, 0.2);
        let (axis, delta) = a.max_axis_delta(b);
        assert_eq!(axis, Axis::Y);
        assert!((delta - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn finite_check() {
        assert!(Vec3::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Vec3::new(f64::NAN, 0.0, 0.0).is_finite());
    }
}
