use fw_core::RegionCenter;

/// Precomputed horizontal bounds of the square region.
///
/// The vertical axis is ignored: a player is inside at any height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryCache {
    min_x: f64,
    max_x: f64,
    min_z: f64,
    max_z: f64,
}

impl BoundaryCache {
    /// Bounds of the square with half-width `radius` around `center`.
    pub fn compute(center: RegionCenter, radius: u32) -> Self {
        let r = f64::from(radius);
        Self {
            min_x: center.x - r,
            max_x: center.x + r,
            min_z: center.z - r,
            max_z: center.z + r,
        }
    }

    /// Inclusive membership test.
    pub fn contains(&self, x: f64, z: f64) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }

    /// `(min, max)` on the x axis.
    pub fn x_range(&self) -> (f64, f64) {
        (self.min_x, self.max_x)
    }

    /// `(min, max)` on the z axis.
    pub fn z_range(&self) -> (f64, f64) {
        (self.min_z, self.max_z)
    }
}
