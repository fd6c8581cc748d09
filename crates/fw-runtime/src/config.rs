use fw_core::BlockId;

use crate::clock::{TICKS_PER_SECOND, Tick};
use crate::device::Tolerance;

/// Tuning for device sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    /// Ticks the entity must hold still before the device is placed.
    pub arming_ticks: Tick,
    /// Ticks between hold-still checks while arming.
    pub validation_period: Tick,
    /// Ticks from placement to detonation.
    pub fuse_ticks: Tick,
    /// Ticks between countdown broadcasts.
    pub broadcast_period: Tick,
    /// Explosion strength.
    pub power: f32,
    /// Allowed drift while arming.
    pub tolerance: Tolerance,
    /// Block the entity must stand on to arm.
    pub target_block: BlockId,
    /// Block placed as the device.
    pub device_block: BlockId,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            arming_ticks: 5 * TICKS_PER_SECOND,
            validation_period: 2,
            fuse_ticks: 10 * TICKS_PER_SECOND,
            broadcast_period: TICKS_PER_SECOND,
            power: 4.0,
            tolerance: Tolerance::default(),
            target_block: BlockId::new("target"),
            device_block: BlockId::new("device"),
        }
    }
}

impl DeviceConfig {
    /// Set the arming duration in ticks.
    pub fn with_arming_ticks(mut self, ticks: Tick) -> Self {
        self.arming_ticks = ticks;
        self
    }

    /// Set the hold-still check period in ticks.
    pub fn with_validation_period(mut self, ticks: Tick) -> Self {
        self.validation_period = ticks;
        self
    }

    /// Set the fuse duration in ticks.
    pub fn with_fuse_ticks(mut self, ticks: Tick) -> Self {
        self.fuse_ticks = ticks;
        self
    }

    /// Set the countdown broadcast period in ticks.
    pub fn with_broadcast_period(mut self, ticks: Tick) -> Self {
        self.broadcast_period = ticks;
        self
    }

    /// Set the explosion strength.
    pub fn with_power(mut self, power: f32) -> Self {
        self.power = power;
        self
    }

    /// Set the drift tolerance.
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Configuration for a coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Device session tuning.
    pub device: DeviceConfig,
    /// Maximum event log size (oldest events dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            max_events: 1000,
        }
    }
}

impl RuntimeConfig {
    /// Replace the device tuning.
    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.device = device;
        self
    }

    /// Set the maximum event log size (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = RuntimeConfig::default();
        assert_eq!(config.device.arming_ticks, 100);
        assert_eq!(config.device.validation_period, 2);
        assert_eq!(config.device.fuse_ticks, 200);
        assert_eq!(config.device.broadcast_period, 20);
        assert_eq!(config.device.target_block, BlockId::new("target"));
        assert_eq!(config.max_events, 1000);
    }

    #[test]
    fn config_builder_chain() {
        let config = RuntimeConfig::default()
            .with_device(
                DeviceConfig::default()
                    .with_arming_ticks(40)
                    .with_fuse_ticks(60)
                    .with_power(2.5),
            )
            .with_max_events(0);
        assert_eq!(config.device.arming_ticks, 40);
        assert_eq!(config.device.fuse_ticks, 60);
        assert!((config.device.power - 2.5).abs() < f32::EPSILON);
        assert_eq!(config.max_events, 0);
    }
}
