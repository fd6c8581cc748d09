use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CoreError, CoreResult};
use crate::host::GameMode;

/// Smallest accepted region radius.
pub const MIN_RADIUS: u32 = 1;
/// Largest accepted region radius.
pub const MAX_RADIUS: u32 = 8192;

/// The restricted mode applied to players inside the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionMode {
    /// Players inside may interact but not build.
    #[default]
    Adventure,
    /// Players inside may only observe.
    Spectator,
}

impl RegionMode {
    /// The host game mode this region mode maps to.
    pub fn game_mode(self) -> GameMode {
        match self {
            Self::Adventure => GameMode::Adventure,
            Self::Spectator => GameMode::Spectator,
        }
    }
}

impl fmt::Display for RegionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.game_mode().fmt(f)
    }
}

impl FromStr for RegionMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adventure" | "a" => Ok(Self::Adventure),
            "spectator" | "b" => Ok(Self::Spectator),
            other => Err(CoreError::Validation(format!(
                "unknown mode '{other}' (expected adventure or spectator)"
            ))),
        }
    }
}

/// Horizontal center of the region.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionCenter {
    /// East-west coordinate.
    pub x: f64,
    /// North-south coordinate.
    pub z: f64,
}

impl RegionCenter {
    /// Create a center from its coordinates.
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }
}

/// The administrative configuration, persisted as a single blob.
///
/// Session and presence state are never part of this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Whether presence tracking is active.
    pub enabled: bool,
    /// Region center.
    pub center: RegionCenter,
    /// Half-width of the square region, in blocks.
    pub radius: u32,
    /// Mode applied on entering.
    pub mode: RegionMode,
    /// Minimum ticks between two mode toggles of the same player.
    pub cooldown_ticks: u64,
    /// Ticks between two presence checks of the same player (0 = every tick).
    pub check_interval_ticks: u64,
    /// Player names exempt from the region.
    pub whitelist: Vec<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            center: RegionCenter::default(),
            radius: 64,
            mode: RegionMode::default(),
            cooldown_ticks: 100,
            check_interval_ticks: 20,
            whitelist: Vec::new(),
        }
    }
}

impl AdminConfig {
    /// Parse a persisted blob, clamping out-of-range values.
    pub fn from_json(blob: &str) -> CoreResult<Self> {
        let mut config: Self = serde_json::from_str(blob)?;
        config.sanitize();
        Ok(config)
    }

    /// Serialize to the persisted blob format.
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate a radius argument.
    pub fn check_radius(radius: i64) -> CoreResult<u32> {
        if radius < i64::from(MIN_RADIUS) || radius > i64::from(MAX_RADIUS) {
            return Err(CoreError::Validation(format!(
                "radius must be between {MIN_RADIUS} and {MAX_RADIUS}, got {radius}"
            )));
        }
        Ok(radius as u32)
    }

    /// Case-insensitive whitelist lookup.
    pub fn is_whitelisted(&self, name: &str) -> bool {
        self.whitelist.iter().any(|w| w.eq_ignore_ascii_case(name))
    }

    /// Add a name to the whitelist. Returns false if it was already present.
    pub fn whitelist_add(&mut self, name: &str) -> bool {
        if self.is_whitelisted(name) {
            return false;
        }
        self.whitelist.push(name.to_string());
        true
    }

    /// Remove a name from the whitelist. Returns false if it was absent.
    pub fn whitelist_remove(&mut self, name: &str) -> bool {
        let before = self.whitelist.len();
        self.whitelist.retain(|w| !w.eq_ignore_ascii_case(name));
        self.whitelist.len() != before
    }

    fn sanitize(&mut self) {
        let clamped = self.radius.clamp(MIN_RADIUS, MAX_RADIUS);
        if clamped != self.radius {
            warn!(
                radius = self.radius,
                clamped, "persisted radius out of range, clamping"
            );
            self.radius = clamped;
        }
        if !self.center.x.is_finite() || !self.center.z.is_finite() {
            warn!("persisted center is not finite, resetting to origin");
            self.center = RegionCenter::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AdminConfig::default();
        assert!(config.enabled);
        assert_eq!(config.radius, 64);
        assert_eq!(config.mode, RegionMode::Adventure);
        assert!(config.whitelist.is_empty());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = AdminConfig::from_json(r#"{"radius": 10}"#).unwrap();
        assert_eq!(config.radius, 10);
        assert_eq!(config.cooldown_ticks, 100);
        assert!(config.enabled);
    }

    #[test]
    fn out_of_range_radius_is_clamped() {
        let config = AdminConfig::from_json(r#"{"radius": 100000}"#).unwrap();
        assert_eq!(config.radius, MAX_RADIUS);
        let config = AdminConfig::from_json(r#"{"radius": 0}"#).unwrap();
        assert_eq!(config.radius, MIN_RADIUS);
    }

    #[test]
    fn json_round_trip_preserves_whitelist() {
        let mut config = AdminConfig::default();
        config.whitelist_add("Alex");
        config.mode = RegionMode::Spectator;
        let back = AdminConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn malformed_blob_is_an_error() {
        assert!(AdminConfig::from_json("{not json").is_err());
    }

    #[test]
    fn radius_bounds_checked() {
        assert!(AdminConfig::check_radius(0).is_err());
        assert!(AdminConfig::check_radius(8193).is_err());
        assert_eq!(AdminConfig::check_radius(1).unwrap(), 1);
        assert_eq!(AdminConfig::check_radius(8192).unwrap(), 8192);
    }

    #[test]
    fn whitelist_is_case_insensitive() {
        let mut config = AdminConfig::default();
        assert!(config.whitelist_add("Steve"));
        assert!(!config.whitelist_add("steve"));
        assert!(config.is_whitelisted("STEVE"));
        assert!(config.whitelist_remove("sTeVe"));
        assert!(!config.whitelist_remove("steve"));
        assert!(config.whitelist.is_empty());
    }

    #[test]
    fn mode_parses_aliases() {
        assert_eq!("adventure".parse::<RegionMode>().unwrap(), RegionMode::Adventure);
        assert_eq!("B".parse::<RegionMode>().unwrap(), RegionMode::Spectator);
        assert!("creative".parse::<RegionMode>().is_err());
    }
}
