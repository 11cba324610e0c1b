//! Session configuration.
//!
//! A [`Config`] is supplied once when a [`World`](crate::world::World) is
//! built. Only the steering flag and the boundary mode may change while a
//! session is running. Every field has a default, so a RON file only needs
//! to name the values it overrides:
//!
//! ```ron
//! (
//!     width: 800.0,
//!     height: 600.0,
//!     boundary: Wrap,
//!     seed: Some(42),
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::kind::Kind;

/// What happens when an agent reaches the edge of the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BoundaryMode {
    /// Leave one edge, re-enter from the opposite edge.
    Wrap,
    /// Reflect off the edges, keeping the whole body inside.
    #[default]
    Bounce,
}

/// Inclusive range of initial speeds, in units per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedRange {
    /// Slowest initial speed.
    pub min: f32,
    /// Fastest initial speed.
    pub max: f32,
}

impl SpeedRange {
    /// Create a new speed range.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

/// 8-bit RGB color handed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Per-kind constants: size, color and speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KindProfile {
    /// Collision radius.
    pub radius: f32,
    /// Draw color.
    pub color: Rgb,
    /// Range the initial speed is drawn from.
    pub speed: SpeedRange,
}

/// Profile table indexed by kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindProfiles {
    /// Rock profile.
    pub rock: KindProfile,
    /// Paper profile.
    pub paper: KindProfile,
    /// Scissors profile.
    pub scissors: KindProfile,
}

impl KindProfiles {
    /// Look up the profile for `kind`.
    #[must_use]
    pub const fn get(&self, kind: Kind) -> &KindProfile {
        match kind {
            Kind::Rock => &self.rock,
            Kind::Paper => &self.paper,
            Kind::Scissors => &self.scissors,
        }
    }
}

impl Default for KindProfiles {
    fn default() -> Self {
        Self {
            rock: KindProfile {
                radius: 15.0,
                color: Rgb(120, 120, 120),
                speed: SpeedRange::new(50.0, 80.0),
            },
            paper: KindProfile {
                radius: 12.0,
                color: Rgb(255, 255, 100),
                speed: SpeedRange::new(80.0, 120.0),
            },
            scissors: KindProfile {
                radius: 13.0,
                color: Rgb(255, 100, 100),
                speed: SpeedRange::new(60.0, 100.0),
            },
        }
    }
}

/// Simulation parameters for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Arena width in world units.
    pub width: f32,
    /// Arena height in world units.
    pub height: f32,
    /// Per-kind radius, color and speed range.
    pub kinds: KindProfiles,
    /// Ticks an agent sits out after a resolved collision.
    pub collision_cooldown_ticks: u64,
    /// Same-kind collisions bounce apart instead of passing through.
    pub bounce_on_tie: bool,
    /// Edge behavior.
    pub boundary: BoundaryMode,
    /// Agents hunt their nearest prey.
    pub steering: bool,
    /// Agents per kind spawned by a default batch.
    pub spawn_batch_size: u32,
    /// Hard ceiling on simultaneously-live agents.
    pub max_population: usize,
    /// Seed for every random decision. `None` picks a fresh one at startup.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            kinds: KindProfiles::default(),
            collision_cooldown_ticks: 8,
            bounce_on_tie: true,
            boundary: BoundaryMode::Bounce,
            steering: true,
            spawn_batch_size: 10,
            max_population: 500,
            seed: None,
        }
    }
}

impl Config {
    /// Set the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the arena size.
    #[must_use]
    pub const fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the population cap.
    #[must_use]
    pub const fn with_max_population(mut self, max_population: usize) -> Self {
        self.max_population = max_population;
        self
    }

    /// Enable or disable steering.
    #[must_use]
    pub const fn with_steering(mut self, steering: bool) -> Self {
        self.steering = steering;
        self
    }

    /// Set the boundary mode.
    #[must_use]
    pub const fn with_boundary(mut self, boundary: BoundaryMode) -> Self {
        self.boundary = boundary;
        self
    }

    /// Profile for `kind`.
    #[must_use]
    pub const fn profile(&self, kind: Kind) -> &KindProfile {
        self.kinds.get(kind)
    }

    /// Load and validate a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Config = ron::from_str(&contents).map_err(|e| SimError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a config from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Config = ron::from_str(ron).map_err(|e| SimError::ConfigParse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SimError::InvalidState(format!("Failed to serialize config: {e}")))
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<()> {
        let finite_size = self.width.is_finite() && self.height.is_finite();
        if !(finite_size && self.width > 0.0 && self.height > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "arena must have positive finite size, got {}x{}",
                self.width, self.height
            )));
        }
        if self.max_population == 0 {
            return Err(SimError::InvalidConfig(
                "max_population must be at least 1".to_string(),
            ));
        }
        for kind in Kind::ALL {
            let profile = self.profile(kind);
            if !(profile.radius > 0.0) {
                return Err(SimError::InvalidConfig(format!(
                    "{kind} radius must be positive, got {}",
                    profile.radius
                )));
            }
            let SpeedRange { min, max } = profile.speed;
            if !(min >= 0.0 && min <= max && max.is_finite()) {
                return Err(SimError::InvalidConfig(format!(
                    "{kind} speed range must satisfy 0 <= min <= max < inf, got {min}..{max}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.profile(Kind::Rock).radius, 15.0);
        assert_eq!(config.profile(Kind::Paper).speed, SpeedRange::new(80.0, 120.0));
        assert_eq!(config.collision_cooldown_ticks, 8);
        assert_eq!(config.boundary, BoundaryMode::Bounce);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = Config::from_ron_str("(width: 640.0, boundary: Wrap, seed: Some(7))").unwrap();
        assert_eq!(config.width, 640.0);
        assert_eq!(config.height, 800.0);
        assert_eq!(config.boundary, BoundaryMode::Wrap);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_population, 500);
    }

    #[test]
    fn test_shipped_default_file_matches_defaults() {
        let shipped = Config::from_ron_str(include_str!("../../../config/default.ron")).unwrap();
        assert_eq!(shipped, Config::default());
    }

    #[test]
    fn test_ron_roundtrip() {
        let config = Config::default().with_seed(99).with_steering(false);
        let text = config.to_ron_string().unwrap();
        assert_eq!(Config::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_inverted_speed_range() {
        let mut config = Config::default();
        config.kinds.paper.speed = SpeedRange::new(10.0, 5.0);
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_cap_and_empty_arena() {
        assert!(Config::default().with_max_population(0).validate().is_err());
        assert!(Config::default().with_size(0.0, 100.0).validate().is_err());
    }

    #[test]
    fn test_rejects_unbounded_values() {
        assert!(Config::default().with_size(f32::INFINITY, 800.0).validate().is_err());
        assert!(Config::default().with_size(1200.0, f32::NAN).validate().is_err());

        let mut config = Config::default();
        config.kinds.rock.speed = SpeedRange::new(50.0, f32::INFINITY);
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_parse_error_names_source() {
        let err = Config::from_ron_str("(width: \"wide\")").unwrap_err();
        assert!(matches!(err, SimError::ConfigParse { ref path, .. } if path == "<inline>"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.ron");
        std::fs::write(&path, "(max_population: 42)").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.max_population, 42);

        assert!(matches!(
            Config::load(dir.path().join("missing.ron")),
            Err(SimError::Io(_))
        ));
    }
}
