//! Read-only tuning tables for a simulation run.
//!
//! Every section derives `Deserialize` with `#[serde(default)]`, so a config
//! file only needs the keys it wants to change; anything missing falls back to
//! the values below.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::fish::tuning::TuningKey;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown species '{0}'")]
    UnknownSpecies(String),
    #[error("species table is empty")]
    EmptySpeciesTable,
}

/// Logical tank geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TankConfig {
    pub logical_tank_width: f32,
    pub logical_tank_height: f32,
    /// Sand line as a fraction of tank height, used when `sand_top_px` is unset.
    pub sand_top_ratio: f32,
    pub sand_top_px: Option<f32>,
    /// Height of the band above the tank bottom that living fish stay out of.
    pub swim_bottom_margin: f32,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            logical_tank_width: 1000.0,
            logical_tank_height: 600.0,
            sand_top_ratio: 1.0,
            sand_top_px: None,
            swim_bottom_margin: 64.0,
        }
    }
}

impl TankConfig {
    pub fn width(&self) -> f32 {
        self.logical_tank_width
    }

    pub fn height(&self) -> f32 {
        self.logical_tank_height
    }

    /// Lowest y a living fish may swim at.
    pub fn swim_floor_y(&self) -> f32 {
        self.logical_tank_height - self.swim_bottom_margin
    }

    /// Top of the sand, where falling objects come to rest.
    pub fn sand_line_y(&self) -> f32 {
        let h = self.logical_tank_height;
        match self.sand_top_px {
            Some(px) if px >= 0.0 => px.min(h),
            _ => h * self.sand_top_ratio.clamp(0.0, 1.0),
        }
    }
}

/// Global balancing constants for steering and state handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancingConfig {
    pub movement_damping: f32,
    pub wall_bounce: f32,
    pub typical_max_speed: f32,
    pub avoidance_margin: f32,
    pub avoidance_max_strength: f32,
    pub dead_sink_speed: f32,
    pub egg_fall_speed: f32,
    pub state_speed_smoothing: f32,
    pub idle_arrival_threshold: f32,
    pub idle_bob_x_factor: f32,
    pub idle_bob_y_factor: f32,
    pub idle_retarget_interval: f32,
    pub look_for_food_retarget_interval: f32,
}

impl Default for BalancingConfig {
    fn default() -> Self {
        Self {
            movement_damping: 0.995,
            wall_bounce: 0.30,
            typical_max_speed: 40.0,
            avoidance_margin: 20.0,
            avoidance_max_strength: 0.25,
            dead_sink_speed: 30.0,
            egg_fall_speed: 55.0,
            state_speed_smoothing: 0.10,
            idle_arrival_threshold: 6.0,
            idle_bob_x_factor: 1.0,
            idle_bob_y_factor: 0.8,
            idle_retarget_interval: 4.0,
            look_for_food_retarget_interval: 0.8,
        }
    }
}

/// Life-stage thresholds and egg timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgingConfig {
    pub elder_threshold_ratio: f32,
    pub juvenile_threshold_ratio: f32,
    pub elder_speed_multiplier_min: f32,
    pub juvenile_speed_multiplier_min: f32,
    pub elder_health_decay_at_max_per_sec: f32,
    pub hard_death_at_lifespan: bool,
    pub egg_duration_sec: Option<f32>,
    pub egg_threshold_ratio: Option<f32>,
}

/// Hatch time used when neither an absolute duration nor a ratio is configured.
pub const FALLBACK_HATCH_SECONDS: f32 = 8.0;

impl Default for AgingConfig {
    fn default() -> Self {
        Self {
            elder_threshold_ratio: 0.80,
            juvenile_threshold_ratio: 0.15,
            elder_speed_multiplier_min: 0.70,
            juvenile_speed_multiplier_min: 0.85,
            elder_health_decay_at_max_per_sec: 0.04,
            hard_death_at_lifespan: true,
            egg_duration_sec: Some(12.0),
            egg_threshold_ratio: None,
        }
    }
}

impl AgingConfig {
    /// Seconds an egg incubates: absolute duration, else a share of the
    /// lifespan, else [`FALLBACK_HATCH_SECONDS`].
    pub fn hatch_seconds(&self, lifespan: f32) -> f32 {
        if let Some(secs) = self.egg_duration_sec {
            return secs.max(0.0);
        }
        if let Some(ratio) = self.egg_threshold_ratio {
            return (lifespan * ratio.clamp(0.0, 1.0)).max(0.0);
        }
        FALLBACK_HATCH_SECONDS
    }
}

/// What a dropped pellet looks like and how much it feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PelletConfig {
    pub sprite: String,
    pub width: f32,
    pub height: f32,
    pub radius_scale: f32,
    pub nutrition: f32,
    pub fall_speed: f32,
    pub center_offset_x: f32,
    pub center_offset_y: f32,
}

impl Default for PelletConfig {
    fn default() -> Self {
        Self {
            sprite: "pellet".to_string(),
            width: 16.0,
            height: 16.0,
            radius_scale: 1.35,
            nutrition: 40.0,
            fall_speed: 60.0,
            center_offset_x: 0.0,
            center_offset_y: 0.0,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_mouth_fx() -> f32 {
    0.85
}

fn default_mouth_fy() -> f32 {
    0.5
}

/// One species record. `width`, `height` and `max_age` are required; any other
/// numeric key overrides the matching entry of `fish_defaults`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConfig {
    pub width: f32,
    pub height: f32,
    pub max_age: f32,
    #[serde(default)]
    pub sprite: Option<String>,
    #[serde(default = "default_true")]
    pub sprite_faces_right: bool,
    #[serde(default = "default_mouth_fx")]
    pub mouth_fx: f32,
    #[serde(default = "default_mouth_fy")]
    pub mouth_fy: f32,
    /// Explicit behavior overrides, applied after the merged stats.
    #[serde(default)]
    pub behavior: BTreeMap<String, f32>,
    #[serde(flatten)]
    pub stats: BTreeMap<String, serde_json::Value>,
}

impl SpeciesConfig {
    pub fn new(width: f32, height: f32, max_age: f32) -> Self {
        Self {
            width,
            height,
            max_age,
            sprite: None,
            sprite_faces_right: true,
            mouth_fx: default_mouth_fx(),
            mouth_fy: default_mouth_fy(),
            behavior: BTreeMap::new(),
            stats: BTreeMap::new(),
        }
    }

    /// Numeric stat overrides; non-numeric extras are ignored.
    pub fn numeric_stats(&self) -> impl Iterator<Item = (&str, f32)> + '_ {
        self.stats
            .iter()
            .filter_map(|(k, v)| v.as_f64().map(|n| (k.as_str(), n as f32)))
    }
}

/// Settings for the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub seed: Option<u64>,
    pub ticks: u64,
    pub fixed_dt: f32,
    pub census_interval_ticks: u64,
    pub pellet_interval_ticks: u64,
    /// Fish spawned per species at startup.
    pub fish_per_species: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: None,
            ticks: 3_600,
            fixed_dt: 1.0 / 60.0,
            census_interval_ticks: 300,
            pellet_interval_ticks: 240,
            fish_per_species: 3,
        }
    }
}

impl RunConfig {
    /// Replace a step that could never advance the simulation.
    fn sanitize(&mut self) {
        if !(self.fixed_dt.is_finite() && self.fixed_dt > 0.0) {
            let fallback = Self::default().fixed_dt;
            warn!(
                "run.fixed_dt {} is not a positive step, using {}",
                self.fixed_dt, fallback
            );
            self.fixed_dt = fallback;
        }
    }
}

/// Movement and vitals stats every fish starts from before species overrides.
pub const STAT_DEFAULTS: [(&str, f32); 7] = [
    ("speed", 40.0),
    ("acceleration", 30.0),
    ("turn_speed", 3.0),
    ("dart_multiplier", 2.5),
    ("hunger_max", 100.0),
    ("hunger_rate", 0.5),
    ("health_max", 100.0),
];

/// Complete configuration of one run. Built once, never mutated mid-run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub tank: TankConfig,
    pub balancing: BalancingConfig,
    pub aging: AgingConfig,
    pub pellets: PelletConfig,
    pub fish_defaults: BTreeMap<String, f32>,
    pub species: BTreeMap<String, SpeciesConfig>,
    pub run: RunConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        let mut species = BTreeMap::new();
        species.insert("goldfish".to_string(), SpeciesConfig::new(60.0, 40.0, 400.0));
        Self {
            tank: TankConfig::default(),
            balancing: BalancingConfig::default(),
            aging: AgingConfig::default(),
            pellets: PelletConfig::default(),
            fish_defaults: default_fish_table(),
            species,
            run: RunConfig::default(),
        }
    }
}

/// Stat defaults plus the documented default of every behavior key.
pub fn default_fish_table() -> BTreeMap<String, f32> {
    STAT_DEFAULTS
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .chain(
            TuningKey::ALL
                .iter()
                .map(|key| (key.name().to_string(), key.default_value())),
        )
        .collect()
}

impl SimConfig {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_str(text)?;
        config.run.sanitize();
        for (species, key) in config.unknown_behavior_keys() {
            warn!("species {} sets unknown behavior key {}, ignored", species, key);
        }
        Ok(config)
    }

    /// `(species, key)` pairs in species behavior tables that no state reads.
    pub fn unknown_behavior_keys(&self) -> Vec<(&str, &str)> {
        self.species
            .iter()
            .flat_map(|(id, species)| {
                species
                    .behavior
                    .keys()
                    .filter(|key| TuningKey::from_name(key).is_none())
                    .map(move |key| (id.as_str(), key.as_str()))
            })
            .collect()
    }

    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!("config {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = Self::from_json_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            "loaded config {} ({} species)",
            path.display(),
            config.species.len()
        );
        Ok(config)
    }

    pub fn species(&self, id: &str) -> Result<&SpeciesConfig, ConfigError> {
        self.species
            .get(id)
            .ok_or_else(|| ConfigError::UnknownSpecies(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SimConfig::from_json_str(
            r#"{
                "tank": { "logical_tank_width": 200 },
                "balancing": { "wall_bounce": 0.5 },
                "species": {
                    "guppy": { "width": 30, "height": 20, "max_age": 120, "speed": 55,
                               "behavior": { "food_seek_threshold": 0.7 } }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.tank.logical_tank_width, 200.0);
        assert_eq!(config.tank.logical_tank_height, 600.0);
        assert_eq!(config.balancing.wall_bounce, 0.5);
        assert_eq!(config.balancing.movement_damping, 0.995);
        let guppy = config.species("guppy").unwrap();
        assert!(guppy.sprite_faces_right);
        assert_eq!(guppy.behavior["food_seek_threshold"], 0.7);
        let stats: Vec<_> = guppy.numeric_stats().collect();
        assert_eq!(stats, vec![("speed", 55.0)]);
        assert!(matches!(
            config.species("shark"),
            Err(ConfigError::UnknownSpecies(_))
        ));
    }

    #[test]
    fn species_missing_required_key_is_a_parse_error() {
        let err = SimConfig::from_json_str(r#"{ "species": { "x": { "width": 3 } } }"#);
        assert!(err.is_err());
    }

    #[test]
    fn hatch_time_prefers_seconds_then_ratio_then_fallback() {
        let mut aging = AgingConfig::default();
        assert_eq!(aging.hatch_seconds(100.0), 12.0);
        aging.egg_duration_sec = None;
        aging.egg_threshold_ratio = Some(0.1);
        assert!((aging.hatch_seconds(100.0) - 10.0).abs() < 1e-5);
        aging.egg_threshold_ratio = None;
        assert_eq!(aging.hatch_seconds(100.0), FALLBACK_HATCH_SECONDS);
    }

    #[test]
    fn sand_line_prefers_pixels() {
        let mut tank = TankConfig::default();
        assert_eq!(tank.sand_line_y(), 600.0);
        tank.sand_top_ratio = 0.9;
        assert!((tank.sand_line_y() - 540.0).abs() < 1e-3);
        tank.sand_top_px = Some(700.0);
        assert_eq!(tank.sand_line_y(), 600.0);
        assert_eq!(tank.swim_floor_y(), 536.0);
    }

    #[test]
    fn unknown_behavior_keys_are_reported() {
        let config = SimConfig::from_json_str(
            r#"{ "species": { "guppy": { "width": 30, "height": 20, "max_age": 120,
                 "behavior": { "food_seek_threshold": 0.7, "wings": 2 } } } }"#,
        )
        .unwrap();
        assert_eq!(config.unknown_behavior_keys(), vec![("guppy", "wings")]);
        assert!(SimConfig::default().unknown_behavior_keys().is_empty());
    }

    #[test]
    fn non_positive_step_falls_back_to_default() {
        for dt in ["0", "-0.5"] {
            let text = format!(r#"{{ "run": {{ "fixed_dt": {dt}, "ticks": 10 }} }}"#);
            let config = SimConfig::from_json_str(&text).unwrap();
            assert_eq!(config.run.fixed_dt, RunConfig::default().fixed_dt);
            assert_eq!(config.run.ticks, 10);
        }
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = SimConfig::load("definitely/not/here.json").unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn default_fish_table_covers_behavior_keys() {
        let table = default_fish_table();
        assert_eq!(table["speed"], 40.0);
        assert_eq!(
            table[TuningKey::FoodSeekThreshold.name()],
            TuningKey::FoodSeekThreshold.default_value()
        );
    }
}
