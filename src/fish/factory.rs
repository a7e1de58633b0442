//! Entity factories for tanks, fish, pellets and eggs.

use std::collections::{BTreeMap, HashMap};

use glam::Vec2;
use tracing::debug;

use super::components::*;
use super::tuning::jitter;
use crate::audio::{AudioCue, AudioSink};
use crate::config::{ConfigError, SimConfig, SpeciesConfig, STAT_DEFAULTS};
use crate::rng::SimRng;
use crate::world::{EntityId, World};

/// Create the tank entity every other entity points back to.
pub fn spawn_tank(world: &mut World, label: impl Into<String>) -> EntityId {
    let tank = world.create_entity();
    world.add_component(
        tank,
        Tank {
            label: label.into(),
        },
    );
    world.add_component(tank, Position::new(0.0, 0.0));
    tank
}

/// Borrowed collaborators needed to populate a tank.
pub struct FishFactory<'a> {
    pub config: &'a SimConfig,
    pub rng: &'a mut SimRng,
    pub audio: &'a mut dyn AudioSink,
    pub tank: EntityId,
}

impl FishFactory<'_> {
    /// Create a swimming fish of `species_id` with its top-left corner at `(x, y)`.
    ///
    /// Species stats override `fish_defaults`; every numeric value then gets
    /// a small personal jitter.
    pub fn create_fish(
        &mut self,
        world: &mut World,
        species_id: &str,
        x: f32,
        y: f32,
    ) -> Result<EntityId, ConfigError> {
        let config = self.config;
        let species = config.species(species_id)?;
        let (stats, behavior) = self.merged_tables(species);
        let stat = |key: &str| -> f32 {
            stats
                .get(key)
                .copied()
                .or_else(|| {
                    STAT_DEFAULTS
                        .iter()
                        .find(|(name, _)| *name == key)
                        .map(|(_, v)| *v)
                })
                .unwrap_or(0.0)
        };

        let pos = Vec2::new(x, y);
        let speed = stat("speed");
        let hunger_max = stat("hunger_max");
        let health_max = stat("health_max");

        let fish = world.create_entity();
        world.add_component(fish, TankRef(self.tank));
        world.add_component(fish, Position(pos));
        world.add_component(
            fish,
            Sprite {
                image_id: species
                    .sprite
                    .clone()
                    .unwrap_or_else(|| species_id.to_string()),
                base_w: species.width,
                base_h: species.height,
                z: 1,
                faces_right: species.sprite_faces_right,
                mouth_fx: species.mouth_fx,
                mouth_fy: species.mouth_fy,
            },
        );
        world.add_component(
            fish,
            MotionParams::new(
                speed,
                stat("acceleration"),
                stat("turn_speed"),
                stat("dart_multiplier"),
            ),
        );
        world.add_component(fish, Velocity::zero());
        world.add_component(
            fish,
            Collider {
                radius: species.width * 0.4,
            },
        );
        world.add_component(fish, Age::new(species.max_age));
        world.add_component(fish, Hunger::full(hunger_max, stat("hunger_rate")));
        world.add_component(fish, Health::full(health_max));
        world.add_component(
            fish,
            Species {
                species_id: species_id.to_string(),
                display_name: title_case(species_id),
                base_speed: speed,
            },
        );
        world.add_component(fish, Breeding::default());
        world.add_component(fish, Brain::new(BehaviorState::Cruise));
        world.add_component(fish, BehaviorTuning::new(behavior));
        world.add_component(fish, TargetIntent(pos));
        world.add_component(fish, SteeringIntent::default());
        world.add_component(fish, SpeedIntent::default());

        debug!(fish = %fish, species = species_id, x, y, "fish created");
        Ok(fish)
    }

    /// Drop an egg: a full fish forced into the egg stage, sinking.
    ///
    /// A random species is chosen when none is given.
    pub fn spawn_egg_at(
        &mut self,
        world: &mut World,
        x: f32,
        y: f32,
        species_id: Option<&str>,
    ) -> Result<EntityId, ConfigError> {
        let species_id = match species_id {
            Some(id) => id.to_string(),
            None => {
                let ids: Vec<&String> = self.config.species.keys().collect();
                match self.rng.pick(&ids) {
                    Some(id) => id.to_string(),
                    None => return Err(ConfigError::EmptySpeciesTable),
                }
            }
        };
        let egg = self.create_fish(world, &species_id, x, y)?;

        if let Some(age) = world.get_component_mut::<Age>(egg) {
            *age = Age::egg(age.lifespan);
        }
        if let Some(brain) = world.get_component_mut::<Brain>(egg) {
            brain.state = BehaviorState::Egg;
            brain.current_desired_speed = 0.0;
        }
        world.add_component(egg, Velocity::zero());
        if !world.has_component::<AffectedByGravity>(egg) {
            let speed = self.config.balancing.egg_fall_speed;
            world.add_component(egg, AffectedByGravity { speed });
        }
        self.audio.play(AudioCue::PelletDrop);
        Ok(egg)
    }

    /// Drop a food pellet at `(x, y)`; it sinks until eaten or resting.
    pub fn spawn_pellet(&mut self, world: &mut World, x: f32, y: f32) -> EntityId {
        let cfg = &self.config.pellets;
        let pellet = world.create_entity();
        world.add_component(pellet, TankRef(self.tank));
        world.add_component(pellet, Position::new(x, y));
        world.add_component(pellet, Sprite::new(cfg.sprite.clone(), cfg.width, cfg.height));
        world.add_component(
            pellet,
            FoodPellet {
                nutrition: cfg.nutrition,
                radius_scale: cfg.radius_scale,
                center_off: Vec2::new(cfg.center_offset_x, cfg.center_offset_y),
            },
        );
        world.add_component(
            pellet,
            AffectedByGravity {
                speed: cfg.fall_speed,
            },
        );
        self.audio.play(AudioCue::PelletDrop);
        pellet
    }

    /// Jittered (stats, behavior) tables for one new fish.
    fn merged_tables(
        &mut self,
        species: &SpeciesConfig,
    ) -> (BTreeMap<String, f32>, HashMap<String, f32>) {
        let defaults = &self.config.fish_defaults;
        let mut stats = defaults.clone();
        for (key, value) in species.numeric_stats() {
            stats.insert(key.to_string(), value);
        }

        let mut behavior: BTreeMap<String, f32> = defaults
            .keys()
            .filter_map(|k| stats.get(k).map(|v| (k.clone(), *v)))
            .collect();
        behavior.extend(species.behavior.iter().map(|(k, v)| (k.clone(), *v)));

        for (key, value) in stats.iter_mut() {
            *value = jitter(self.rng, key, *value);
        }
        let behavior = behavior
            .into_iter()
            .map(|(key, value)| {
                let value = jitter(self.rng, &key, value);
                (key, value)
            })
            .collect();
        (stats, behavior)
    }
}

/// "clown_fish" -> "Clown_Fish"
fn title_case(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut boundary = true;
    for c in id.chars() {
        if boundary {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        boundary = !c.is_alphabetic();
    }
    out
}
