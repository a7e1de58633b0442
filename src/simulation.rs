//! Fixed-order tick driver that owns one tank.

use tracing::{debug, info};

use crate::audio::{AudioSink, SilentAudio};
use crate::config::{ConfigError, SimConfig};
use crate::fish::behavior::StateCtx;
use crate::fish::census::TankCensus;
use crate::fish::factory::{spawn_tank, FishFactory};
use crate::fish::lifecycle::{update_aging, update_health, update_hunger};
use crate::fish::motion::{update_avoidance, update_collision, update_gravity, update_movement};
use crate::fish::pipeline::{apply_overrides, BehaviorPipeline};
use crate::rng::SimRng;
use crate::world::{EntityId, World};

/// A running tank: the store, its configuration and the per-run state the
/// systems need between ticks.
pub struct Simulation {
    world: World,
    config: SimConfig,
    rng: SimRng,
    audio: Box<dyn AudioSink>,
    pipeline: BehaviorPipeline,
    tank: EntityId,
    tick: u64,
    elapsed: f32,
    time_scale: f32,
    /// Scale to restore when unpausing.
    paused_scale: Option<f32>,
}

impl Simulation {
    /// Build an empty tank. Seeds from `config.run.seed` when present.
    pub fn new(config: SimConfig) -> Self {
        let rng = match config.run.seed {
            Some(seed) => SimRng::seeded(seed),
            None => SimRng::from_entropy(),
        };
        Self::with_parts(config, rng, Box::new(SilentAudio))
    }

    pub fn with_parts(config: SimConfig, rng: SimRng, audio: Box<dyn AudioSink>) -> Self {
        let mut world = World::new();
        let tank = spawn_tank(&mut world, "main");
        info!(
            "tank ready: {}x{} logical units, {} species",
            config.tank.width(),
            config.tank.height(),
            config.species.len()
        );
        Self {
            world,
            config,
            rng,
            audio,
            pipeline: BehaviorPipeline::new(),
            tank,
            tick: 0,
            elapsed: 0.0,
            time_scale: 1.0,
            paused_scale: None,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct store access for tools that place or edit entities between ticks.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tank(&self) -> EntityId {
        self.tank
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds, after time scaling.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn pipeline(&self) -> &BehaviorPipeline {
        &self.pipeline
    }

    /// Replace the configuration between ticks.
    pub fn swap_config(&mut self, config: SimConfig) -> SimConfig {
        debug!("configuration swapped at tick {}", self.tick);
        std::mem::replace(&mut self.config, config)
    }

    // -- Time control ---------------------------------------------------------

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Negative scales are treated as zero.
    pub fn set_time_scale(&mut self, scale: f32) {
        let scale = scale.max(0.0);
        if self.paused_scale.is_some() {
            self.paused_scale = Some(scale);
        } else {
            self.time_scale = scale;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_scale.is_some()
    }

    /// Pause, or resume at the scale in effect before pausing.
    pub fn toggle_pause(&mut self) -> bool {
        match self.paused_scale.take() {
            Some(previous) => self.time_scale = previous,
            None => {
                self.paused_scale = Some(self.time_scale);
                self.time_scale = 0.0;
            }
        }
        info!(paused = self.is_paused(), "pause toggled");
        self.is_paused()
    }

    // -- Ticking --------------------------------------------------------------

    /// Advance one complete tick of `dt` wall seconds.
    ///
    /// Returns false without touching the store when paused or when the
    /// scaled step is not positive.
    pub fn tick(&mut self, dt: f32) -> bool {
        let dt = dt * self.time_scale;
        if self.is_paused() || !(dt > 0.0) {
            return false;
        }
        self.step(dt);
        true
    }

    fn step(&mut self, dt: f32) {
        let config = &self.config;

        update_hunger(&mut self.world, dt);
        update_health(&mut self.world, dt);
        update_aging(&mut self.world, config, dt);

        let mut ctx = StateCtx {
            config,
            world: &mut self.world,
            rng: &mut self.rng,
            audio: self.audio.as_mut(),
            dt,
        };
        let mut proposals = self.pipeline.propose(&mut ctx);
        apply_overrides(ctx.world, &mut proposals);
        let changed = self.pipeline.commit(&mut ctx, &proposals);

        update_avoidance(&mut self.world, config);
        update_movement(&mut self.world, config, &mut self.rng, dt);
        update_collision(&mut self.world, config);
        update_gravity(&mut self.world, config, dt);

        self.tick += 1;
        self.elapsed += dt;
        if changed > 0 {
            debug!(tick = self.tick, changed, "behavior transitions committed");
        }
    }

    // -- Spawning -------------------------------------------------------------

    fn factory(&mut self) -> (FishFactory<'_>, &mut World) {
        (
            FishFactory {
                config: &self.config,
                rng: &mut self.rng,
                audio: self.audio.as_mut(),
                tank: self.tank,
            },
            &mut self.world,
        )
    }

    pub fn create_fish(&mut self, species_id: &str, x: f32, y: f32) -> Result<EntityId, ConfigError> {
        let (mut factory, world) = self.factory();
        factory.create_fish(world, species_id, x, y)
    }

    pub fn spawn_pellet(&mut self, x: f32, y: f32) -> EntityId {
        let (mut factory, world) = self.factory();
        factory.spawn_pellet(world, x, y)
    }

    pub fn spawn_egg_at(
        &mut self,
        x: f32,
        y: f32,
        species_id: Option<&str>,
    ) -> Result<EntityId, ConfigError> {
        let (mut factory, world) = self.factory();
        factory.spawn_egg_at(world, x, y, species_id)
    }

    /// Drop a pellet at a random x just under the surface.
    pub fn drop_random_pellet(&mut self) -> EntityId {
        let max_x = (self.config.tank.width() - self.config.pellets.width).max(0.0);
        let x = self.rng.range(0.0, max_x);
        self.spawn_pellet(x, 0.0)
    }

    /// Spawn `per_species` fish of every configured species at random
    /// positions above the swim floor.
    pub fn populate(&mut self, per_species: usize) -> Result<Vec<EntityId>, ConfigError> {
        let species: Vec<(String, f32, f32)> = self
            .config
            .species
            .iter()
            .map(|(id, s)| (id.clone(), s.width, s.height))
            .collect();
        let width = self.config.tank.width();
        let floor = self.config.tank.swim_floor_y();

        let mut spawned = Vec::with_capacity(species.len() * per_species);
        for (id, w, h) in &species {
            for _ in 0..per_species {
                let x = self.rng.range(0.0, (width - w).max(0.0));
                let y = self.rng.range(0.0, (floor - h).max(0.0));
                spawned.push(self.create_fish(id, x, y)?);
            }
        }
        info!("populated tank with {} fish", spawned.len());
        Ok(spawned)
    }

    pub fn census(&self) -> TankCensus {
        TankCensus::collect(&self.world)
    }
}
