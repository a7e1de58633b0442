use std::time::Duration;

use aquarium_sim::{CueRecorder, SimConfig, SimRng, Simulation};
use bevy::app::{AppExit, ScheduleRunnerPlugin};
use bevy::prelude::{App, EventWriter, MinimalPlugins, PluginGroup, ResMut, Resource, Update};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// The tank and the bookkeeping the runner needs around it.
#[derive(Resource)]
struct TankRun {
    sim: Simulation,
    cues: CueRecorder,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match SimConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                error!("failed to load config: {}", err);
                std::process::exit(1);
            }
        },
        None => SimConfig::default(),
    };

    let rng = match config.run.seed {
        Some(seed) => SimRng::seeded(seed),
        None => SimRng::from_entropy(),
    };
    let cues = CueRecorder::new();
    let per_species = config.run.fish_per_species;
    let frame = Duration::from_secs_f32(config.run.fixed_dt.max(1e-4));

    let mut sim = Simulation::with_parts(config, rng, Box::new(cues.clone()));
    if let Err(err) = sim.populate(per_species) {
        error!("failed to populate tank: {}", err);
        std::process::exit(1);
    }

    info!("Aquarium simulator initialized");

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(frame)))
        .insert_resource(TankRun { sim, cues })
        .add_systems(Update, advance_tank)
        .run();
}

/// One fixed step per frame, then exit once the run is finished.
fn advance_tank(mut tank: ResMut<TankRun>, mut exit: EventWriter<AppExit>) {
    let TankRun { sim, cues } = &mut *tank;
    if run_frame(sim) {
        info!("[AUDIO] {} cues played in total", cues.cues().len());
        exit.send(AppExit);
    }
}

/// Advance one fixed step and run the pellet and census intervals.
///
/// Interval work only happens on frames that actually advanced the tank.
/// Returns true once the configured tick count is reached.
fn run_frame(sim: &mut Simulation) -> bool {
    let run = sim.config().run.clone();
    if sim.tick(run.fixed_dt) {
        let tick = sim.tick_count();
        if run.pellet_interval_ticks > 0 && tick % run.pellet_interval_ticks == 0 {
            sim.drop_random_pellet();
        }
        if run.census_interval_ticks > 0 && tick % run.census_interval_ticks == 0 {
            sim.census().log(tick);
        }
    }

    let tick = sim.tick_count();
    if tick < run.ticks {
        return false;
    }
    sim.census().log(tick);
    info!(
        "run finished after {} ticks ({:.1}s simulated)",
        tick,
        sim.elapsed()
    );
    true
}
