//! Fish-tank simulation core: an entity-component store, per-fish behavior
//! state machines and a steering/physics pipeline advanced in fixed ticks.

pub mod audio;
pub mod config;
pub mod fish;
pub mod rng;
pub mod simulation;
pub mod world;

pub use audio::{AudioCue, AudioSink, CueRecorder, SilentAudio};
pub use config::{ConfigError, SimConfig};
pub use rng::SimRng;
pub use simulation::Simulation;
pub use world::{EntityId, World};
