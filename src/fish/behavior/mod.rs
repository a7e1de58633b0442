//! Per-fish state machine handlers.
//!
//! Handlers are stateless unit structs; everything a fish carries between
//! calls lives on its [`Brain`](super::components::Brain) and tuning table.

mod chase_food;
mod cruise;
mod dead;
mod egg;
mod idle;
mod look_for_food;

pub use chase_food::ChaseFoodState;
pub use cruise::CruiseState;
pub use dead::DeadState;
pub use egg::EggState;
pub use idle::IdleState;
pub use look_for_food::LookForFoodState;

use glam::Vec2;

use super::components::BehaviorState;
use super::view::FishView;
use crate::audio::AudioSink;
use crate::config::SimConfig;
use crate::rng::SimRng;
use crate::world::World;

/// Everything a handler may touch besides the fish itself.
pub struct StateCtx<'a> {
    pub config: &'a SimConfig,
    pub world: &'a mut World,
    pub rng: &'a mut SimRng,
    pub audio: &'a mut dyn AudioSink,
    pub dt: f32,
}

impl StateCtx<'_> {
    /// Uniformly random point inside the tank.
    pub fn random_tank_point(&mut self) -> Vec2 {
        let tank = &self.config.tank;
        let x = self.rng.range(0.0, tank.width());
        let y = self.rng.range(0.0, tank.height());
        Vec2::new(x, y)
    }

    pub fn smoothing(&self) -> f32 {
        self.config.balancing.state_speed_smoothing
    }
}

pub trait StateHandler: Sync {
    /// Called once when the fish starts occupying this state.
    fn enter(&self, fish: &mut FishView, ctx: &mut StateCtx<'_>);

    fn exit(&self, _fish: &mut FishView, _ctx: &mut StateCtx<'_>) {}

    /// Steer the fish for this tick and optionally propose the next state.
    fn update(&self, fish: &mut FishView, ctx: &mut StateCtx<'_>) -> Option<BehaviorState>;
}

/// Dispatch table from state to its handler.
pub fn handler(state: BehaviorState) -> &'static dyn StateHandler {
    match state {
        BehaviorState::Idle => &IdleState,
        BehaviorState::Cruise => &CruiseState,
        BehaviorState::LookForFood => &LookForFoodState,
        BehaviorState::ChaseFood => &ChaseFoodState,
        BehaviorState::Egg => &EggState,
        BehaviorState::Dead => &DeadState,
    }
}

/// Hunger below the seek threshold.
fn is_hungry(fish: &FishView) -> bool {
    fish.hunger.ratio() < fish.tuning.get(super::tuning::TuningKey::FoodSeekThreshold)
}
