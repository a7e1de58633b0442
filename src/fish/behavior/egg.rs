use super::{StateCtx, StateHandler};
use crate::fish::components::{BehaviorState, StateWorking};
use crate::fish::view::FishView;

/// Sit still until hatched. Leaving this state is the override stage's call.
pub struct EggState;

impl EggState {
    fn hold(fish: &mut FishView) {
        fish.speed.desired_speed = 0.0;
        let here = fish.pos.0;
        fish.set_target(here);
    }
}

impl StateHandler for EggState {
    fn enter(&self, fish: &mut FishView, _ctx: &mut StateCtx<'_>) {
        fish.brain.current_desired_speed = 0.0;
        fish.brain.working = StateWorking::None;
        Self::hold(fish);
    }

    fn update(&self, fish: &mut FishView, _ctx: &mut StateCtx<'_>) -> Option<BehaviorState> {
        Self::hold(fish);
        None
    }
}
