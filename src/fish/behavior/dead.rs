use super::{StateCtx, StateHandler};
use crate::fish::components::{AffectedByGravity, BehaviorState, StateWorking};
use crate::fish::view::FishView;

/// Corpse: no propulsion, sinks under gravity.
pub struct DeadState;

impl StateHandler for DeadState {
    fn enter(&self, fish: &mut FishView, ctx: &mut StateCtx<'_>) {
        fish.brain.current_desired_speed = 0.0;
        fish.brain.working = StateWorking::None;
        fish.speed.desired_speed = 0.0;
        let speed = ctx.config.balancing.dead_sink_speed;
        ctx.world.add_component(fish.id, AffectedByGravity { speed });
    }

    fn update(&self, fish: &mut FishView, _ctx: &mut StateCtx<'_>) -> Option<BehaviorState> {
        fish.speed.desired_speed = 0.0;
        None
    }
}
