use super::{StateCtx, StateHandler};
use crate::fish::components::{BehaviorState, CruiseWorking, StateWorking};
use crate::fish::tuning::TuningKey;
use crate::fish::view::FishView;

/// Swim between random points across the tank.
pub struct CruiseState;

impl StateHandler for CruiseState {
    fn enter(&self, fish: &mut FishView, ctx: &mut StateCtx<'_>) {
        let t = &fish.tuning;
        let working = CruiseWorking {
            min_time: t.get(TuningKey::CruiseMinTime),
            max_time: t.get(TuningKey::CruiseMaxTime),
            arrival_radius: t.get(TuningKey::CruiseArrivalRadius),
            speed_factor: t.get(TuningKey::CruiseSpeedFactor),
            leave_chance: t.get(TuningKey::TransitionToIdleChance),
        };
        fish.brain.state_timer = 0.0;
        let point = ctx.random_tank_point();
        fish.set_target(point);
        fish.brain.next_state_time = working.min_time + ctx.rng.range(0.0, 2.0);
        fish.brain.working = StateWorking::Cruise(working);
    }

    fn update(&self, fish: &mut FishView, ctx: &mut StateCtx<'_>) -> Option<BehaviorState> {
        let StateWorking::Cruise(working) = fish.brain.working else {
            self.enter(fish, ctx);
            return None;
        };

        if fish.pos.0.distance(fish.brain.target()) < working.arrival_radius {
            let point = ctx.random_tank_point();
            fish.set_target(point);
        }
        fish.ease_speed(working.speed_factor, ctx.smoothing());

        fish.brain.state_timer += ctx.dt;
        let timer = fish.brain.state_timer;
        if timer >= working.max_time {
            return Some(BehaviorState::Idle);
        }
        if timer > fish.brain.next_state_time {
            let p = working.leave_chance * ctx.rng.range(0.7, 1.3);
            if ctx.rng.chance(p) {
                return Some(BehaviorState::Idle);
            }
        }
        None
    }
}
