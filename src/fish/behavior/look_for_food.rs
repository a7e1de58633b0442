use super::{StateCtx, StateHandler};
use crate::fish::components::{BehaviorState, LookForFoodWorking, StateWorking};
use crate::fish::geometry;
use crate::fish::tuning::TuningKey;
use crate::fish::view::FishView;

/// Wander the tank until a pellet comes into view.
pub struct LookForFoodState;

impl StateHandler for LookForFoodState {
    fn enter(&self, fish: &mut FishView, ctx: &mut StateCtx<'_>) {
        fish.brain.state_timer = 0.0;
        fish.brain.working = StateWorking::LookForFood(LookForFoodWorking {
            speed_factor: fish.tuning.get(TuningKey::LookForFoodSpeedFactor),
            retarget_interval: ctx.config.balancing.look_for_food_retarget_interval,
            retarget_timer: 0.0,
            spotted_pellet: None,
        });
        let point = ctx.random_tank_point();
        fish.set_target(point);
    }

    fn update(&self, fish: &mut FishView, ctx: &mut StateCtx<'_>) -> Option<BehaviorState> {
        let StateWorking::LookForFood(mut working) = fish.brain.working else {
            self.enter(fish, ctx);
            return None;
        };

        let vision = fish.tuning.get(TuningKey::FoodDetectRadius);
        if let Some(seen) = geometry::nearest_pellet(ctx.world, fish.center(), Some(vision)) {
            working.spotted_pellet = Some(seen.id);
            fish.brain.working = StateWorking::LookForFood(working);
            fish.set_target(seen.center);
            return Some(BehaviorState::ChaseFood);
        }

        working.retarget_timer += ctx.dt;
        if working.retarget_timer >= working.retarget_interval {
            working.retarget_timer = 0.0;
            let point = ctx.random_tank_point();
            fish.set_target(point);
        }
        fish.ease_speed(working.speed_factor, ctx.smoothing());
        fish.brain.working = StateWorking::LookForFood(working);
        None
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::fish::behavior::test_support::Harness;

    #[test]
    fn visible_pellet_triggers_chase() {
        let mut h = Harness::new();
        let mut fish = h.fish(BehaviorState::LookForFood, Vec2::new(100.0, 100.0), &[]);
        let pellet = h.pellet(Vec2::new(250.0, 112.0), 10.0);
        LookForFoodState.enter(&mut fish, &mut h.ctx(0.016));
        let next = LookForFoodState.update(&mut fish, &mut h.ctx(0.016));
        assert_eq!(next, Some(BehaviorState::ChaseFood));
        assert_eq!(fish.target.0, Vec2::new(258.0, 120.0));
        assert!(matches!(
            fish.brain.working,
            StateWorking::LookForFood(LookForFoodWorking { spotted_pellet: Some(id), .. }) if id == pellet
        ));
    }

    #[test]
    fn out_of_range_pellet_is_ignored_and_wander_retargets() {
        let mut h = Harness::new();
        let mut fish = h.fish(
            BehaviorState::LookForFood,
            Vec2::new(0.0, 0.0),
            &[("food_detect_radius", 50.0)],
        );
        h.pellet(Vec2::new(900.0, 500.0), 10.0);
        LookForFoodState.enter(&mut fish, &mut h.ctx(0.5));
        let first = fish.brain.target();
        assert_eq!(LookForFoodState.update(&mut fish, &mut h.ctx(0.5)), None);
        assert_eq!(fish.brain.target(), first);
        assert_eq!(LookForFoodState.update(&mut fish, &mut h.ctx(0.5)), None);
        assert_ne!(fish.brain.target(), first);
    }
}
