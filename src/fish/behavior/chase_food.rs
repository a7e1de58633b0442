use tracing::debug;

use super::{is_hungry, StateCtx, StateHandler};
use crate::audio::AudioCue;
use crate::fish::components::{BehaviorState, ChaseFoodWorking, StateWorking};
use crate::fish::geometry;
use crate::fish::tuning::TuningKey;
use crate::fish::view::FishView;

/// Swim at the nearest pellet and eat it on contact.
pub struct ChaseFoodState;

impl ChaseFoodState {
    fn after_meal(fish: &FishView) -> BehaviorState {
        if is_hungry(fish) {
            BehaviorState::LookForFood
        } else {
            BehaviorState::Cruise
        }
    }
}

impl StateHandler for ChaseFoodState {
    fn enter(&self, fish: &mut FishView, _ctx: &mut StateCtx<'_>) {
        fish.brain.working = StateWorking::ChaseFood(ChaseFoodWorking {
            speed_factor: fish.tuning.get(TuningKey::ChaseFoodSpeedFactor),
            target_pellet: None,
        });
    }

    fn update(&self, fish: &mut FishView, ctx: &mut StateCtx<'_>) -> Option<BehaviorState> {
        let StateWorking::ChaseFood(mut working) = fish.brain.working else {
            self.enter(fish, ctx);
            return None;
        };

        // Re-resolved every tick so a closer pellet steals the chase.
        let Some(nearest) = geometry::nearest_pellet(ctx.world, fish.center(), None) else {
            working.target_pellet = None;
            fish.brain.working = StateWorking::ChaseFood(working);
            return Some(Self::after_meal(fish));
        };
        working.target_pellet = Some(nearest.id);
        let center = nearest.center;

        let mouth = geometry::mouth_point(fish.pos.0, &fish.sprite, None, Some(center.x));
        let mouth_radius =
            geometry::mouth_radius(&fish.sprite, fish.tuning.get(TuningKey::MouthRadiusFactor));
        let reach = nearest.radius + mouth_radius + fish.tuning.get(TuningKey::EatExtraMargin);

        fish.set_target(center);
        fish.ease_speed(working.speed_factor, ctx.smoothing());

        if mouth.distance(center) > reach {
            fish.brain.working = StateWorking::ChaseFood(working);
            return None;
        }

        ctx.audio.play(AudioCue::Bite);
        fish.hunger.feed(nearest.nutrition);
        ctx.world.destroy_entity(nearest.id);
        debug!(fish = %fish.id, pellet = %nearest.id, hunger = fish.hunger.hunger, "pellet eaten");
        working.target_pellet = None;
        fish.brain.working = StateWorking::ChaseFood(working);
        Some(Self::after_meal(fish))
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::fish::behavior::test_support::Harness;

    #[test]
    fn eats_pellet_in_reach() {
        let mut h = Harness::new();
        let mut fish = h.fish(
            BehaviorState::ChaseFood,
            Vec2::new(100.0, 100.0),
            &[("food_seek_threshold", 0.8)],
        );
        fish.hunger.hunger = 40.0;
        // Mouth sits at (151, 120); pellet center at (158, 120).
        let pellet = h.pellet(Vec2::new(150.0, 112.0), 20.0);
        ChaseFoodState.enter(&mut fish, &mut h.ctx(0.016));
        let next = ChaseFoodState.update(&mut fish, &mut h.ctx(0.016));

        assert_eq!(next, Some(BehaviorState::LookForFood));
        assert_eq!(fish.hunger.hunger, 60.0);
        assert!(!h.world.contains(pellet));
        assert_eq!(h.audio.count(AudioCue::Bite), 1);
    }

    #[test]
    fn sated_fish_goes_back_to_cruising() {
        let mut h = Harness::new();
        let mut fish = h.fish(BehaviorState::ChaseFood, Vec2::new(100.0, 100.0), &[]);
        fish.hunger.hunger = 95.0;
        h.pellet(Vec2::new(150.0, 112.0), 20.0);
        ChaseFoodState.enter(&mut fish, &mut h.ctx(0.016));
        let next = ChaseFoodState.update(&mut fish, &mut h.ctx(0.016));
        assert_eq!(next, Some(BehaviorState::Cruise));
        assert_eq!(fish.hunger.hunger, 100.0);
    }

    #[test]
    fn distant_pellet_is_chased_not_eaten() {
        let mut h = Harness::new();
        let mut fish = h.fish(BehaviorState::ChaseFood, Vec2::new(100.0, 100.0), &[]);
        let far = h.pellet(Vec2::new(700.0, 400.0), 20.0);
        let near = h.pellet(Vec2::new(400.0, 100.0), 20.0);
        ChaseFoodState.enter(&mut fish, &mut h.ctx(0.016));
        assert_eq!(ChaseFoodState.update(&mut fish, &mut h.ctx(0.016)), None);
        assert_eq!(fish.target.0, Vec2::new(408.0, 108.0));
        assert!(h.world.contains(far) && h.world.contains(near));

        // The chased pellet disappears; the next tick retargets.
        h.world.destroy_entity(near);
        assert_eq!(ChaseFoodState.update(&mut fish, &mut h.ctx(0.016)), None);
        assert_eq!(fish.target.0, Vec2::new(708.0, 408.0));
        assert!(h.audio.cues().is_empty());
    }

    #[test]
    fn empty_tank_sends_hungry_fish_looking() {
        let mut h = Harness::new();
        let mut fish = h.fish(BehaviorState::ChaseFood, Vec2::new(100.0, 100.0), &[]);
        fish.hunger.hunger = 10.0;
        ChaseFoodState.enter(&mut fish, &mut h.ctx(0.016));
        let next = ChaseFoodState.update(&mut fish, &mut h.ctx(0.016));
        assert_eq!(next, Some(BehaviorState::LookForFood));
    }
}
