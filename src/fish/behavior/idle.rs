use glam::Vec2;

use super::{StateCtx, StateHandler};
use crate::fish::components::{BehaviorState, IdleWorking, StateWorking};
use crate::fish::tuning::TuningKey;
use crate::fish::view::FishView;

/// Hover near where the fish stopped, bobbing gently.
pub struct IdleState;

/// Bob amplitude as a share of the idle amplitude.
const BOB_SCALE: f32 = 0.25;
/// The vertical bob runs slower than the horizontal one.
const BOB_Y_PHASE_RATE: f32 = 0.8;

impl IdleState {
    fn pick_anchor(working: &IdleWorking, ctx: &mut StateCtx<'_>) -> Vec2 {
        let amp = working.bob_amplitude;
        let dx = ctx.rng.range(-amp, amp);
        let dy = ctx.rng.range(-amp, amp);
        let tank = &ctx.config.tank;
        Vec2::new(
            (working.origin.x + dx).clamp(0.0, tank.width()),
            (working.origin.y + dy).clamp(0.0, tank.height()),
        )
    }
}

impl StateHandler for IdleState {
    fn enter(&self, fish: &mut FishView, ctx: &mut StateCtx<'_>) {
        let t = &fish.tuning;
        let mut working = IdleWorking {
            min_time: t.get(TuningKey::IdleMinTime),
            max_time: t.get(TuningKey::IdleMaxTime),
            speed_factor: t.get(TuningKey::IdleSpeedFactor),
            bob_amplitude: t.get(TuningKey::IdleBobAmplitude),
            bob_frequency: t.get(TuningKey::IdleBobFrequency),
            leave_chance: t.get(TuningKey::TransitionToCruiseChance),
            origin: fish.pos.0,
            anchor: fish.pos.0,
            retarget_timer: 0.0,
        };
        working.anchor = Self::pick_anchor(&working, ctx);
        fish.brain.state_timer = 0.0;
        fish.brain.next_state_time = working.min_time + ctx.rng.range(0.0, 3.0);
        fish.set_target(working.anchor);
        fish.brain.working = StateWorking::Idle(working);
    }

    fn update(&self, fish: &mut FishView, ctx: &mut StateCtx<'_>) -> Option<BehaviorState> {
        let StateWorking::Idle(mut working) = fish.brain.working else {
            self.enter(fish, ctx);
            return None;
        };
        let balancing = &ctx.config.balancing;
        let (fx, fy) = (balancing.idle_bob_x_factor, balancing.idle_bob_y_factor);
        let arrival = balancing.idle_arrival_threshold;
        let retarget_interval = balancing.idle_retarget_interval;

        fish.brain.state_timer += ctx.dt;
        working.retarget_timer += ctx.dt;
        if fish.pos.0.distance(working.anchor) < arrival
            || working.retarget_timer >= retarget_interval
        {
            working.anchor = Self::pick_anchor(&working, ctx);
            working.retarget_timer = 0.0;
        }

        let phase = fish.brain.state_timer * working.bob_frequency;
        let bob = working.bob_amplitude * BOB_SCALE;
        let offset = Vec2::new(
            phase.sin() * bob * fx,
            (phase * BOB_Y_PHASE_RATE).cos() * bob * fy,
        );
        fish.set_target(working.anchor + offset);
        fish.ease_speed(working.speed_factor, ctx.smoothing());
        fish.brain.working = StateWorking::Idle(working);

        let timer = fish.brain.state_timer;
        if timer >= working.max_time {
            return Some(BehaviorState::Cruise);
        }
        if timer > fish.brain.next_state_time {
            let p = working.leave_chance * ctx.rng.range(0.7, 1.3);
            if ctx.rng.chance(p) {
                return Some(BehaviorState::Cruise);
            }
        }
        None
    }
}
