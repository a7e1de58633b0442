//! Steering and physics: intents in, bounded motion out.
//!
//! Avoidance adds to the steering intent, movement integrates it, collision
//! clamps to the tank, gravity drops pellets, eggs and corpses onto the sand.

use std::f32::consts::{PI, TAU};

use glam::Vec2;

use super::components::{
    AffectedByGravity, BehaviorTuning, DeadFlag, MotionParams, Position, SpeedIntent, Sprite,
    SteeringIntent, TankRef, TargetIntent, Velocity,
};
use super::tuning::TuningKey;
use crate::config::SimConfig;
use crate::rng::SimRng;
use crate::world::{EntityId, World};

/// Below this speed a fish has no meaningful heading to correct.
const MIN_AVOID_SPEED: f32 = 1e-3;

/// Wall repulsion for the part of a fish's heading that points into a wall.
///
/// The bottom band sits above the swim floor, not the tank bottom.
pub fn avoidance_steering(config: &SimConfig, pos: Vec2, vel: Vec2) -> Vec2 {
    let speed = vel.length();
    if speed < MIN_AVOID_SPEED {
        return Vec2::ZERO;
    }
    let heading = vel / speed;
    let b = &config.balancing;
    let m = b.avoidance_margin;
    let w = config.tank.width();
    let floor = config.tank.swim_floor_y();

    let mut push = Vec2::ZERO;
    if pos.x < m {
        push.x += (1.0 - pos.x / m) * (-heading.x).max(0.0);
    }
    if pos.x > w - m {
        push.x -= (1.0 - (w - pos.x) / m) * heading.x.max(0.0);
    }
    if pos.y < m {
        push.y += (1.0 - pos.y / m) * (-heading.y).max(0.0);
    }
    if pos.y > floor - m {
        push.y -= (1.0 - (floor - pos.y) / m) * heading.y.max(0.0);
    }

    // Slow drifters get a gentler nudge.
    push *= (speed / b.typical_max_speed).min(1.0);
    push.clamp_length_max(b.avoidance_max_strength)
}

pub fn update_avoidance(world: &mut World, config: &SimConfig) {
    let agents: Vec<EntityId> = world
        .query::<(Position, SteeringIntent, TankRef, Velocity)>()
        .collect();
    for id in agents {
        if world.has_component::<DeadFlag>(id) {
            continue;
        }
        let (Some(pos), Some(vel)) = (
            world.get_component::<Position>(id),
            world.get_component::<Velocity>(id),
        ) else {
            continue;
        };
        let push = avoidance_steering(config, pos.0, vel.0);
        if let Some(steering) = world.get_component_mut::<SteeringIntent>(id) {
            steering.0 += push;
        }
    }
}

/// Wrap an angle difference into `[-PI, PI]`.
fn wrap_angle(delta: f32) -> f32 {
    (delta + PI).rem_euclid(TAU) - PI
}

/// Inputs to one movement step for one fish.
#[derive(Debug, Clone, Copy)]
pub struct MoveInput {
    pub pos: Vec2,
    pub vel: Vec2,
    pub target: Vec2,
    pub steering: Vec2,
    pub desired_speed: f32,
    pub noise: Vec2,
}

/// One integration step: returns the new (position, velocity).
///
/// Heading turns toward the desired direction by at most `turn_speed * dt`,
/// and the velocity changes by at most `acceleration * dt` before damping.
pub fn integrate(input: MoveInput, motion: &MotionParams, damping: f32, dt: f32) -> (Vec2, Vec2) {
    let to_target = input.target - input.pos;
    let dist = to_target.length().max(1e-6);
    let mut dir = to_target / dist + input.steering + input.noise;
    let len = dir.length();
    if len > 1e-5 {
        dir /= len;
    }

    let desired_speed = input.desired_speed.min(motion.max_speed).max(0.0);
    let vel = input.vel;
    let heading = if vel.length() < 1e-6 {
        dir
    } else {
        let current = vel.y.atan2(vel.x);
        let desired = if desired_speed > 1e-6 {
            dir.y.atan2(dir.x)
        } else {
            current
        };
        let max_turn = motion.turn_speed.max(0.0) * dt;
        let turned = current + wrap_angle(desired - current).clamp(-max_turn, max_turn);
        Vec2::from_angle(turned)
    };

    let dv = (heading * desired_speed - vel).clamp_length_max(motion.acceleration.max(0.0) * dt);
    let new_vel = (vel + dv) * damping;
    (input.pos + new_vel * dt, new_vel)
}

pub fn update_movement(world: &mut World, config: &SimConfig, rng: &mut SimRng, dt: f32) {
    let damping = config.balancing.movement_damping;
    let agents: Vec<EntityId> = world
        .query::<(
            Position,
            Velocity,
            MotionParams,
            TargetIntent,
            SteeringIntent,
            SpeedIntent,
            TankRef,
            Sprite,
        )>()
        .collect();
    for id in agents {
        if world.has_component::<DeadFlag>(id) {
            continue;
        }
        let (Some(pos), Some(vel), Some(motion), Some(target), Some(steering), Some(speed)) = (
            world.get_component::<Position>(id).copied(),
            world.get_component::<Velocity>(id).copied(),
            world.get_component::<MotionParams>(id).copied(),
            world.get_component::<TargetIntent>(id).copied(),
            world.get_component::<SteeringIntent>(id).copied(),
            world.get_component::<SpeedIntent>(id).copied(),
        ) else {
            continue;
        };
        let noise_amp = world
            .get_component::<BehaviorTuning>(id)
            .map_or(0.0, |t| t.get(TuningKey::Noise));
        let noise = if noise_amp > 0.0 {
            Vec2::new(
                rng.range(-noise_amp, noise_amp),
                rng.range(-noise_amp, noise_amp),
            )
        } else {
            Vec2::ZERO
        };

        let input = MoveInput {
            pos: pos.0,
            vel: vel.0,
            target: target.0,
            steering: steering.0,
            desired_speed: speed.desired_speed,
            noise,
        };
        let (new_pos, new_vel) = integrate(input, &motion, damping, dt);

        world.add_component(id, Position(new_pos));
        world.add_component(id, Velocity(new_vel));
        world.add_component(id, SteeringIntent(Vec2::ZERO));
    }
}

/// Keep everything inside the tank. Living swimmers stop at the swim floor and
/// bounce off walls; corpses and falling objects may use the full height.
pub fn update_collision(world: &mut World, config: &SimConfig) {
    let w = config.tank.width();
    let h = config.tank.height();
    let floor = config.tank.swim_floor_y();
    let bounce = config.balancing.wall_bounce;

    let bodies: Vec<EntityId> = world.query::<(Position, Velocity, Sprite, TankRef)>().collect();
    for id in bodies {
        let Some(size) = world.get_component::<Sprite>(id).map(Sprite::size) else {
            continue;
        };
        let passive =
            world.has_component::<DeadFlag>(id) || world.has_component::<AffectedByGravity>(id);
        let (Some(pos), Some(vel)) = (
            world.get_component::<Position>(id).copied(),
            world.get_component::<Velocity>(id).copied(),
        ) else {
            continue;
        };
        let (mut p, mut v) = (pos.0, vel.0);

        if passive {
            if p.x < 0.0 {
                p.x = 0.0;
            }
            if p.x + size.x > w {
                p.x = w - size.x;
            }
            if p.y < 0.0 {
                p.y = 0.0;
            }
            if p.y + size.y > h {
                p.y = h - size.y;
            }
        } else {
            if p.x < 0.0 {
                p.x = 0.0;
                if v.x < 0.0 {
                    v.x = -v.x * bounce;
                }
            }
            if p.x + size.x > w {
                p.x = w - size.x;
                if v.x > 0.0 {
                    v.x = -v.x * bounce;
                }
            }
            if p.y < 0.0 {
                p.y = 0.0;
                if v.y < 0.0 {
                    v.y = -v.y * bounce;
                }
            }
            let bottom = (floor - size.y).max(0.0);
            if p.y > bottom {
                p.y = bottom;
                if v.y > 0.0 {
                    v.y = -v.y * bounce;
                }
            }
        }

        if p != pos.0 {
            world.add_component(id, Position(p));
        }
        if v != vel.0 {
            world.add_component(id, Velocity(v));
        }
    }
}

/// Constant-speed fall until the bottom edge rests on the sand line.
pub fn update_gravity(world: &mut World, config: &SimConfig, dt: f32) {
    if dt <= 0.0 {
        return;
    }
    let sand = config.tank.sand_line_y();
    let falling: Vec<EntityId> = world
        .query::<(AffectedByGravity, Position, Sprite, TankRef)>()
        .collect();
    for id in falling {
        let (Some(gravity), Some(base_h)) = (
            world.get_component::<AffectedByGravity>(id).copied(),
            world.get_component::<Sprite>(id).map(|s| s.base_h),
        ) else {
            continue;
        };
        if let Some(pos) = world.get_component_mut::<Position>(id) {
            pos.0.y = (pos.0.y + gravity.speed * dt).min(sand - base_h);
        }
    }
}
