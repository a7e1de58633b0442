//! Hunger, health and aging. These systems never touch behavior state; they
//! only set [`DeadFlag`] or change the life stage for the override stage to read.

use tracing::info;

use super::components::{
    AffectedByGravity, Age, BehaviorTuning, DeadFlag, Health, Hunger, LifeStage, MotionParams,
};
use super::tuning::TuningKey;
use crate::config::{AgingConfig, SimConfig};
use crate::world::{EntityId, World};

/// Flag a fish as dead and reflect it in its life stage. Safe to repeat.
///
/// Returns true only the first time.
pub fn mark_dead(world: &mut World, id: EntityId) -> bool {
    let newly_dead = !world.has_component::<DeadFlag>(id);
    if newly_dead {
        world.add_component(id, DeadFlag);
    }
    if let Some(age) = world.get_component_mut::<Age>(id) {
        age.stage = LifeStage::Dead;
    }
    newly_dead
}

/// Linear hunger decay, clamped to `[0, max]`.
pub fn update_hunger(world: &mut World, dt: f32) {
    let fish: Vec<EntityId> = world.query::<(Hunger, Health)>().collect();
    for id in fish {
        if world.has_component::<DeadFlag>(id) {
            continue;
        }
        if let Some(hunger) = world.get_component_mut::<Hunger>(id) {
            let drain = hunger.rate * dt;
            hunger.feed(-drain);
        }
    }
}

/// Regeneration while well fed, damage while starving, death at zero.
pub fn update_health(world: &mut World, dt: f32) {
    let fish: Vec<EntityId> = world.query::<(Health, Hunger, BehaviorTuning)>().collect();
    for id in fish {
        if world.has_component::<DeadFlag>(id) {
            continue;
        }
        let (Some(hunger), Some(tuning)) = (
            world.get_component::<Hunger>(id).copied(),
            world.get_component::<BehaviorTuning>(id),
        ) else {
            continue;
        };
        let regen = tuning.get(TuningKey::HealthRegenFactor);
        let starve = tuning.get(TuningKey::HealthStarveFactor);
        let regen_threshold = tuning.get(TuningKey::HealthRegenThreshold);

        let Some(health) = world.get_component_mut::<Health>(id) else {
            continue;
        };
        if hunger.ratio() > regen_threshold {
            health.adjust(health.max * regen * dt);
        }
        if hunger.hunger <= 0.0 {
            health.adjust(-health.max * starve * dt);
        }
        if health.value <= 0.0 && mark_dead(world, id) {
            info!(fish = %id, "fish starved");
        }
    }
}

/// Speed multiplier for a post-hatch age ratio: ramps up through youth,
/// flat through adulthood, ramps down through old age.
pub fn speed_multiplier(aging: &AgingConfig, ratio: f32) -> f32 {
    let r_juv = aging.juvenile_threshold_ratio;
    let r_elder = aging.elder_threshold_ratio;
    if ratio <= r_juv {
        if r_juv <= 1e-6 {
            return 1.0;
        }
        let t = (ratio / r_juv).clamp(0.0, 1.0);
        let min = aging.juvenile_speed_multiplier_min;
        return min + (1.0 - min) * t;
    }
    if ratio >= r_elder {
        let t = elder_progress(aging, ratio);
        return 1.0 + (aging.elder_speed_multiplier_min - 1.0) * t;
    }
    1.0
}

/// How far past the elder threshold, 0 at the threshold and 1 at lifespan.
fn elder_progress(aging: &AgingConfig, ratio: f32) -> f32 {
    let span = (1.0 - aging.elder_threshold_ratio).max(1e-6);
    ((ratio - aging.elder_threshold_ratio) / span).clamp(0.0, 1.0)
}

pub fn stage_for_ratio(aging: &AgingConfig, ratio: f32) -> LifeStage {
    if ratio < aging.juvenile_threshold_ratio {
        LifeStage::Juvenile
    } else if ratio >= aging.elder_threshold_ratio {
        LifeStage::Senior
    } else {
        LifeStage::Adult
    }
}

/// Egg incubation, stage labels, age-based speed scaling, elder decline and
/// optional death at lifespan.
pub fn update_aging(world: &mut World, config: &SimConfig, dt: f32) {
    if dt <= 0.0 {
        return;
    }
    let aging = &config.aging;
    let agents: Vec<EntityId> = world.query::<(Age,)>().collect();
    for id in agents {
        if world.has_component::<DeadFlag>(id) {
            continue;
        }
        let Some(mut age) = world.get_component::<Age>(id).copied() else {
            continue;
        };

        if age.stage == LifeStage::Egg {
            incubate(world, config, id, &mut age, dt);
            world.add_component(id, age);
            continue;
        }

        age.age += dt;
        let ratio = age.ratio().max(0.0);
        age.stage = stage_for_ratio(aging, ratio);

        if let Some(motion) = world.get_component_mut::<MotionParams>(id) {
            let base = *motion.base_max_speed.get_or_insert(motion.max_speed);
            motion.max_speed = base * speed_multiplier(aging, ratio);
        }

        if ratio >= aging.elder_threshold_ratio && aging.elder_health_decay_at_max_per_sec > 0.0 {
            if let Some(health) = world.get_component_mut::<Health>(id) {
                let rate =
                    health.max * aging.elder_health_decay_at_max_per_sec * elder_progress(aging, ratio);
                health.value = (health.value - rate * dt).max(0.0);
            }
        }

        world.add_component(id, age);
        if aging.hard_death_at_lifespan && age.age >= age.lifespan && mark_dead(world, id) {
            info!(fish = %id, age = age.age, "fish died of old age");
        }
    }
}

fn incubate(world: &mut World, config: &SimConfig, id: EntityId, age: &mut Age, dt: f32) {
    age.pre_hatch += dt;
    if !world.has_component::<AffectedByGravity>(id) {
        let speed = config.balancing.egg_fall_speed;
        world.add_component(id, AffectedByGravity { speed });
    }
    if age.pre_hatch >= config.aging.hatch_seconds(age.lifespan) {
        age.stage = LifeStage::Juvenile;
        age.age = 0.0;
        world.remove_component::<AffectedByGravity>(id);
        info!(fish = %id, after = age.pre_hatch, "egg hatched");
    }
}
