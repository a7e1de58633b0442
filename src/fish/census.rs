use std::collections::BTreeMap;

use tracing::info;

use super::components::{Age, BehaviorState, Brain, DeadFlag, FoodPellet, Health, Hunger, LifeStage};
use crate::world::World;

/// Snapshot of the tank population
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TankCensus {
    /// Fish with a brain and no death flag
    pub living: u32,
    pub dead: u32,
    pub by_state: BTreeMap<BehaviorState, u32>,
    pub by_stage: BTreeMap<LifeStage, u32>,
    pub pellets: u32,
    /// Mean hunger ratio over living fish
    pub avg_hunger: f32,
    /// Mean health ratio over living fish
    pub avg_health: f32,
}

impl TankCensus {
    pub fn collect(world: &World) -> Self {
        let mut census = Self::default();
        let mut hunger_sum = 0.0;
        let mut health_sum = 0.0;

        for id in world.query::<(Brain,)>() {
            let Some(brain) = world.get_component::<Brain>(id) else {
                continue;
            };
            *census.by_state.entry(brain.state).or_insert(0) += 1;
            if let Some(age) = world.get_component::<Age>(id) {
                *census.by_stage.entry(age.stage).or_insert(0) += 1;
            }
            if world.has_component::<DeadFlag>(id) {
                census.dead += 1;
                continue;
            }
            census.living += 1;
            if let Some(hunger) = world.get_component::<Hunger>(id) {
                hunger_sum += hunger.ratio();
            }
            if let Some(health) = world.get_component::<Health>(id) {
                health_sum += health.value / health.max.max(1e-6);
            }
        }
        census.pellets = world.count_with::<FoodPellet>() as u32;
        if census.living > 0 {
            census.avg_hunger = hunger_sum / census.living as f32;
            census.avg_health = health_sum / census.living as f32;
        }
        census
    }

    pub fn in_state(&self, state: BehaviorState) -> u32 {
        self.by_state.get(&state).copied().unwrap_or(0)
    }

    pub fn at_stage(&self, stage: LifeStage) -> u32 {
        self.by_stage.get(&stage).copied().unwrap_or(0)
    }

    pub fn log(&self, tick: u64) {
        info!(
            "[TANK] Tick {} | Living: {} | Dead: {} | Eggs: {} | Seeking food: {} | Pellets: {} | Hunger: {:.2} | Health: {:.2}",
            tick,
            self.living,
            self.dead,
            self.at_stage(LifeStage::Egg),
            self.in_state(BehaviorState::LookForFood) + self.in_state(BehaviorState::ChaseFood),
            self.pellets,
            self.avg_hunger,
            self.avg_health
        );
    }
}
