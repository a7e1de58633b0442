//! Behavior arbitration: handlers propose, global rules override, then the
//! surviving proposals are committed.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info};

use super::behavior::{handler, StateCtx};
use super::components::{Age, BehaviorState, BehaviorTuning, Brain, DeadFlag, Hunger, LifeStage};
use super::tuning::TuningKey;
use super::view::{BehaviorComponents, FishView};
use crate::audio::AudioCue;
use crate::world::{EntityId, World};

/// Next state per fish; `None` means "no change". Ordered by creation.
pub type Proposals = BTreeMap<EntityId, Option<BehaviorState>>;

/// Tracks which (fish, state) occupancies have already run `enter`.
#[derive(Debug, Default)]
pub struct BehaviorPipeline {
    entered: HashSet<(EntityId, BehaviorState)>,
}

impl BehaviorPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_entered(&self, id: EntityId, state: BehaviorState) -> bool {
        self.entered.contains(&(id, state))
    }

    /// Run every fish's current state handler and collect its proposal.
    ///
    /// A state's `enter` runs first if this occupancy has not seen it yet.
    pub fn propose(&mut self, ctx: &mut StateCtx<'_>) -> Proposals {
        let world = &*ctx.world;
        self.entered.retain(|(id, _)| world.contains(*id));

        let fish: Vec<EntityId> = ctx.world.query::<BehaviorComponents>().collect();
        let mut proposals = Proposals::new();
        for id in fish {
            let Some(mut view) = FishView::load(ctx.world, id) else {
                continue;
            };
            let state = view.brain.state;
            let state_handler = handler(state);
            if self.entered.insert((id, state)) {
                state_handler.enter(&mut view, ctx);
            }
            let next = state_handler.update(&mut view, ctx);
            view.write_back(ctx.world);
            proposals.insert(id, next);
        }
        proposals
    }

    /// Switch every fish whose final proposal names a different state.
    ///
    /// Returns how many fish changed state.
    pub fn commit(&mut self, ctx: &mut StateCtx<'_>, proposals: &Proposals) -> usize {
        let mut changed = 0;
        for (&id, &next) in proposals {
            let Some(next) = next else {
                continue;
            };
            let Some(mut view) = FishView::load(ctx.world, id) else {
                continue;
            };
            let current = view.brain.state;
            if next == current {
                continue;
            }

            if self.entered.remove(&(id, current)) {
                handler(current).exit(&mut view, ctx);
            }
            if next == BehaviorState::Dead {
                ctx.audio.play(AudioCue::Death);
                info!(fish = %id, from = %current, "fish died");
            }

            view.brain.state = next;
            view.brain.state_timer = 0.0;
            handler(next).enter(&mut view, ctx);
            self.entered.insert((id, next));
            view.write_back(ctx.world);

            debug!(fish = %id, from = %current, to = %next, "state transition");
            changed += 1;
        }
        changed
    }
}

/// Apply the global rules over the handlers' proposals.
///
/// Priority is death, then egg lock (and the one-time hatch into Idle), then
/// the hunger bias toward looking for food.
pub fn apply_overrides(world: &World, proposals: &mut Proposals) {
    for (&id, proposal) in proposals.iter_mut() {
        let Some(brain) = world.get_component::<Brain>(id) else {
            continue;
        };
        let current = brain.state;

        if world.has_component::<DeadFlag>(id) {
            *proposal = (current != BehaviorState::Dead).then_some(BehaviorState::Dead);
            continue;
        }

        if let Some(age) = world.get_component::<Age>(id) {
            if age.stage == LifeStage::Egg {
                *proposal = (current != BehaviorState::Egg).then_some(BehaviorState::Egg);
                continue;
            }
            if current == BehaviorState::Egg {
                *proposal = Some(BehaviorState::Idle);
                continue;
            }
        }

        if current == BehaviorState::Dead {
            continue;
        }
        let (Some(hunger), Some(tuning)) = (
            world.get_component::<Hunger>(id),
            world.get_component::<BehaviorTuning>(id),
        ) else {
            continue;
        };
        let hungry = hunger.ratio() < tuning.get(TuningKey::FoodSeekThreshold);
        let seeking = current.is_food_related() || proposal.map_or(false, |p| p.is_food_related());
        if hungry && !seeking {
            *proposal = Some(BehaviorState::LookForFood);
        }
    }
}
