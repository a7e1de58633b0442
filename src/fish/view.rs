use glam::Vec2;

use super::components::{
    BehaviorTuning, Brain, Hunger, MotionParams, Position, SpeedIntent, Sprite, SteeringIntent,
    TankRef, TargetIntent, Velocity,
};
use crate::world::{EntityId, World};

/// Component set a fish needs to take part in the behavior pipeline.
pub type BehaviorComponents = (
    Brain,
    Position,
    MotionParams,
    Velocity,
    Hunger,
    BehaviorTuning,
    Sprite,
    TankRef,
    TargetIntent,
    SteeringIntent,
    SpeedIntent,
);

/// Working copy of one fish's behavior-relevant components.
///
/// Loaded from the store, handed to a state handler, then written back. It
/// lives for one handler call and is never stored in the world.
#[derive(Debug, Clone)]
pub struct FishView {
    pub id: EntityId,
    pub brain: Brain,
    pub pos: Position,
    pub vel: Velocity,
    pub motion: MotionParams,
    pub hunger: Hunger,
    pub sprite: Sprite,
    pub tuning: BehaviorTuning,
    pub target: TargetIntent,
    pub steering: SteeringIntent,
    pub speed: SpeedIntent,
}

impl FishView {
    /// Copy the components out of the store, or `None` if any is missing.
    pub fn load(world: &World, id: EntityId) -> Option<Self> {
        world.get_component::<TankRef>(id)?;
        Some(Self {
            id,
            brain: world.get_component::<Brain>(id)?.clone(),
            pos: *world.get_component::<Position>(id)?,
            vel: *world.get_component::<Velocity>(id)?,
            motion: *world.get_component::<MotionParams>(id)?,
            hunger: *world.get_component::<Hunger>(id)?,
            sprite: world.get_component::<Sprite>(id)?.clone(),
            tuning: world.get_component::<BehaviorTuning>(id)?.clone(),
            target: *world.get_component::<TargetIntent>(id)?,
            steering: *world.get_component::<SteeringIntent>(id)?,
            speed: *world.get_component::<SpeedIntent>(id)?,
        })
    }

    /// Store the fields handlers may change. Sprite, tuning and velocity are
    /// read-only to the state machine.
    pub fn write_back(self, world: &mut World) {
        let id = self.id;
        if let Some(brain) = world.get_component_mut::<Brain>(id) {
            *brain = self.brain;
        }
        if let Some(pos) = world.get_component_mut::<Position>(id) {
            *pos = self.pos;
        }
        if let Some(motion) = world.get_component_mut::<MotionParams>(id) {
            *motion = self.motion;
        }
        if let Some(hunger) = world.get_component_mut::<Hunger>(id) {
            *hunger = self.hunger;
        }
        if let Some(target) = world.get_component_mut::<TargetIntent>(id) {
            *target = self.target;
        }
        if let Some(steering) = world.get_component_mut::<SteeringIntent>(id) {
            *steering = self.steering;
        }
        if let Some(speed) = world.get_component_mut::<SpeedIntent>(id) {
            *speed = self.speed;
        }
    }

    /// Point both the brain and the target intent at `point`.
    pub fn set_target(&mut self, point: Vec2) {
        self.brain.tx = point.x;
        self.brain.ty = point.y;
        self.target.0 = point;
    }

    /// Ease the desired speed toward `max_speed * factor` and publish it.
    pub fn ease_speed(&mut self, factor: f32, smoothing: f32) {
        let target_speed = self.motion.max_speed * factor;
        self.brain.current_desired_speed +=
            (target_speed - self.brain.current_desired_speed) * smoothing;
        self.speed.desired_speed = self.brain.current_desired_speed;
    }

    pub fn center(&self) -> Vec2 {
        self.sprite.center(self.pos.0)
    }
}
