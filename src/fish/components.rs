use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use glam::Vec2;

use super::tuning::TuningKey;
use crate::world::EntityId;

/// Top-left corner of the sprite in logical tank coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub Vec2);

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    pub fn x(&self) -> f32 {
        self.0.x
    }

    pub fn y(&self) -> f32 {
        self.0.y
    }

    pub fn as_vec2(&self) -> Vec2 {
        self.0
    }
}

/// Velocity in logical units per second
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity(pub Vec2);

impl Velocity {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self(Vec2::new(dx, dy))
    }

    pub fn zero() -> Self {
        Self(Vec2::ZERO)
    }
}

/// Geometry and visual metadata read by the renderer.
///
/// `mouth_fx`/`mouth_fy` locate the mouth as fractions of the base size for a
/// right-facing sprite; the x fraction is mirrored when the fish faces left.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub image_id: String,
    pub base_w: f32,
    pub base_h: f32,
    pub z: i32,
    pub faces_right: bool,
    pub mouth_fx: f32,
    pub mouth_fy: f32,
}

impl Sprite {
    pub fn new(image_id: impl Into<String>, base_w: f32, base_h: f32) -> Self {
        Self {
            image_id: image_id.into(),
            base_w,
            base_h,
            z: 1,
            faces_right: true,
            mouth_fx: 0.85,
            mouth_fy: 0.5,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.base_w, self.base_h)
    }

    /// Center of the sprite when its top-left corner sits at `pos`.
    pub fn center(&self, pos: Vec2) -> Vec2 {
        pos + self.size() * 0.5
    }
}

/// Movement limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    pub max_speed: f32,
    pub acceleration: f32,
    /// Radians per second
    pub turn_speed: f32,
    pub dart_multiplier: f32,
    /// Unscaled max speed, captured the first time the fish is aged.
    pub base_max_speed: Option<f32>,
}

impl MotionParams {
    pub fn new(max_speed: f32, acceleration: f32, turn_speed: f32, dart_multiplier: f32) -> Self {
        Self {
            max_speed,
            acceleration,
            turn_speed,
            dart_multiplier,
            base_max_speed: None,
        }
    }
}

impl Default for MotionParams {
    fn default() -> Self {
        Self::new(40.0, 30.0, 3.0, 2.5)
    }
}

/// Behavior states a fish can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BehaviorState {
    Idle,
    Cruise,
    LookForFood,
    ChaseFood,
    Egg,
    Dead,
}

impl BehaviorState {
    pub const ALL: [BehaviorState; 6] = [
        BehaviorState::Idle,
        BehaviorState::Cruise,
        BehaviorState::LookForFood,
        BehaviorState::ChaseFood,
        BehaviorState::Egg,
        BehaviorState::Dead,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BehaviorState::Idle => "Idle",
            BehaviorState::Cruise => "Cruise",
            BehaviorState::LookForFood => "LookForFood",
            BehaviorState::ChaseFood => "ChaseFood",
            BehaviorState::Egg => "Egg",
            BehaviorState::Dead => "Dead",
        }
    }

    /// States the hunger bias leaves alone.
    pub fn is_food_related(self) -> bool {
        matches!(self, BehaviorState::LookForFood | BehaviorState::ChaseFood)
    }
}

impl fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Idle: bob around an anchor near where the state was entered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdleWorking {
    pub min_time: f32,
    pub max_time: f32,
    pub speed_factor: f32,
    pub bob_amplitude: f32,
    pub bob_frequency: f32,
    pub leave_chance: f32,
    pub origin: Vec2,
    pub anchor: Vec2,
    pub retarget_timer: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CruiseWorking {
    pub min_time: f32,
    pub max_time: f32,
    pub arrival_radius: f32,
    pub speed_factor: f32,
    pub leave_chance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookForFoodWorking {
    pub speed_factor: f32,
    pub retarget_interval: f32,
    pub retarget_timer: f32,
    pub spotted_pellet: Option<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaseFoodWorking {
    pub speed_factor: f32,
    pub target_pellet: Option<EntityId>,
}

/// Working data of the state currently occupied, set by that state's `enter`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StateWorking {
    #[default]
    None,
    Idle(IdleWorking),
    Cruise(CruiseWorking),
    LookForFood(LookForFoodWorking),
    ChaseFood(ChaseFoodWorking),
}

/// Per-fish state machine record
#[derive(Debug, Clone, PartialEq)]
pub struct Brain {
    pub state: BehaviorState,
    pub state_timer: f32,
    /// Earliest time the current state may voluntarily leave.
    pub next_state_time: f32,
    pub tx: f32,
    pub ty: f32,
    pub current_desired_speed: f32,
    pub working: StateWorking,
}

impl Brain {
    pub fn new(state: BehaviorState) -> Self {
        Self {
            state,
            state_timer: 0.0,
            next_state_time: 0.0,
            tx: 0.0,
            ty: 0.0,
            current_desired_speed: 0.0,
            working: StateWorking::None,
        }
    }

    pub fn target(&self) -> Vec2 {
        Vec2::new(self.tx, self.ty)
    }
}

impl Default for Brain {
    fn default() -> Self {
        Self::new(BehaviorState::Cruise)
    }
}

/// Per-fish tunable numbers, keyed by wire name.
///
/// The table is fixed after creation, so clones share one allocation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BehaviorTuning {
    params: Arc<HashMap<String, f32>>,
}

impl BehaviorTuning {
    pub fn new(params: HashMap<String, f32>) -> Self {
        Self {
            params: Arc::new(params),
        }
    }

    /// Value for `key`, or its documented default when the table lacks it.
    pub fn get(&self, key: TuningKey) -> f32 {
        self.params
            .get(key.name())
            .copied()
            .unwrap_or_else(|| key.default_value())
    }
}

impl<S: Into<String>> FromIterator<(S, f32)> for BehaviorTuning {
    fn from_iter<I: IntoIterator<Item = (S, f32)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Where the fish wants to go this tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargetIntent(pub Vec2);

/// Additive steering offset, consumed and reset by movement
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SteeringIntent(pub Vec2);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpeedIntent {
    pub desired_speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifeStage {
    Egg,
    Juvenile,
    Adult,
    Senior,
    Dead,
}

impl LifeStage {
    pub fn name(self) -> &'static str {
        match self {
            LifeStage::Egg => "Egg",
            LifeStage::Juvenile => "Juvenile",
            LifeStage::Adult => "Adult",
            LifeStage::Senior => "Senior",
            LifeStage::Dead => "Dead",
        }
    }
}

impl fmt::Display for LifeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifespan clock. `age` only runs after hatching; eggs count `pre_hatch`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Age {
    pub age: f32,
    pub lifespan: f32,
    pub stage: LifeStage,
    pub pre_hatch: f32,
}

impl Age {
    pub fn new(lifespan: f32) -> Self {
        Self {
            age: 0.0,
            lifespan,
            stage: LifeStage::Juvenile,
            pre_hatch: 0.0,
        }
    }

    pub fn egg(lifespan: f32) -> Self {
        Self {
            stage: LifeStage::Egg,
            ..Self::new(lifespan)
        }
    }

    pub fn ratio(&self) -> f32 {
        if self.lifespan > 0.0 {
            self.age / self.lifespan
        } else {
            1.0
        }
    }
}

/// Fullness: `max` is sated, 0 is starving
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hunger {
    pub hunger: f32,
    pub rate: f32,
    pub max: f32,
}

impl Hunger {
    pub fn full(max: f32, rate: f32) -> Self {
        Self {
            hunger: max,
            rate,
            max,
        }
    }

    pub fn ratio(&self) -> f32 {
        self.hunger / self.max.max(1e-6)
    }

    /// Add (or remove) fullness, keeping it inside `[0, max]`.
    pub fn feed(&mut self, amount: f32) {
        self.hunger = (self.hunger + amount).clamp(0.0, self.max.max(0.0));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub value: f32,
    pub max: f32,
}

impl Health {
    pub fn full(max: f32) -> Self {
        Self { value: max, max }
    }

    pub fn adjust(&mut self, delta: f32) {
        self.value = (self.value + delta).clamp(0.0, self.max.max(0.0));
    }
}

/// Marks a fish that has died. Never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeadFlag;

/// Falls at `speed` until resting on the sand line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffectedByGravity {
    pub speed: f32,
}

/// A piece of food floating in the tank
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodPellet {
    pub nutrition: f32,
    /// Multiplies the sprite's base radius for eating checks
    pub radius_scale: f32,
    /// Art-centering offset for the renderer
    pub center_off: Vec2,
}

/// Courtship bookkeeping. Carried for the renderer, not driven by the core.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Breeding {
    pub wants_breed: bool,
    pub partner: Option<EntityId>,
    pub time_near: f32,
    pub cooldown: f32,
    pub toggle_on: bool,
}

/// Back-reference to the tank an entity lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TankRef(pub EntityId);

/// Marks the tank entity itself
#[derive(Debug, Clone, PartialEq)]
pub struct Tank {
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub species_id: String,
    pub display_name: String,
    pub base_speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub radius: f32,
}
