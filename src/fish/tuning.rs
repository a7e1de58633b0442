use crate::rng::SimRng;

/// Per-fish behavior knobs read by the state handlers and life-cycle systems.
///
/// Each key has a wire name (the string used in config tables) and a
/// documented default that applies whenever a fish's table lacks the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TuningKey {
    // Hunger-driven behavior
    FoodSeekThreshold,
    FoodDetectRadius,
    LookForFoodSpeedFactor,
    ChaseFoodSpeedFactor,
    MouthRadiusFactor,
    EatExtraMargin,

    // Cruise
    CruiseMinTime,
    CruiseMaxTime,
    CruiseArrivalRadius,
    CruiseSpeedFactor,
    TransitionToIdleChance,

    // Idle
    IdleMinTime,
    IdleMaxTime,
    IdleSpeedFactor,
    IdleBobAmplitude,
    IdleBobFrequency,
    TransitionToCruiseChance,

    // Movement
    Noise,

    // Health
    HealthRegenFactor,
    HealthStarveFactor,
    HealthRegenThreshold,
}

impl TuningKey {
    pub const ALL: [TuningKey; 21] = [
        TuningKey::FoodSeekThreshold,
        TuningKey::FoodDetectRadius,
        TuningKey::LookForFoodSpeedFactor,
        TuningKey::ChaseFoodSpeedFactor,
        TuningKey::MouthRadiusFactor,
        TuningKey::EatExtraMargin,
        TuningKey::CruiseMinTime,
        TuningKey::CruiseMaxTime,
        TuningKey::CruiseArrivalRadius,
        TuningKey::CruiseSpeedFactor,
        TuningKey::TransitionToIdleChance,
        TuningKey::IdleMinTime,
        TuningKey::IdleMaxTime,
        TuningKey::IdleSpeedFactor,
        TuningKey::IdleBobAmplitude,
        TuningKey::IdleBobFrequency,
        TuningKey::TransitionToCruiseChance,
        TuningKey::Noise,
        TuningKey::HealthRegenFactor,
        TuningKey::HealthStarveFactor,
        TuningKey::HealthRegenThreshold,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TuningKey::FoodSeekThreshold => "food_seek_threshold",
            TuningKey::FoodDetectRadius => "food_detect_radius",
            TuningKey::LookForFoodSpeedFactor => "look_for_food_speed_factor",
            TuningKey::ChaseFoodSpeedFactor => "chase_food_speed_factor",
            TuningKey::MouthRadiusFactor => "mouth_radius_factor",
            TuningKey::EatExtraMargin => "eat_extra_margin",
            TuningKey::CruiseMinTime => "cruise_min_time",
            TuningKey::CruiseMaxTime => "cruise_max_time",
            TuningKey::CruiseArrivalRadius => "cruise_arrival_radius",
            TuningKey::CruiseSpeedFactor => "cruise_speed_factor",
            TuningKey::TransitionToIdleChance => "transition_to_idle_chance",
            TuningKey::IdleMinTime => "idle_min_time",
            TuningKey::IdleMaxTime => "idle_max_time",
            TuningKey::IdleSpeedFactor => "idle_speed_factor",
            TuningKey::IdleBobAmplitude => "idle_bob_amplitude",
            TuningKey::IdleBobFrequency => "idle_bob_frequency",
            TuningKey::TransitionToCruiseChance => "transition_to_cruise_chance",
            TuningKey::Noise => "noise",
            TuningKey::HealthRegenFactor => "health_regen_factor",
            TuningKey::HealthStarveFactor => "health_starve_factor",
            TuningKey::HealthRegenThreshold => "health_regen_threshold",
        }
    }

    pub fn default_value(self) -> f32 {
        match self {
            TuningKey::FoodSeekThreshold => 0.5,
            TuningKey::FoodDetectRadius => 200.0,
            TuningKey::LookForFoodSpeedFactor => 0.9,
            TuningKey::ChaseFoodSpeedFactor => 1.0,
            TuningKey::MouthRadiusFactor => 0.35,
            TuningKey::EatExtraMargin => 6.0,
            TuningKey::CruiseMinTime => 6.0,
            TuningKey::CruiseMaxTime => 16.0,
            TuningKey::CruiseArrivalRadius => 40.0,
            TuningKey::CruiseSpeedFactor => 0.6,
            TuningKey::TransitionToIdleChance => 0.01,
            TuningKey::IdleMinTime => 0.6,
            TuningKey::IdleMaxTime => 1.4,
            TuningKey::IdleSpeedFactor => 0.08,
            TuningKey::IdleBobAmplitude => 18.0,
            TuningKey::IdleBobFrequency => 0.8,
            TuningKey::TransitionToCruiseChance => 0.25,
            TuningKey::Noise => 0.0,
            TuningKey::HealthRegenFactor => 0.0,
            TuningKey::HealthStarveFactor => 0.0,
            TuningKey::HealthRegenThreshold => 0.5,
        }
    }

    pub fn from_name(name: &str) -> Option<TuningKey> {
        TuningKey::ALL.into_iter().find(|key| key.name() == name)
    }
}

/// Stats that shape movement feel vary less between individuals.
const STABLE_STATS: [&str; 4] = ["speed", "acceleration", "turn_speed", "hunger_rate"];

const STABLE_SPAN: f32 = 0.04;
const DEFAULT_SPAN: f32 = 0.10;

/// Personal variation applied to one stat or tuning value at creation time.
pub fn jitter(rng: &mut SimRng, key: &str, value: f32) -> f32 {
    let span = if STABLE_STATS.contains(&key) {
        STABLE_SPAN
    } else {
        DEFAULT_SPAN
    };
    value * (1.0 + rng.range(-span, span))
}
