pub mod behavior;
pub mod census;
pub mod components;
pub mod factory;
pub mod geometry;
pub mod lifecycle;
pub mod motion;
pub mod pipeline;
pub mod tuning;
pub mod view;

pub use behavior::{handler, StateCtx, StateHandler};
pub use census::TankCensus;
pub use components::*;
pub use factory::{spawn_tank, FishFactory};
pub use pipeline::{apply_overrides, BehaviorPipeline, Proposals};
pub use tuning::TuningKey;
pub use view::FishView;
