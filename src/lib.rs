mod agent;
mod behaviors;
mod control;
mod error;
mod heading;
mod movement;
mod obstacles;
mod plugin;
pub mod prelude;

pub(crate) const SMALL_THRESHOLD: f32 = 0.00001;
