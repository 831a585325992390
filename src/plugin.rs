use bevy::prelude::*;

use crate::{
    heading::sync_heading_indicators,
    movement::{debug_movement, steer_agents},
    obstacles::debug_obstacle_sweeps,
};

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct SteeringSystemSet;

/// Steers every [crate::prelude::SteeringAgent] that has a
/// [crate::prelude::SeekTarget] once per fixed update. Requires Avian's
/// `PhysicsPlugins`.
pub struct SteeringPlugin;

impl Plugin for SteeringPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, steer_agents.in_set(SteeringSystemSet));
        app.add_systems(Update, sync_heading_indicators);
    }
}

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct DebugSteeringSystem;

pub struct DebugSteeringPlugin;

impl Plugin for DebugSteeringPlugin {
    fn build(&self, app: &mut App) {
        let debug_systems = (debug_movement, debug_obstacle_sweeps).in_set(DebugSteeringSystem);
        app.add_systems(Update, debug_systems);
    }
}
