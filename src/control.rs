use bevy::prelude::*;
use enum_map::{Enum, EnumMap};

use crate::{
    SMALL_THRESHOLD,
    agent::{AgentState, SteeringParameters, TargetBehavior},
    behaviors::{
        arrive::arrive,
        avoid::{ObstacleContact, ObstacleQuery, SphereSweep, SurfaceId, avoid},
        seek::seek,
    },
    error::SteeringError,
    heading::HeadingIndicators,
};

/// Enum representing the different types of steering behaviors.
#[derive(Debug, Copy, Clone, Enum, Hash, PartialEq, Eq)]
pub enum BehaviorType {
    Arrive,
    Seek,
    ObstacleAvoidance,
}

/// The force each steering behavior asked for during the last tick,
/// before they were summed and clamped.
#[derive(Component, Default, Debug, Copy, Clone, PartialEq)]
pub struct SteeringForces {
    values: EnumMap<BehaviorType, Vec3>,
}

impl SteeringForces {
    pub fn get(&self, behavior: BehaviorType) -> Vec3 {
        self.values[behavior]
    }

    pub(crate) fn set(&mut self, behavior: BehaviorType, force: Vec3) {
        self.values[behavior] = force;
    }

    /// Behaviors that produced a non-zero force.
    pub fn iter(&self) -> impl Iterator<Item = (BehaviorType, Vec3)> + '_ {
        self.values
            .iter()
            .filter(|(_, force)| **force != Vec3::ZERO)
            .map(|(behavior, force)| (behavior, *force))
    }

    /// Unclamped sum of all behavior forces.
    pub fn total(&self) -> Vec3 {
        self.values.values().copied().sum()
    }
}

/// The sphere an agent sweeps ahead of itself to find obstacles. A
/// resting agent has no velocity to sweep along, so it looks along
/// `fallback` instead.
pub(crate) fn obstacle_sweep(
    parameters: &SteeringParameters,
    state: &AgentState,
    fallback: Dir3,
) -> SphereSweep {
    let direction = if state.velocity.length() > SMALL_THRESHOLD {
        Dir3::new(state.velocity).unwrap_or(fallback)
    } else {
        fallback
    };
    SphereSweep {
        origin: state.position,
        direction,
        radius: state.bounding_radius + parameters.avoidance_radius,
        max_distance: parameters.forward_detection,
    }
}

/// Evaluate every steering behavior for one tick.
pub(crate) fn compute_forces(
    parameters: &SteeringParameters,
    behavior: TargetBehavior,
    identity: SurfaceId,
    state: &AgentState,
    target: Vec3,
    contacts: &[ObstacleContact],
) -> SteeringForces {
    let mut forces = SteeringForces::default();
    match behavior {
        TargetBehavior::Arrive => {
            let force = arrive(
                state.position,
                state.velocity,
                target,
                parameters.deceleration_radius,
                parameters.max_speed,
            );
            forces.set(BehaviorType::Arrive, force);
        }
        TargetBehavior::Seek => {
            let force = seek(state.position, state.velocity, target, parameters.max_speed);
            forces.set(BehaviorType::Seek, force);
        }
    }
    let avoidance = avoid(
        identity,
        contacts,
        parameters.forward_detection,
        parameters.max_force,
    );
    forces.set(BehaviorType::ObstacleAvoidance, avoidance);
    forces
}

/// Applies a force to a body for one tick. Implement this to plug the
/// controller into a physics engine's own integration scheme.
pub trait Integrator {
    fn integrate(&mut self, state: &mut AgentState, force: Vec3, dt: f32);
}

/// Semi-implicit Euler: velocity first, then position from the new
/// velocity.
#[derive(Debug, Default, Copy, Clone)]
pub struct SemiImplicitEuler;

impl Integrator for SemiImplicitEuler {
    fn integrate(&mut self, state: &mut AgentState, force: Vec3, dt: f32) {
        state.velocity += force / state.mass * dt;
        state.position += state.velocity * dt;
    }
}

/// What the host hands the controller each tick.
#[derive(Clone, Copy)]
pub struct SteeringInputs<'a> {
    /// Where the agent should go. Read fresh every tick.
    pub target: Vec3,
    /// Answers obstacle sweeps. `None` means no obstacles are known.
    pub obstacles: Option<&'a dyn ObstacleQuery>,
}

impl<'a> SteeringInputs<'a> {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            obstacles: None,
        }
    }

    pub fn with_obstacles(self, obstacles: &'a dyn ObstacleQuery) -> Self {
        Self {
            obstacles: Some(obstacles),
            ..self
        }
    }
}

/// Result of one controller tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SteeringOutput {
    /// The clamped force that was applied.
    pub force: Vec3,
    /// Per-behavior forces before summing and clamping.
    pub forces: SteeringForces,
    /// Velocity after integration and the speed clamp.
    pub velocity: Vec3,
    pub position: Vec3,
    pub headings: HeadingIndicators,
}

/// Steers a single agent towards a target while avoiding obstacles. The
/// host calls [SteeringController::tick] once per fixed simulation step.
pub struct SteeringController<I: Integrator = SemiImplicitEuler> {
    identity: SurfaceId,
    parameters: SteeringParameters,
    behavior: TargetBehavior,
    avoid_obstacles: bool,
    state: AgentState,
    integrator: I,
    headings: HeadingIndicators,
}

impl<I: Integrator> SteeringController<I> {
    /// Build a controller for the agent identified by `identity`. Fails if
    /// any parameter, the mass or the bounding radius is invalid.
    pub fn new(
        identity: SurfaceId,
        parameters: SteeringParameters,
        state: AgentState,
        integrator: I,
    ) -> Result<Self, SteeringError> {
        parameters.validate()?;
        state.validate()?;
        Ok(Self {
            identity,
            parameters,
            behavior: TargetBehavior::default(),
            avoid_obstacles: true,
            state,
            integrator,
            headings: HeadingIndicators::default(),
        })
    }

    pub fn with_behavior(self, behavior: TargetBehavior) -> Self {
        Self { behavior, ..self }
    }

    pub fn with_obstacle_avoidance(self, enabled: bool) -> Self {
        Self {
            avoid_obstacles: enabled,
            ..self
        }
    }

    pub fn identity(&self) -> SurfaceId {
        self.identity
    }

    pub fn parameters(&self) -> &SteeringParameters {
        &self.parameters
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn headings(&self) -> &HeadingIndicators {
        &self.headings
    }

    /// Advance the agent by one fixed step of `dt` seconds.
    pub fn tick(&mut self, dt: f32, inputs: SteeringInputs<'_>) -> SteeringOutput {
        let contacts = match inputs.obstacles {
            Some(query) if self.avoid_obstacles => {
                let sweep = obstacle_sweep(&self.parameters, &self.state, self.headings.current);
                query.sweep(&sweep)
            }
            _ => Vec::new(),
        };

        let forces = compute_forces(
            &self.parameters,
            self.behavior,
            self.identity,
            &self.state,
            inputs.target,
            &contacts,
        );
        let force = forces.total().clamp_length_max(self.parameters.max_force);

        self.integrator.integrate(&mut self.state, force, dt);
        self.state.velocity = self
            .state
            .velocity
            .clamp_length_max(self.parameters.max_speed);
        self.headings.face(force, self.state.velocity);

        SteeringOutput {
            force,
            forces,
            velocity: self.state.velocity,
            position: self.state.position,
            headings: self.headings,
        }
    }
}
