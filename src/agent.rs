use avian3d::prelude::*;
use bevy::{
    ecs::{lifecycle::HookContext, world::DeferredWorld},
    prelude::*,
};
use derivative::Derivative;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

use crate::{
    control::SteeringForces,
    error::{Parameter, SteeringError},
    heading::HeadingIndicators,
};

/// Tunable limits of the steering control law. Every value must be
/// positive and finite.
#[derive(Copy, Clone, Debug, PartialEq, Reflect, Derivative)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
#[derivative(Default)]
pub struct SteeringParameters {
    /// Upper bound on the agent's speed (m/s).
    #[derivative(Default(value = "0.5"))]
    pub max_speed: f32,
    /// Upper bound on the combined steering force (N).
    #[derivative(Default(value = "1.0"))]
    pub max_force: f32,
    /// Distance from the target within which the arrive behavior
    /// ramps the desired speed down linearly.
    #[derivative(Default(value = "1.0"))]
    pub deceleration_radius: f32,
    /// Clearance added to the agent's bounds when sweeping for obstacles.
    #[derivative(Default(value = "0.02"))]
    pub avoidance_radius: f32,
    /// How far ahead of the agent, along its velocity, obstacles are detected.
    #[derivative(Default(value = "0.3"))]
    pub forward_detection: f32,
}

impl SteeringParameters {
    pub fn with_max_speed(mut self, speed: f32) -> Self {
        self.max_speed = speed;
        self
    }

    pub fn with_max_force(mut self, force: f32) -> Self {
        self.max_force = force;
        self
    }

    pub fn with_deceleration_radius(mut self, radius: f32) -> Self {
        self.deceleration_radius = radius;
        self
    }

    pub fn with_avoidance_radius(mut self, radius: f32) -> Self {
        self.avoidance_radius = radius;
        self
    }

    pub fn with_forward_detection(mut self, distance: f32) -> Self {
        self.forward_detection = distance;
        self
    }

    /// Check that every parameter is positive and finite.
    pub fn validate(&self) -> Result<(), SteeringError> {
        let checks = [
            (Parameter::MaxSpeed, self.max_speed),
            (Parameter::MaxForce, self.max_force),
            (Parameter::DecelerationRadius, self.deceleration_radius),
            (Parameter::AvoidanceRadius, self.avoidance_radius),
            (Parameter::ForwardDetection, self.forward_detection),
        ];
        for (parameter, value) in checks {
            if !(value.is_finite() && value > 0.0) {
                return Err(SteeringError::InvalidParameter { parameter, value });
            }
        }
        Ok(())
    }
}

/// Kinematic state of a steered body.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AgentState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: f32,
    pub bounding_radius: f32,
}

impl AgentState {
    /// A resting agent at `position`.
    pub fn new(position: Vec3, mass: f32, bounding_radius: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            mass,
            bounding_radius,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), SteeringError> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(SteeringError::InvalidMass(self.mass));
        }
        if !(self.bounding_radius.is_finite() && self.bounding_radius >= 0.0) {
            return Err(SteeringError::InvalidBoundingRadius(self.bounding_radius));
        }
        Ok(())
    }
}

/// Which behavior pulls the agent towards its [SeekTarget].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Reflect)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum TargetBehavior {
    /// Move towards the target and slow down inside the deceleration radius.
    #[default]
    Arrive,
    /// Move towards the target at full speed. The agent will overshoot
    /// and oscillate around the target.
    Seek,
}

/// Represents an autonomous agent driven by the steering controller.
/// Give it a [SeekTarget] to make it move.
///
/// Inserting an agent with invalid parameters logs an error and removes
/// the component again together with its [HeadingIndicators] and
/// [SteeringForces], so the entity is never steered. The [RigidBody] is
/// left in place since it may belong to the caller, but it keeps its
/// default gravity.
#[derive(Component, Clone, Debug, Reflect, Derivative)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
#[derivative(Default)]
#[require(RigidBody, HeadingIndicators, SteeringForces)]
#[component(on_insert = on_agent_insert)]
#[reflect(Component)]
pub struct SteeringAgent {
    pub(crate) parameters: SteeringParameters,
    /// Mass of the agent's body (kg).
    #[derivative(Default(value = "1.0"))]
    pub(crate) mass: f32,
    /// Radius of the agent's bounds. Only used when the body has no
    /// collider to measure.
    #[derivative(Default(value = "0.05"))]
    pub(crate) bounding_radius: f32,
    pub(crate) behavior: TargetBehavior,
    /// Whether to sweep for and steer around obstacles.
    #[derivative(Default(value = "true"))]
    pub(crate) avoid_obstacles: bool,
    /// Upper bound on contacts returned by one obstacle sweep.
    #[derivative(Default(value = "8"))]
    pub(crate) max_obstacle_hits: u32,
}

impl SteeringAgent {
    pub fn with_parameters(self, parameters: SteeringParameters) -> Self {
        Self { parameters, ..self }
    }

    pub fn with_mass(self, mass: f32) -> Self {
        Self { mass, ..self }
    }

    pub fn with_bounding_radius(self, radius: f32) -> Self {
        Self {
            bounding_radius: radius,
            ..self
        }
    }

    /// Switch the agent to the full-speed seek behavior.
    pub fn seeking(self) -> Self {
        Self {
            behavior: TargetBehavior::Seek,
            ..self
        }
    }

    /// Switch the agent to the decelerating arrive behavior (the default).
    pub fn arriving(self) -> Self {
        Self {
            behavior: TargetBehavior::Arrive,
            ..self
        }
    }

    pub fn with_obstacle_avoidance(self, enabled: bool) -> Self {
        Self {
            avoid_obstacles: enabled,
            ..self
        }
    }

    /// Set the maximum number of obstacles reported per sweep. Shape
    /// casts are fairly expensive, so keep this small in crowded scenes.
    pub fn with_max_obstacle_hits(self, max_hits: u32) -> Self {
        Self {
            max_obstacle_hits: max_hits,
            ..self
        }
    }

    pub fn parameters(&self) -> &SteeringParameters {
        &self.parameters
    }

    pub(crate) fn validate(&self) -> Result<(), SteeringError> {
        self.parameters.validate()?;
        AgentState::new(Vec3::ZERO, self.mass, self.bounding_radius).validate()
    }
}

fn on_agent_insert(mut world: DeferredWorld, HookContext { entity, .. }: HookContext) {
    let Some(agent) = world.get::<SteeringAgent>(entity) else {
        return;
    };
    let validation = agent.validate();
    let mass = agent.mass;
    let max_speed = agent.parameters.max_speed;

    match validation {
        Ok(()) => {
            world.commands().entity(entity).insert((
                Mass(mass),
                GravityScale(0.0),
                MaxLinearSpeed(max_speed),
            ));
        }
        Err(err) => {
            error!("Rejecting steering agent {entity}: {err}");
            world
                .commands()
                .entity(entity)
                .remove::<(SteeringAgent, HeadingIndicators, SteeringForces)>();
        }
    }
}

/// The position a [SteeringAgent] moves towards. It can be replaced at
/// any time; it is read fresh every tick.
#[derive(Component, Debug, Copy, Clone, PartialEq, Reflect)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[reflect(Component)]
pub enum SeekTarget {
    /// A fixed point in world space.
    Position(Vec3),
    /// Follow the global translation of another entity.
    Entity(Entity),
}

impl SeekTarget {
    pub fn set_position(&mut self, position: Vec3) {
        *self = SeekTarget::Position(position);
    }

    pub fn follow(&mut self, entity: Entity) {
        *self = SeekTarget::Entity(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::{
        MinimalPlugins,
        asset::{AssetEvent, AssetPlugin, Assets},
        scene::ScenePlugin,
        transform::TransformPlugin,
    };

    #[test]
    fn test_default_parameters_are_valid() {
        assert_eq!(SteeringParameters::default().validate(), Ok(()));
        assert_eq!(SteeringAgent::default().validate(), Ok(()));
    }

    #[test]
    fn test_invalid_parameters() {
        let test_cases = [
            (
                SteeringParameters::default().with_max_speed(0.0),
                Parameter::MaxSpeed,
            ),
            (
                SteeringParameters::default().with_max_force(-1.0),
                Parameter::MaxForce,
            ),
            (
                SteeringParameters::default().with_deceleration_radius(f32::NAN),
                Parameter::DecelerationRadius,
            ),
            (
                SteeringParameters::default().with_avoidance_radius(0.0),
                Parameter::AvoidanceRadius,
            ),
            (
                SteeringParameters::default().with_forward_detection(f32::INFINITY),
                Parameter::ForwardDetection,
            ),
        ];
        for (params, expect) in test_cases {
            match params.validate() {
                Err(SteeringError::InvalidParameter { parameter, .. }) => {
                    assert_eq!(parameter, expect)
                }
                other => panic!("Expected {expect} to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_invalid_body() {
        let agent = SteeringAgent::default().with_mass(0.0);
        assert_eq!(agent.validate(), Err(SteeringError::InvalidMass(0.0)));

        let agent = SteeringAgent::default().with_bounding_radius(-0.1);
        assert_eq!(
            agent.validate(),
            Err(SteeringError::InvalidBoundingRadius(-0.1))
        );

        // A point-sized agent is fine.
        let agent = SteeringAgent::default().with_bounding_radius(0.0);
        assert_eq!(agent.validate(), Ok(()));
    }

    fn spawn_agent(agent: SteeringAgent) -> (App, Entity) {
        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            AssetPlugin::default(),
            ScenePlugin,
            TransformPlugin,
            PhysicsPlugins::new(Update),
        ));
        app.init_resource::<Assets<Mesh>>();
        app.add_message::<AssetEvent<Mesh>>();
        let entity = app.world_mut().spawn(agent).id();
        app.world_mut().flush();
        (app, entity)
    }

    #[test]
    fn test_insert_hook_configures_body() {
        let (app, entity) = spawn_agent(SteeringAgent::default().with_mass(2.0));
        let world = app.world();

        assert_eq!(world.get::<Mass>(entity).map(|m| m.0), Some(2.0));
        assert_eq!(world.get::<GravityScale>(entity).map(|g| g.0), Some(0.0));
        assert_eq!(world.get::<MaxLinearSpeed>(entity).map(|s| s.0), Some(0.5));
        assert!(world.get::<HeadingIndicators>(entity).is_some());
    }

    #[test]
    fn test_insert_hook_rejects_invalid_agent() {
        let (app, entity) = spawn_agent(SteeringAgent::default().with_mass(-1.0));
        let world = app.world();

        assert!(world.get::<SteeringAgent>(entity).is_none());
        assert!(world.get::<HeadingIndicators>(entity).is_none());
        assert!(world.get::<SteeringForces>(entity).is_none());
        assert!(world.get::<Mass>(entity).is_none());
        assert!(world.get::<GravityScale>(entity).is_none());
        assert!(world.get::<RigidBody>(entity).is_some());
    }
}
