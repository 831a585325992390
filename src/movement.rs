use avian3d::prelude::*;
use bevy::{ecs::query::QueryData, prelude::*};

use crate::{
    agent::{AgentState, SeekTarget, SteeringAgent},
    behaviors::avoid::{ObstacleQuery, SurfaceId},
    control::{SteeringForces, compute_forces, obstacle_sweep},
    heading::HeadingIndicators,
    obstacles::{AvianObstacleQuery, bounding_radius},
};

#[derive(QueryData)]
#[query_data(mutable)]
pub(crate) struct SteerAgentQuery {
    entity: Entity,
    agent: &'static SteeringAgent,
    target: &'static SeekTarget,
    global_transform: &'static GlobalTransform,
    mass: &'static ComputedMass,
    collider: Option<&'static Collider>,
    colliders: Option<&'static RigidBodyColliders>,
    forces: Forces,
    headings: &'static mut HeadingIndicators,
    steering_forces: &'static mut SteeringForces,
}

/// Runs the steering control law on every agent with a target: sum the
/// behavior forces, clamp to max force, hand the force to Avian and clamp
/// the resulting speed.
pub(crate) fn steer_agents(
    mut query: Query<SteerAgentQuery>,
    targets: Query<&GlobalTransform>,
    collider_of: Query<&ColliderOf>,
    spatial_query: SpatialQuery,
) {
    for mut item in query.iter_mut() {
        let agent = item.agent;
        let position = item.global_transform.translation();
        let target = match *item.target {
            SeekTarget::Position(target) => target,
            SeekTarget::Entity(target) => match targets.get(target) {
                Ok(transform) => transform.translation(),
                Err(_) => {
                    warn_once!(
                        "Steering target {target} of agent {} has no transform, braking",
                        item.entity
                    );
                    position
                }
            },
        };

        let state = AgentState {
            position,
            velocity: item.forces.linear_velocity(),
            mass: item.mass.value(),
            bounding_radius: bounding_radius(agent, item.collider, item.global_transform),
        };

        let contacts = if agent.avoid_obstacles {
            let sweep = obstacle_sweep(&agent.parameters, &state, item.headings.current);
            let own_colliders = item.colliders.into_iter().flat_map(|c| c.iter());
            let body_of = |collider: Entity| {
                collider_of
                    .get(collider)
                    .map(|collider_of| collider_of.body)
                    .unwrap_or(collider)
            };
            let query = AvianObstacleQuery::new(
                &spatial_query,
                body_of,
                own_colliders,
                agent.max_obstacle_hits,
            );
            query.sweep(&sweep)
        } else {
            Vec::new()
        };

        let forces = compute_forces(
            &agent.parameters,
            agent.behavior,
            SurfaceId::from(item.entity),
            &state,
            target,
            &contacts,
        );
        let force = forces.total().clamp_length_max(agent.parameters.max_force);
        item.forces.apply_force(force);

        // Avian integrates later in the frame and clamps again there
        // through MaxLinearSpeed.
        let velocity = state
            .velocity
            .clamp_length_max(agent.parameters.max_speed);
        *item.forces.linear_velocity_mut() = velocity;

        item.headings.face(force, velocity);
        *item.steering_forces = forces;
    }
}

/// Debug visualization for agent movement. Shows the desired heading,
/// current velocity and each behavior's force as colored arrows.
pub(crate) fn debug_movement(
    mut gizmos: Gizmos,
    query: Query<(
        &GlobalTransform,
        &SteeringAgent,
        &HeadingIndicators,
        &SteeringForces,
        &LinearVelocity,
    )>,
) {
    for (transform, agent, headings, forces, velocity) in query.iter() {
        let position = transform.translation();
        let scale = agent.parameters.max_speed;

        // Desired heading (cyan)
        let desired_end = position + *headings.desired * scale;
        gizmos.arrow(position, desired_end, Color::srgb(0.0, 1.0, 1.0));

        // Current velocity (green)
        gizmos.arrow(position, position + **velocity, Color::srgb(0.0, 1.0, 0.0));

        // Behavior forces (yellow), scaled so max force spans max speed
        for (_, force) in forces.iter() {
            let end = position + force / agent.parameters.max_force * scale;
            gizmos.line(position, end, Color::srgb(1.0, 1.0, 0.0));
        }
    }
}
