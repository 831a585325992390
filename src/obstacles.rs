use avian3d::prelude::*;
use bevy::prelude::*;

use crate::{
    agent::{AgentState, SteeringAgent},
    behaviors::avoid::{ObstacleContact, ObstacleQuery, SphereSweep},
    control::obstacle_sweep,
    heading::HeadingIndicators,
};

/// Answers obstacle sweeps with Avian shape casts. Each hit collider is
/// reported with the identity of its rigid body, as resolved by `body_of`.
pub(crate) struct AvianObstacleQuery<'a, 'w, 's, B>
where
    B: Fn(Entity) -> Entity,
{
    spatial_query: &'a SpatialQuery<'w, 's>,
    body_of: B,
    filter: SpatialQueryFilter,
    max_hits: u32,
}

impl<'a, 'w, 's, B> AvianObstacleQuery<'a, 'w, 's, B>
where
    B: Fn(Entity) -> Entity,
{
    pub(crate) fn new(
        spatial_query: &'a SpatialQuery<'w, 's>,
        body_of: B,
        exclude: impl IntoIterator<Item = Entity>,
        max_hits: u32,
    ) -> Self {
        Self {
            spatial_query,
            body_of,
            filter: SpatialQueryFilter::default().with_excluded_entities(exclude),
            max_hits,
        }
    }
}

impl<B> ObstacleQuery for AvianObstacleQuery<'_, '_, '_, B>
where
    B: Fn(Entity) -> Entity,
{
    fn sweep(&self, sweep: &SphereSweep) -> Vec<ObstacleContact> {
        let shape = Collider::sphere(sweep.radius);
        let config = ShapeCastConfig {
            max_distance: sweep.max_distance,
            ..Default::default()
        };
        let hits = self.spatial_query.shape_hits(
            &shape,
            sweep.origin,
            Quat::IDENTITY,
            sweep.direction,
            self.max_hits,
            &config,
            &self.filter,
        );

        hits.into_iter()
            .map(|hit| ObstacleContact {
                distance: hit.distance,
                normal: hit.normal1,
                surface: (self.body_of)(hit.entity).into(),
            })
            .collect()
    }
}

/// Half the width of the agent's collider bounds along the world X axis,
/// or the configured radius if the body has no collider of its own.
pub(crate) fn bounding_radius(
    agent: &SteeringAgent,
    collider: Option<&Collider>,
    transform: &GlobalTransform,
) -> f32 {
    match collider {
        Some(collider) => {
            let aabb = collider.aabb(Vec3::ZERO, transform.rotation());
            (aabb.max.x - aabb.min.x) * 0.5
        }
        None => agent.bounding_radius,
    }
}

/// Draws the volume each agent sweeps for obstacles.
pub(crate) fn debug_obstacle_sweeps(
    mut gizmos: Gizmos,
    query: Query<(
        &SteeringAgent,
        &GlobalTransform,
        &LinearVelocity,
        &HeadingIndicators,
        Option<&Collider>,
    )>,
) {
    const SWEEP_COLOR: Color = Color::srgb(0.933, 0.0, 1.0);

    for (agent, transform, velocity, headings, collider) in query.iter() {
        if !agent.avoid_obstacles {
            continue;
        }
        let state = AgentState {
            position: transform.translation(),
            velocity: **velocity,
            mass: agent.mass,
            bounding_radius: bounding_radius(agent, collider, transform),
        };
        let sweep = obstacle_sweep(&agent.parameters, &state, headings.current);
        let end = sweep.origin + *sweep.direction * sweep.max_distance;
        gizmos.sphere(sweep.origin, sweep.radius, SWEEP_COLOR);
        gizmos.sphere(end, sweep.radius, SWEEP_COLOR);
        gizmos.line(sweep.origin, end, SWEEP_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_radius_from_collider() {
        let agent = SteeringAgent::default();
        let collider = Collider::sphere(0.1);
        let transform = GlobalTransform::from(
            Transform::from_xyz(1.0, 2.0, 3.0).with_rotation(Quat::from_rotation_y(0.7)),
        );

        let radius = bounding_radius(&agent, Some(&collider), &transform);
        assert!((radius - 0.1).abs() < 1e-5, "{radius}");
    }

    #[test]
    fn test_bounding_radius_without_collider() {
        let transform = GlobalTransform::IDENTITY;

        let agent = SteeringAgent::default();
        assert_eq!(bounding_radius(&agent, None, &transform), 0.05);

        let agent = SteeringAgent::default().with_bounding_radius(0.2);
        assert_eq!(bounding_radius(&agent, None, &transform), 0.2);
    }

    #[test]
    fn test_sweep_radius_adds_clearance() {
        let agent = SteeringAgent::default();
        let collider = Collider::sphere(0.1);
        let transform = GlobalTransform::IDENTITY;
        let state = AgentState::new(
            Vec3::ZERO,
            1.0,
            bounding_radius(&agent, Some(&collider), &transform),
        )
        .with_velocity(Vec3::X);

        let sweep = obstacle_sweep(&agent.parameters, &state, Dir3::NEG_Z);
        assert!((sweep.radius - 0.12).abs() < 1e-5, "{}", sweep.radius);
        assert_eq!(sweep.direction, Dir3::X);
    }
}
