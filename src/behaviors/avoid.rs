use bevy::prelude::*;
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Identity of a surface reported by an obstacle query. Agents use it to
/// recognise (and ignore) their own colliders.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SurfaceId(pub u64);

impl From<Entity> for SurfaceId {
    fn from(entity: Entity) -> Self {
        SurfaceId(entity.to_bits())
    }
}

/// A surface hit by an obstacle sweep. Only valid for the tick it was
/// produced in.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ObstacleContact {
    /// Distance travelled along the sweep before touching the surface.
    pub distance: f32,
    /// Outward unit normal of the hit surface.
    pub normal: Vec3,
    pub surface: SurfaceId,
}

/// A sphere swept through space to find upcoming obstacles.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SphereSweep {
    pub origin: Vec3,
    pub direction: Dir3,
    pub radius: f32,
    pub max_distance: f32,
}

/// Something that can answer obstacle sweeps: a physics engine, a
/// spatial grid, or a plain list of shapes.
pub trait ObstacleQuery {
    /// All surfaces touched by `sweep`, in any order. Surfaces already
    /// overlapping the sphere at its origin are reported with distance 0.
    fn sweep(&self, sweep: &SphereSweep) -> Vec<ObstacleContact>;
}

/// Obstacle avoidance pushes the agent away from every surface found
/// ahead of it. Each contact contributes its normal scaled by how deep
/// it sits inside the forward detection range, capped at `max_force`.
///
/// Contacts belonging to `agent` and contacts at distance 0 are ignored.
/// The sum is left unbounded so that several close obstacles can
/// outweigh the pull towards the target; the caller clamps the
/// combined force.
pub fn avoid(
    agent: SurfaceId,
    contacts: &[ObstacleContact],
    forward_detection: f32,
    max_force: f32,
) -> Vec3 {
    let mut steering_force = Vec3::ZERO;

    for contact in contacts {
        if contact.surface == agent || contact.distance <= 0.0 {
            continue;
        }
        let scaled_force = ((forward_detection - contact.distance) / forward_detection) * max_force;
        let desired_force = scaled_force.min(max_force);
        steering_force += contact.normal * desired_force;
    }

    steering_force
}

/// A static sphere for [SphereObstacles].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SphereObstacle {
    pub surface: SurfaceId,
    pub center: Vec3,
    pub radius: f32,
}

/// Brute-force obstacle query over a list of spheres. Handy for tests and
/// for hosts that run the controller without a physics engine.
#[derive(Debug, Clone, Default)]
pub struct SphereObstacles(pub Vec<SphereObstacle>);

impl SphereObstacles {
    pub fn push(&mut self, surface: SurfaceId, center: Vec3, radius: f32) {
        self.0.push(SphereObstacle {
            surface,
            center,
            radius,
        });
    }

    fn sweep_one(sweep: &SphereSweep, obstacle: &SphereObstacle) -> Option<ObstacleContact> {
        let reach = sweep.radius + obstacle.radius;
        let m = sweep.origin - obstacle.center;
        let c = m.length_squared() - reach * reach;
        if c <= 0.0 {
            // Overlapping before moving at all.
            return Some(ObstacleContact {
                distance: 0.0,
                normal: -*sweep.direction,
                surface: obstacle.surface,
            });
        }

        let b = m.dot(*sweep.direction);
        if b > 0.0 {
            // Moving away from the obstacle.
            return None;
        }
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let distance = -b - discriminant.sqrt();
        if distance > sweep.max_distance {
            return None;
        }

        let center = sweep.origin + *sweep.direction * distance;
        Some(ObstacleContact {
            distance,
            normal: (center - obstacle.center).normalize_or_zero(),
            surface: obstacle.surface,
        })
    }
}

impl ObstacleQuery for SphereObstacles {
    fn sweep(&self, sweep: &SphereSweep) -> Vec<ObstacleContact> {
        self.0
            .iter()
            .filter_map(|obstacle| Self::sweep_one(sweep, obstacle))
            .collect()
    }
}
