use bevy::prelude::*;
use derivative::Derivative;

use crate::SMALL_THRESHOLD;

/// The two headings an agent reports every tick: where the steering force
/// wants it to go and where it is actually going. Purely cosmetic, nothing
/// reads these back into the control law.
#[derive(Component, Debug, Copy, Clone, PartialEq, Reflect, Derivative)]
#[derivative(Default)]
#[reflect(Component)]
pub struct HeadingIndicators {
    /// Direction of the last non-negligible steering force.
    #[derivative(Default(value = "Dir3::NEG_Z"))]
    pub desired: Dir3,
    /// Direction of the last non-negligible velocity.
    #[derivative(Default(value = "Dir3::NEG_Z"))]
    pub current: Dir3,
}

impl HeadingIndicators {
    /// Turn the indicators towards `force` and `velocity`. A vector too
    /// short to have a direction leaves its indicator where it was.
    pub fn face(&mut self, force: Vec3, velocity: Vec3) {
        if let Some(desired) = direction_of(force) {
            self.desired = desired;
        }
        if let Some(current) = direction_of(velocity) {
            self.current = current;
        }
    }
}

fn direction_of(v: Vec3) -> Option<Dir3> {
    if v.length() > SMALL_THRESHOLD {
        Dir3::new(v).ok()
    } else {
        None
    }
}

/// Marks a child of an agent whose global rotation should follow one of
/// the agent's [HeadingIndicators]. The child's -Z axis is pointed along
/// the heading.
#[derive(Component, Debug, Copy, Clone, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub enum HeadingIndicator {
    Desired,
    Current,
}

pub(crate) fn sync_heading_indicators(
    agents: Query<(&HeadingIndicators, &GlobalTransform)>,
    mut indicators: Query<(&HeadingIndicator, &ChildOf, &mut Transform)>,
) {
    for (indicator, child_of, mut transform) in indicators.iter_mut() {
        let Ok((headings, parent_transform)) = agents.get(child_of.parent()) else {
            continue;
        };
        let heading = match indicator {
            HeadingIndicator::Desired => headings.desired,
            HeadingIndicator::Current => headings.current,
        };
        let world_rotation = Quat::from_rotation_arc(Vec3::NEG_Z, *heading);
        transform.rotation = parent_transform.rotation().inverse() * world_rotation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn test_face_updates_both_headings() {
        let mut headings = HeadingIndicators::default();
        headings.face(Vec3::new(0.0, 0.0, 2.0), Vec3::new(-0.3, 0.0, 0.0));
        assert_eq!(headings.desired, Dir3::Z);
        assert_eq!(headings.current, Dir3::NEG_X);
    }

    #[test]
    fn test_face_keeps_heading_below_threshold() {
        let mut headings = HeadingIndicators::default();
        headings.face(Vec3::X, Vec3::Y);
        headings.face(Vec3::splat(1e-7), Vec3::ZERO);
        assert_eq!(headings.desired, Dir3::X);
        assert_eq!(headings.current, Dir3::Y);
    }

    #[test]
    fn test_sync_heading_indicators() {
        let mut world = World::new();
        let parent_rotation = Quat::from_rotation_y(0.7);
        let agent = world
            .spawn((
                HeadingIndicators {
                    desired: Dir3::X,
                    current: Dir3::NEG_Z,
                },
                GlobalTransform::from(Transform::from_rotation(parent_rotation)),
            ))
            .id();
        let desired = world
            .spawn((HeadingIndicator::Desired, Transform::default(), ChildOf(agent)))
            .id();
        let current = world
            .spawn((HeadingIndicator::Current, Transform::default(), ChildOf(agent)))
            .id();

        world
            .run_system_once(sync_heading_indicators)
            .expect("Failed to run sync_heading_indicators system");

        let global = |entity: Entity| {
            let local = world.get::<Transform>(entity).unwrap().rotation;
            (parent_rotation * local) * Vec3::NEG_Z
        };
        assert!(global(desired).abs_diff_eq(Vec3::X, 1e-5), "{}", global(desired));
        assert!(global(current).abs_diff_eq(Vec3::NEG_Z, 1e-5), "{}", global(current));
    }
}
