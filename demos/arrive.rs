use avian3d::prelude::*;
use bevy::prelude::*;
use bevy_steering_controller::prelude::*;
use rand::Rng;

/// Set to false to let the agent drive straight through the obstacles.
const ENABLE_OBSTACLES: bool = true;
const ARENA_HALF_SIZE: f32 = 1.5;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(PhysicsPlugins::default())
        .add_plugins(SteeringPlugin)
        .add_plugins(DebugSteeringPlugin)
        .add_systems(Startup, setup)
        .add_systems(Update, hop_target)
        .run();
}

#[derive(Component)]
struct TargetMarker {
    timer: Timer,
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Ground plane, visual only
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::new(Vec3::Y, Vec2::splat(ARENA_HALF_SIZE + 0.5)))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.3, 0.5, 0.3),
            ..default()
        })),
        Transform::from_xyz(0.0, -0.1, 0.0),
    ));

    // Obstacles
    let obstacle_mesh = meshes.add(Sphere::new(0.15));
    let obstacle_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.7, 0.4, 0.4),
        ..default()
    });
    for position in [
        Vec3::new(0.5, 0.0, 0.0),
        Vec3::new(-0.6, 0.0, 0.4),
        Vec3::new(0.0, 0.0, -0.7),
        Vec3::new(0.8, 0.0, 0.9),
    ] {
        commands.spawn((
            Mesh3d(obstacle_mesh.clone()),
            MeshMaterial3d(obstacle_material.clone()),
            Transform::from_translation(position),
            RigidBody::Static,
            Collider::sphere(0.15),
        ));
    }

    // Target marker
    let target = commands
        .spawn((
            Mesh3d(meshes.add(Sphere::new(0.04))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(1.0, 1.0, 0.0),
                emissive: LinearRgba::new(1.0, 1.0, 0.0, 1.0),
                ..default()
            })),
            Transform::from_xyz(1.2, 0.0, -1.2),
            TargetMarker {
                timer: Timer::from_seconds(6.0, TimerMode::Repeating),
            },
        ))
        .id();

    // Agent with two heading indicators
    let indicator_mesh = meshes.add(Cuboid::new(0.01, 0.01, 0.12));
    let desired_material = materials.add(Color::srgb(0.0, 1.0, 1.0));
    let current_material = materials.add(Color::srgb(0.0, 1.0, 0.0));
    commands
        .spawn((
            Mesh3d(meshes.add(Sphere::new(0.05))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(0.2, 0.8, 0.2),
                ..default()
            })),
            Transform::from_xyz(-1.2, 0.0, 1.2),
            RigidBody::Dynamic,
            Collider::sphere(0.05),
            SteeringAgent::default().with_obstacle_avoidance(ENABLE_OBSTACLES),
            SeekTarget::Entity(target),
        ))
        .with_children(|agent| {
            agent.spawn((
                Mesh3d(indicator_mesh.clone()),
                MeshMaterial3d(desired_material),
                Transform::default(),
                HeadingIndicator::Desired,
            ));
            agent.spawn((
                Mesh3d(indicator_mesh),
                MeshMaterial3d(current_material),
                Transform::default(),
                HeadingIndicator::Current,
            ));
        });

    // Top-down camera
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 4.5, 0.01).looking_at(Vec3::ZERO, Vec3::Z),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 8.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

/// Move the target somewhere else every few seconds. The agent reads
/// the new position on its next tick.
fn hop_target(time: Res<Time>, mut query: Query<(&mut Transform, &mut TargetMarker)>) {
    let mut rng = rand::rng();
    for (mut transform, mut marker) in query.iter_mut() {
        if !marker.timer.tick(time.delta()).just_finished() {
            continue;
        }
        transform.translation = Vec3::new(
            rng.random_range(-ARENA_HALF_SIZE..ARENA_HALF_SIZE),
            0.0,
            rng.random_range(-ARENA_HALF_SIZE..ARENA_HALF_SIZE),
        );
        info!("Target moved to {}", transform.translation);
    }
}
