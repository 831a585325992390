use bevy::prelude::*;

use crate::SMALL_THRESHOLD;

/// Arrive behavior steers towards the target and slows down before
/// reaching it. Inside `deceleration_radius` the desired speed ramps
/// down linearly to zero at the target. Depending on the deceleration
/// radius, max speed and max force, the agent may not come to a
/// complete stop.
///
/// Returns the velocity error, not a raw direction. At (or numerically
/// at) the target this is `-velocity`, i.e. pure braking.
pub fn arrive(
    position: Vec3,
    velocity: Vec3,
    target: Vec3,
    deceleration_radius: f32,
    max_speed: f32,
) -> Vec3 {
    let offset = target - position;
    let distance = offset.length();
    if distance < SMALL_THRESHOLD {
        return -velocity;
    }

    let scaled_speed = (distance / deceleration_radius) * max_speed;
    let desired_speed = scaled_speed.min(max_speed);
    let desired_velocity = offset / distance * desired_speed;
    desired_velocity - velocity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrive_far_from_target() {
        let force = arrive(Vec3::ZERO, Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 1.0, 0.5);
        assert!(force.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6), "{force}");
    }

    #[test]
    fn test_arrive_inside_deceleration_radius() {
        let velocity = Vec3::new(0.1, 0.0, 0.2);
        let force = arrive(Vec3::ZERO, velocity, Vec3::new(0.5, 0.0, 0.0), 1.0, 0.5);
        let expect = Vec3::new(0.25, 0.0, 0.0) - velocity;
        assert!(force.abs_diff_eq(expect, 1e-6), "{force}");
    }

    #[test]
    fn test_arrive_at_target_brakes() {
        let velocity = Vec3::new(0.3, -0.2, 0.1);
        let position = Vec3::new(1.0, 2.0, 3.0);
        let force = arrive(position, velocity, position, 1.0, 0.5);
        assert_eq!(force, -velocity);
        assert!(!force.is_nan());

        // Numerically at the target also brakes instead of normalizing noise.
        let nearly = position + Vec3::splat(1e-7);
        assert_eq!(arrive(position, velocity, nearly, 1.0, 0.5), -velocity);
    }

    #[test]
    fn test_arrive_desired_speed_is_monotonic() {
        let mut previous = 0.0;
        for i in 1..=40 {
            let distance = i as f32 * 0.05;
            let speed = arrive(Vec3::ZERO, Vec3::ZERO, Vec3::X * distance, 1.0, 0.5).length();
            assert!(
                speed >= previous - 1e-6,
                "Speed dropped from {previous} to {speed} at distance {distance}"
            );
            if distance >= 1.0 {
                assert!((speed - 0.5).abs() < 1e-6, "Expected max speed beyond radius");
            }
            previous = speed;
        }
    }
}
