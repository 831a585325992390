use bevy::prelude::*;

use crate::SMALL_THRESHOLD;

/// Seek behavior steers towards the target at max speed. It does not
/// slow down on approach, so the agent overshoots and circles back.
pub fn seek(position: Vec3, velocity: Vec3, target: Vec3, max_speed: f32) -> Vec3 {
    let offset = target - position;
    let distance = offset.length();
    if distance < SMALL_THRESHOLD {
        return -velocity;
    }
    offset / distance * max_speed - velocity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_ignores_distance() {
        let near = seek(Vec3::ZERO, Vec3::ZERO, Vec3::new(0.1, 0.0, 0.0), 0.5);
        let far = seek(Vec3::ZERO, Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0), 0.5);
        assert!(near.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6));
        assert!(far.abs_diff_eq(near, 1e-6));
    }

    #[test]
    fn test_seek_corrects_velocity() {
        let velocity = Vec3::new(0.0, 0.0, 0.5);
        let force = seek(Vec3::ZERO, velocity, Vec3::new(0.0, 0.0, -3.0), 0.5);
        assert!(force.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6), "{force}");
    }

    #[test]
    fn test_seek_at_target_brakes() {
        let velocity = Vec3::new(0.2, 0.0, 0.0);
        assert_eq!(seek(Vec3::ONE, velocity, Vec3::ONE, 0.5), -velocity);
    }
}
