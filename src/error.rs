use strum::Display;
use thiserror::Error;

/// Names of the tunable steering parameters, used when reporting
/// configuration errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Parameter {
    MaxSpeed,
    MaxForce,
    DecelerationRadius,
    AvoidanceRadius,
    ForwardDetection,
}

/// Configuration errors raised when building a steering controller or
/// inserting a [crate::prelude::SteeringAgent]. Nothing in the per-tick
/// update returns an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SteeringError {
    #[error("steering parameter `{parameter}` must be positive and finite, got {value}")]
    InvalidParameter { parameter: Parameter, value: f32 },
    #[error("agent mass must be positive and finite, got {0}")]
    InvalidMass(f32),
    #[error("agent bounding radius must be non-negative and finite, got {0}")]
    InvalidBoundingRadius(f32),
}
