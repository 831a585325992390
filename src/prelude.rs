pub use crate::{
    agent::{AgentState, SeekTarget, SteeringAgent, SteeringParameters, TargetBehavior},
    behaviors::{
        arrive::arrive,
        avoid::{
            ObstacleContact, ObstacleQuery, SphereObstacle, SphereObstacles, SphereSweep,
            SurfaceId, avoid,
        },
        seek::seek,
    },
    control::{
        BehaviorType, Integrator, SemiImplicitEuler, SteeringController, SteeringForces,
        SteeringInputs, SteeringOutput,
    },
    error::{Parameter, SteeringError},
    heading::{HeadingIndicator, HeadingIndicators},
    plugin::{DebugSteeringPlugin, DebugSteeringSystem, SteeringPlugin, SteeringSystemSet},
};
