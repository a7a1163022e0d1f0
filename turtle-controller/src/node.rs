use std::sync::Arc;

use tracing::info;

use crate::{
    error::Error,
    msg::{
        geometry_msgs::{Twist, Vector3},
        turtlesim::Pose,
    },
    traits::{Middleware, Publisher, QosProfile},
    ANGULAR_VELOCITY, CMD_VEL_TOPIC, LINEAR_VELOCITY, POSE_TOPIC, QUEUE_DEPTH,
};

/// Drives the turtle with a constant velocity whenever its pose is updated.
#[derive(Clone)]
pub struct TurtleControllerNode {
    cmd_vel_publisher: Arc<dyn Publisher<Twist>>,
}

impl TurtleControllerNode {
    /// Registers the `/turtle1/cmd_vel` publisher and the `/turtle1/pose`
    /// subscription with `middleware`.
    pub fn new<M: Middleware>(middleware: &mut M) -> Result<Self, Error> {
        let qos = QosProfile::keep_last(QUEUE_DEPTH);
        let cmd_vel_publisher: Arc<dyn Publisher<Twist>> =
            Arc::from(middleware.create_publisher::<Twist>(CMD_VEL_TOPIC, qos)?);

        let node = Self { cmd_vel_publisher };
        let callback_node = node.clone();
        middleware.create_subscription(POSE_TOPIC, qos, move |pose: Pose| {
            callback_node.pose_callback(&pose)
        })?;

        info!("turtle controller has been initialized!");
        Ok(node)
    }

    /// Creates a node that publishes through `cmd_vel_publisher` without
    /// subscribing to anything. Pose updates are fed via [`Self::pose_callback`].
    pub fn with_publisher(cmd_vel_publisher: Arc<dyn Publisher<Twist>>) -> Self {
        Self { cmd_vel_publisher }
    }

    /// Publishes one velocity command. The pose is not inspected.
    pub fn pose_callback(&self, _pose: &Pose) -> Result<(), Error> {
        self.cmd_vel_publisher.publish(&velocity_command())
    }
}

impl std::fmt::Debug for TurtleControllerNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurtleControllerNode").finish_non_exhaustive()
    }
}

/// The command sent on every pose update.
pub fn velocity_command() -> Twist {
    Twist {
        linear: Vector3 {
            x: LINEAR_VELOCITY,
            ..Default::default()
        },
        angular: Vector3 {
            z: ANGULAR_VELOCITY,
            ..Default::default()
        },
    }
}
