//! Drives a turtlesim turtle with a constant velocity command on every pose
//! update.
//!
//! [`TurtleControllerNode`] is registered against any [`Middleware`]. This
//! crate ships an in-process middleware ([`LocalContext`]); the ROS2 one lives
//! in `turtle-controller-ros2`.
#![warn(
    future_incompatible,
    rust_2018_idioms,
    single_use_lifetimes,
    unreachable_pub
)]

mod dummy_publisher;
mod error;
pub mod local;
pub mod msg;
mod node;
mod traits;

use std::time::Duration;

pub use dummy_publisher::*;
pub use error::*;
pub use local::{LocalContext, LocalNode, TopicInfo};
pub use node::*;
pub use traits::*;

pub const NODE_NAME: &str = "turtle_controller";
pub const POSE_TOPIC: &str = "/turtle1/pose";
pub const CMD_VEL_TOPIC: &str = "/turtle1/cmd_vel";
pub const QUEUE_DEPTH: usize = 10;

/// Forward speed in m/s.
pub const LINEAR_VELOCITY: f64 = 5.0;
/// Turn rate in rad/s.
pub const ANGULAR_VELOCITY: f64 = 0.0;

/// Default period of the middleware dispatch loop.
pub const SPIN_INTERVAL: Duration = Duration::from_millis(10);
