//! [`turtle_controller`] middleware implementation using ROS2.
#![cfg(feature = "ros2")]
#![warn(
    future_incompatible,
    missing_docs,
    rust_2018_idioms,
    single_use_lifetimes,
    unreachable_pub
)]

mod node;
mod pubsub;

pub use node::*;
// re-export
pub use r2r;
