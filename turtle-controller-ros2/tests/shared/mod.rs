#![allow(unreachable_pub)]

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use turtle_controller_ros2::*;

pub const SETTLE: Duration = Duration::from_millis(500);
pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn test_node() -> Node {
    static COUNT: AtomicUsize = AtomicUsize::new(0);
    let n = COUNT.fetch_add(1, Ordering::Relaxed);
    let node_name = format!("test_turtle_controller_ros2_node_{n}");
    Node::new(&node_name, "turtle_controller_ros2_test").unwrap()
}
