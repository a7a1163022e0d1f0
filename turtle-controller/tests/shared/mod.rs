#![allow(unreachable_pub)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    mpsc,
};

use turtle_controller::{msg::Message, LocalContext, LocalNode, Middleware, QosProfile};

pub fn test_node(ctx: &LocalContext) -> LocalNode {
    static COUNT: AtomicUsize = AtomicUsize::new(0);
    let n = COUNT.fetch_add(1, Ordering::Relaxed);
    let node_name = format!("test_turtle_controller_node_{n}");
    ctx.create_node(&node_name).unwrap()
}

/// Subscribes to `topic` and forwards every delivered message to the returned receiver.
pub fn listen<T: Message>(node: &mut LocalNode, topic: &str) -> mpsc::Receiver<T> {
    let (tx, rx) = mpsc::channel();
    node.create_subscription(topic, QosProfile::default(), move |msg: T| {
        tx.send(msg).unwrap();
        Ok(())
    })
    .unwrap();
    rx
}
