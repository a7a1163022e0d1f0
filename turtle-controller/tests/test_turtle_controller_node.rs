mod shared;

use assert_approx_eq::assert_approx_eq;
use shared::*;
use turtle_controller::{
    msg::{
        geometry_msgs::{Twist, Vector3},
        turtlesim::Pose,
    },
    LocalContext, Middleware, Publisher, QosProfile, TopicInfo, TurtleControllerNode,
    CMD_VEL_TOPIC, POSE_TOPIC,
};

fn expected_twist() -> Twist {
    Twist {
        linear: Vector3 {
            x: 5.0,
            y: 0.0,
            z: 0.0,
        },
        angular: Vector3 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        },
    }
}

#[test]
fn test_registration() {
    let ctx = LocalContext::init();
    let mut node = test_node(&ctx);
    assert!(ctx.topic_info(CMD_VEL_TOPIC).is_none());
    assert!(ctx.topic_info(POSE_TOPIC).is_none());

    let _controller = TurtleControllerNode::new(&mut node).unwrap();

    assert_eq!(
        ctx.topic_info(CMD_VEL_TOPIC),
        Some(TopicInfo {
            type_name: "geometry_msgs/msg/Twist",
            publisher_count: 1,
            subscription_count: 0,
        })
    );
    assert_eq!(
        ctx.topic_info(POSE_TOPIC),
        Some(TopicInfo {
            type_name: "turtlesim/msg/Pose",
            publisher_count: 0,
            subscription_count: 1,
        })
    );
}

#[test]
fn test_single_pose() {
    let ctx = LocalContext::init();
    let mut node = test_node(&ctx);
    let _controller = TurtleControllerNode::new(&mut node).unwrap();
    let cmd_vel = listen::<Twist>(&mut node, CMD_VEL_TOPIC);
    let pose_publisher = node
        .create_publisher::<Pose>(POSE_TOPIC, QosProfile::default())
        .unwrap();

    pose_publisher
        .publish(&Pose {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
            ..Default::default()
        })
        .unwrap();
    // pose -> controller, then cmd_vel -> listener
    assert_eq!(ctx.spin_once().unwrap(), 1);
    assert!(cmd_vel.try_recv().is_err());
    assert_eq!(ctx.spin_once().unwrap(), 1);

    let v = cmd_vel.try_recv().unwrap();
    assert_eq!(v, expected_twist());
    assert_approx_eq!(v.linear.x, 5.0);
    assert_approx_eq!(v.angular.z, 0.0);
    assert!(cmd_vel.try_recv().is_err());
}

#[test]
fn test_pose_sequence() {
    let ctx = LocalContext::init();
    let mut node = test_node(&ctx);
    let _controller = TurtleControllerNode::new(&mut node).unwrap();
    let cmd_vel = listen::<Twist>(&mut node, CMD_VEL_TOPIC);
    let pose_publisher = node
        .create_publisher::<Pose>(POSE_TOPIC, QosProfile::default())
        .unwrap();

    let poses = [
        Pose {
            x: 5.544445,
            y: 5.544445,
            theta: 0.0,
            linear_velocity: 0.0,
            angular_velocity: 0.0,
        },
        Pose {
            x: 6.0,
            y: 5.5,
            theta: 0.3,
            linear_velocity: 5.0,
            angular_velocity: 0.0,
        },
        Pose {
            x: 11.08,
            y: 1.2,
            theta: -2.9,
            linear_velocity: 5.0,
            angular_velocity: -1.0,
        },
    ];
    for pose in &poses {
        pose_publisher.publish(pose).unwrap();
    }
    assert_eq!(ctx.spin_until_idle(10).unwrap(), 6);

    let received: Vec<Twist> = cmd_vel.try_iter().collect();
    assert_eq!(received.len(), 3);
    for v in &received {
        assert_eq!(*v, received[0]);
        assert_eq!(*v, expected_twist());
    }
}

#[test]
fn test_no_pose_no_command() {
    let ctx = LocalContext::init();
    let mut node = test_node(&ctx);
    let _controller = TurtleControllerNode::new(&mut node).unwrap();
    let cmd_vel = listen::<Twist>(&mut node, CMD_VEL_TOPIC);

    for _ in 0..10 {
        assert_eq!(ctx.spin_once().unwrap(), 0);
    }
    assert!(cmd_vel.try_recv().is_err());
}

#[test]
fn test_pose_burst_is_bounded_by_queue_depth() {
    let ctx = LocalContext::init();
    let mut node = test_node(&ctx);
    let _controller = TurtleControllerNode::new(&mut node).unwrap();
    let cmd_vel = listen::<Twist>(&mut node, CMD_VEL_TOPIC);
    let pose_publisher = node
        .create_publisher::<Pose>(POSE_TOPIC, QosProfile::default())
        .unwrap();

    for i in 0..25 {
        pose_publisher
            .publish(&Pose {
                x: i as f32,
                ..Default::default()
            })
            .unwrap();
    }
    ctx.spin_until_idle(10).unwrap();
    assert_eq!(cmd_vel.try_iter().count(), 10);
}

#[test]
fn test_init_after_shutdown() {
    let ctx = LocalContext::init();
    let mut node = test_node(&ctx);
    ctx.shutdown();
    assert!(TurtleControllerNode::new(&mut node).is_err());
}

#[test]
fn test_publish_after_shutdown() {
    let ctx = LocalContext::init();
    let mut node = test_node(&ctx);
    let controller = TurtleControllerNode::new(&mut node).unwrap();
    ctx.shutdown();
    assert!(controller.pose_callback(&Pose::default()).is_err());
}

#[test]
fn test_dropped_controller_stops_commanding() {
    let ctx = LocalContext::init();
    let mut node = test_node(&ctx);
    let mut harness = test_node(&ctx);
    let controller = TurtleControllerNode::new(&mut node).unwrap();
    let cmd_vel = listen::<Twist>(&mut harness, CMD_VEL_TOPIC);
    let pose_publisher = harness
        .create_publisher::<Pose>(POSE_TOPIC, QosProfile::default())
        .unwrap();

    drop(controller);
    // the subscription callback still holds the publisher
    assert_eq!(ctx.topic_info(CMD_VEL_TOPIC).unwrap().publisher_count, 1);
    drop(node);

    assert_eq!(
        ctx.topic_info(POSE_TOPIC),
        Some(TopicInfo {
            type_name: "turtlesim/msg/Pose",
            publisher_count: 1,
            subscription_count: 0,
        })
    );
    assert_eq!(
        ctx.topic_info(CMD_VEL_TOPIC),
        Some(TopicInfo {
            type_name: "geometry_msgs/msg/Twist",
            publisher_count: 0,
            subscription_count: 1,
        })
    );

    pose_publisher.publish(&Pose::default()).unwrap();
    assert_eq!(ctx.spin_until_idle(10).unwrap(), 0);
    assert!(cmd_vel.try_recv().is_err());

    drop(pose_publisher);
    drop(harness);
    assert!(ctx.topic_info(POSE_TOPIC).is_none());
    assert!(ctx.topic_info(CMD_VEL_TOPIC).is_none());
}
