use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A message that can travel over a channel.
pub trait Message:
    Clone + std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// ROS2 interface name, e.g. `geometry_msgs/msg/Twist`.
    const TYPE_NAME: &'static str;
}

macro_rules! message_type {
    ($($package_name:ident / $type_name:ident),* $(,)?) => {$(
        impl crate::msg::Message for crate::msg::$package_name::$type_name {
            const TYPE_NAME: &'static str =
                concat!(stringify!($package_name), "/msg/", stringify!($type_name));
        }
    )*};
}
message_type!(
    geometry_msgs / Twist,
    geometry_msgs / Vector3,
    turtlesim / Pose,
);

/// [geometry_msgs](https://github.com/ros2/common_interfaces/tree/HEAD/geometry_msgs)
pub mod geometry_msgs {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Twist {
        pub linear: Vector3,
        pub angular: Vector3,
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Vector3 {
        pub x: f64,
        pub y: f64,
        pub z: f64,
    }
}

/// [turtlesim](https://github.com/ros/ros_tutorials/tree/HEAD/turtlesim)
pub mod turtlesim {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Pose {
        pub x: f32,
        pub y: f32,
        pub theta: f32,
        pub linear_velocity: f32,
        pub angular_velocity: f32,
    }
}
