//! Fixed topic table
//!
//! Every topic carries exactly one message family on one well-known port.

use std::collections::BTreeSet;
use std::fmt;

use crate::messages::MessageType;

/// How peers on a topic talk to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicPattern {
    /// Fire-and-forget latest-value publishing
    Publish,
    /// One request, one reply
    RequestReply,
}

/// Symbolic channel bound to a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Topic {
    pub name: &'static str,
    pub port: u16,
    pub message: MessageType,
    pub pattern: TopicPattern,
}

impl Topic {
    const fn publish(name: &'static str, port: u16, message: MessageType) -> Self {
        Self {
            name,
            port,
            message,
            pattern: TopicPattern::Publish,
        }
    }

    const fn request(name: &'static str, port: u16, message: MessageType) -> Self {
        Self {
            name,
            port,
            message,
            pattern: TopicPattern::RequestReply,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.port)
    }
}

pub const LEFT_RAW: Topic = Topic::publish("nodar/left/image_raw", 9800, MessageType::StampedImage);
pub const RIGHT_RAW: Topic =
    Topic::publish("nodar/right/image_raw", 9801, MessageType::StampedImage);
pub const LEFT_RECT: Topic =
    Topic::publish("nodar/left/image_rect", 9802, MessageType::StampedImage);
pub const RIGHT_RECT: Topic =
    Topic::publish("nodar/right/image_rect", 9803, MessageType::StampedImage);
pub const DISPARITY: Topic = Topic::publish("nodar/disparity", 9804, MessageType::StampedImage);
pub const COLOR_BLENDED_DEPTH: Topic = Topic::publish(
    "nodar/color_blended_depth/image_raw",
    9805,
    MessageType::StampedImage,
);
pub const SOUP: Topic =
    Topic::publish("nodar/point_cloud_soup", 9806, MessageType::PointCloudSoup);
pub const CAMERA_EXPOSURE: Topic = Topic::request(
    "nodar/set_exposure",
    9807,
    MessageType::CameraParameterRequest,
);
pub const CAMERA_GAIN: Topic =
    Topic::request("nodar/set_gain", 9808, MessageType::CameraParameterRequest);
pub const POINT_CLOUD: Topic = Topic::publish("nodar/point_cloud", 9809, MessageType::PointCloud);
pub const POINT_CLOUD_RGB: Topic =
    Topic::publish("nodar/point_cloud_rgb", 9810, MessageType::PointCloudRgb);
pub const RECORDING: Topic = Topic::request("nodar/recording", 9811, MessageType::SetBoolRequest);
pub const OBSTACLE: Topic = Topic::publish("nodar/obstacle", 9812, MessageType::ObstacleData);
pub const TOPBOT_RAW: Topic = Topic::publish("nodar/topbot_raw", 9813, MessageType::StampedImage);
pub const WAIT: Topic = Topic::request("nodar/wait", 9814, MessageType::SetBoolRequest);
pub const QA_FINDINGS: Topic = Topic::publish("nodar/qa_findings", 9822, MessageType::QaFindings);
pub const TOPBOT_RECT: Topic =
    Topic::publish("nodar/topbot_rect", 9823, MessageType::StampedImage);
pub const VELOCITY: Topic = Topic::publish("nodar/velocity", 9824, MessageType::VelocityData);
pub const OCCUPANCY_MAP: Topic =
    Topic::publish("nodar/occupancy_map", 9900, MessageType::StampedImage);

/// Topics carrying [`StampedImage`](crate::messages::StampedImage)
pub const IMAGE_TOPICS: [Topic; 9] = [
    LEFT_RAW,
    RIGHT_RAW,
    LEFT_RECT,
    RIGHT_RECT,
    DISPARITY,
    COLOR_BLENDED_DEPTH,
    TOPBOT_RAW,
    TOPBOT_RECT,
    OCCUPANCY_MAP,
];

/// Every topic, ordered by port
pub const ALL_TOPICS: [Topic; 19] = [
    LEFT_RAW,
    RIGHT_RAW,
    LEFT_RECT,
    RIGHT_RECT,
    DISPARITY,
    COLOR_BLENDED_DEPTH,
    SOUP,
    CAMERA_EXPOSURE,
    CAMERA_GAIN,
    POINT_CLOUD,
    POINT_CLOUD_RGB,
    RECORDING,
    OBSTACLE,
    TOPBOT_RAW,
    WAIT,
    QA_FINDINGS,
    TOPBOT_RECT,
    VELOCITY,
    OCCUPANCY_MAP,
];

/// Ports that user-chosen endpoints must avoid
pub fn reserved_ports() -> BTreeSet<u16> {
    ALL_TOPICS.iter().map(|topic| topic.port).collect()
}

/// Check whether `port` belongs to a fixed topic
pub fn is_reserved(port: u16) -> bool {
    ALL_TOPICS.iter().any(|topic| topic.port == port)
}

/// Find a topic by its full name or by the last path segment
pub fn lookup(name: &str) -> Option<Topic> {
    ALL_TOPICS
        .iter()
        .find(|topic| topic.name == name)
        .or_else(|| {
            ALL_TOPICS
                .iter()
                .find(|topic| topic.name.trim_start_matches("nodar/") == name)
        })
        .copied()
}

/// Find the topic bound to `port`
pub fn by_port(port: u16) -> Option<Topic> {
    ALL_TOPICS.iter().find(|topic| topic.port == port).copied()
}
