//! Topic names, fixed ports and endpoint addressing

pub mod endpoint;
pub mod ports;

pub use endpoint::Endpoint;
pub use ports::{
    by_port, is_reserved, lookup, reserved_ports, Topic, TopicPattern, ALL_TOPICS, IMAGE_TOPICS,
};
