//! Versioned binary framing for every message family
//!
//! Each message is `[envelope][fixed header][derived-length payload]`.
//! Header regions are zero padded to a family constant so a reader can
//! always read the header before deciding how much payload follows.
//!
//! Families implement [`WireMessage`]; decoding comes in a strict form
//! returning [`DecodeError`](crate::error::DecodeError) and a fail-soft
//! form that logs and returns the empty default.

pub mod any;
pub mod codec;
pub mod envelope;
pub mod image;
pub mod navigation;
pub mod obstacle;
pub mod pixel;
pub mod point_cloud;
pub mod qa_findings;
pub mod requests;
pub mod soup;
pub mod traits;
pub mod velocity;

pub use any::AnyMessage;
pub use codec::{ByteReader, ByteWriter};
pub use envelope::{MessageInfo, MessageType, ENVELOPE_SIZE, MAJOR_VERSION, MINOR_VERSION};
pub use image::{ColorConversion, Extrinsics, ImageHeader, StampedImage};
pub use navigation::{GpsData, ImuData, NavigationData, OdometryData};
pub use obstacle::{Obstacle, ObstacleData, OccupancyObstacle, OccupancyObstacleData, Vec2};
pub use pixel::PixelType;
pub use point_cloud::{Point, PointCloud, PointCloudRgb};
pub use qa_findings::{Finding, QaFindings, Severity};
pub use requests::{
    CameraParameterRequest, CameraParameterResponse, SetBoolRequest, SetBoolResponse,
};
pub use soup::PointCloudSoup;
pub use traits::WireMessage;
pub use velocity::VelocityData;
