//! Decode a message of any family by its type tag

use crate::error::DecodeError;

use super::envelope::{MessageInfo, MessageType};
use super::image::StampedImage;
use super::navigation::NavigationData;
use super::obstacle::{ObstacleData, OccupancyObstacleData};
use super::point_cloud::{PointCloud, PointCloudRgb};
use super::qa_findings::QaFindings;
use super::requests::{
    CameraParameterRequest, CameraParameterResponse, SetBoolRequest, SetBoolResponse,
};
use super::soup::PointCloudSoup;
use super::traits::WireMessage;
use super::velocity::VelocityData;

/// One decoded message of any known family
#[derive(Debug, Clone, PartialEq)]
pub enum AnyMessage {
    StampedImage(StampedImage),
    PointCloudSoup(PointCloudSoup),
    CameraParameterRequest(CameraParameterRequest),
    CameraParameterResponse(CameraParameterResponse),
    PointCloud(PointCloud),
    PointCloudRgb(PointCloudRgb),
    SetBoolRequest(SetBoolRequest),
    SetBoolResponse(SetBoolResponse),
    ObstacleData(ObstacleData),
    QaFindings(QaFindings),
    NavigationData(NavigationData),
    VelocityData(VelocityData),
    OccupancyObstacleData(OccupancyObstacleData),
}

impl AnyMessage {
    /// Dispatch on the envelope's type tag
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let info = MessageInfo::peek(bytes)?;
        let kind = info
            .kind()
            .ok_or(DecodeError::UnknownMessageType(info.message_type))?;

        Ok(match kind {
            MessageType::StampedImage => Self::StampedImage(StampedImage::decode(bytes)?),
            MessageType::PointCloudSoup => Self::PointCloudSoup(PointCloudSoup::decode(bytes)?),
            MessageType::CameraParameterRequest => {
                Self::CameraParameterRequest(CameraParameterRequest::decode(bytes)?)
            }
            MessageType::CameraParameterResponse => {
                Self::CameraParameterResponse(CameraParameterResponse::decode(bytes)?)
            }
            MessageType::PointCloud => Self::PointCloud(PointCloud::decode(bytes)?),
            MessageType::PointCloudRgb => Self::PointCloudRgb(PointCloudRgb::decode(bytes)?),
            MessageType::SetBoolRequest => Self::SetBoolRequest(SetBoolRequest::decode(bytes)?),
            MessageType::SetBoolResponse => Self::SetBoolResponse(SetBoolResponse::decode(bytes)?),
            MessageType::ObstacleData => Self::ObstacleData(ObstacleData::decode(bytes)?),
            MessageType::QaFindings => Self::QaFindings(QaFindings::decode(bytes)?),
            MessageType::NavigationData => Self::NavigationData(NavigationData::decode(bytes)?),
            MessageType::VelocityData => Self::VelocityData(VelocityData::decode(bytes)?),
            MessageType::OccupancyObstacleData => {
                Self::OccupancyObstacleData(OccupancyObstacleData::decode(bytes)?)
            }
        })
    }

    pub fn kind(&self) -> MessageType {
        match self {
            Self::StampedImage(_) => MessageType::StampedImage,
            Self::PointCloudSoup(_) => MessageType::PointCloudSoup,
            Self::CameraParameterRequest(_) => MessageType::CameraParameterRequest,
            Self::CameraParameterResponse(_) => MessageType::CameraParameterResponse,
            Self::PointCloud(_) => MessageType::PointCloud,
            Self::PointCloudRgb(_) => MessageType::PointCloudRgb,
            Self::SetBoolRequest(_) => MessageType::SetBoolRequest,
            Self::SetBoolResponse(_) => MessageType::SetBoolResponse,
            Self::ObstacleData(_) => MessageType::ObstacleData,
            Self::QaFindings(_) => MessageType::QaFindings,
            Self::NavigationData(_) => MessageType::NavigationData,
            Self::VelocityData(_) => MessageType::VelocityData,
            Self::OccupancyObstacleData(_) => MessageType::OccupancyObstacleData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Frame id for the families that carry one
    pub fn frame_id(&self) -> Option<u64> {
        match self {
            Self::StampedImage(m) => Some(m.header.frame_id),
            Self::PointCloudSoup(m) => Some(m.frame_id),
            Self::PointCloud(m) => Some(m.frame_id),
            Self::PointCloudRgb(m) => Some(m.frame_id),
            Self::ObstacleData(m) => Some(m.frame_id),
            Self::QaFindings(m) => Some(m.frame_id),
            Self::OccupancyObstacleData(m) => Some(m.frame_id),
            _ => None,
        }
    }

    /// One-line description for diagnostic output
    pub fn summary(&self) -> String {
        match self {
            Self::StampedImage(m) => format!(
                "{} frame {} t={} {}x{} {} side_channel={}B",
                self.name(),
                m.header.frame_id,
                m.header.time,
                m.header.rows,
                m.header.cols,
                m.header.pixel_type,
                m.side_channel.len()
            ),
            Self::PointCloudSoup(m) => format!(
                "{} frame {} t={} {}x{} baseline={} focal={}",
                self.name(),
                m.frame_id,
                m.time,
                m.rectified.header.rows,
                m.rectified.header.cols,
                m.baseline,
                m.focal_length
            ),
            Self::PointCloud(m) => format!(
                "{} frame {} t={} points={}",
                self.name(),
                m.frame_id,
                m.time,
                m.points.len()
            ),
            Self::PointCloudRgb(m) => format!(
                "{} frame {} t={} points={}",
                self.name(),
                m.frame_id,
                m.time,
                m.points.len()
            ),
            Self::ObstacleData(m) => format!(
                "{} frame {} t={} obstacles={}",
                self.name(),
                m.frame_id,
                m.time,
                m.obstacles.len()
            ),
            Self::OccupancyObstacleData(m) => format!(
                "{} frame {} t={} obstacles={} cells={}",
                self.name(),
                m.frame_id,
                m.time,
                m.obstacles.len(),
                m.obstacles.iter().map(|o| o.cells.len()).sum::<usize>()
            ),
            Self::QaFindings(m) => format!(
                "{} frame {} t={} findings={}",
                self.name(),
                m.frame_id,
                m.time,
                m.findings.len()
            ),
            Self::NavigationData(m) => format!(
                "{} t={} lat={} lon={} fix={}",
                self.name(),
                m.timestamp_ns,
                m.gps.latitude_deg,
                m.gps.longitude_deg,
                m.gps.fix_type
            ),
            Self::VelocityData(m) => format!(
                "{} t={} v=[{}, {}, {}]",
                self.name(),
                m.time,
                m.velocity[0],
                m.velocity[1],
                m.velocity[2]
            ),
            Self::SetBoolRequest(m) => format!("{} {}", self.name(), m.value),
            Self::SetBoolResponse(m) => format!("{} {}", self.name(), m.value),
            Self::CameraParameterRequest(m) => format!("{} {}", self.name(), m.value),
            Self::CameraParameterResponse(m) => format!("{} {}", self.name(), m.value),
        }
    }
}
