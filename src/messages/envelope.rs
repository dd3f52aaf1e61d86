//! Envelope prefixed to every message: type tag plus format version

use log::debug;

use crate::error::DecodeError;

/// Current major version; readers reject any other value
pub const MAJOR_VERSION: u8 = 0;

/// Current minor version; differences are tolerated
pub const MINOR_VERSION: u8 = 1;

/// Encoded size of [`MessageInfo`]
pub const ENVELOPE_SIZE: usize = 4;

/// Closed set of message families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageType {
    StampedImage = 0,
    PointCloudSoup = 1,
    CameraParameterRequest = 2,
    CameraParameterResponse = 3,
    PointCloud = 4,
    PointCloudRgb = 5,
    SetBoolRequest = 6,
    SetBoolResponse = 7,
    ObstacleData = 8,
    QaFindings = 9,
    NavigationData = 10,
    VelocityData = 11,
    OccupancyObstacleData = 12,
}

impl MessageType {
    /// Wire tag of this family
    pub fn tag(self) -> u16 {
        self as u16
    }

    /// Look up a family by wire tag
    pub fn from_tag(tag: u16) -> Option<Self> {
        Some(match tag {
            0 => Self::StampedImage,
            1 => Self::PointCloudSoup,
            2 => Self::CameraParameterRequest,
            3 => Self::CameraParameterResponse,
            4 => Self::PointCloud,
            5 => Self::PointCloudRgb,
            6 => Self::SetBoolRequest,
            7 => Self::SetBoolResponse,
            8 => Self::ObstacleData,
            9 => Self::QaFindings,
            10 => Self::NavigationData,
            11 => Self::VelocityData,
            12 => Self::OccupancyObstacleData,
            _ => return None,
        })
    }

    /// Get message name for logging
    pub fn name(self) -> &'static str {
        match self {
            Self::StampedImage => "StampedImage",
            Self::PointCloudSoup => "PointCloudSoup",
            Self::CameraParameterRequest => "CameraParameterRequest",
            Self::CameraParameterResponse => "CameraParameterResponse",
            Self::PointCloud => "PointCloud",
            Self::PointCloudRgb => "PointCloudRGB",
            Self::SetBoolRequest => "SetBoolRequest",
            Self::SetBoolResponse => "SetBoolResponse",
            Self::ObstacleData => "ObstacleData",
            Self::QaFindings => "QAFindings",
            Self::NavigationData => "NavigationData",
            Self::VelocityData => "VelocityData",
            Self::OccupancyObstacleData => "OccupancyObstacleData",
        }
    }
}

/// `{type_tag: u16, major_version: u8, minor_version: u8}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageInfo {
    pub message_type: u16,
    pub major_version: u8,
    pub minor_version: u8,
}

impl MessageInfo {
    /// Envelope for `message_type` at the current version
    pub const fn new(message_type: u16) -> Self {
        Self {
            message_type,
            major_version: MAJOR_VERSION,
            minor_version: MINOR_VERSION,
        }
    }

    /// Read the envelope at the start of `bytes` without consuming anything
    pub fn peek(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < ENVELOPE_SIZE {
            return Err(DecodeError::Truncated {
                message: "MessageInfo",
                needed: ENVELOPE_SIZE,
                available: bytes.len(),
            });
        }
        Ok(Self {
            message_type: u16::from_le_bytes([bytes[0], bytes[1]]),
            major_version: bytes[2],
            minor_version: bytes[3],
        })
    }

    /// Serialize into four bytes
    pub fn to_bytes(self) -> [u8; ENVELOPE_SIZE] {
        let tag = self.message_type.to_le_bytes();
        [tag[0], tag[1], self.major_version, self.minor_version]
    }

    /// Family named by the tag, if it is one we know
    pub fn kind(&self) -> Option<MessageType> {
        MessageType::from_tag(self.message_type)
    }

    /// Check this received envelope against what the reader expects
    ///
    /// Type tag and major version must match; a minor version difference
    /// is only noted.
    pub fn check(&self, expected: MessageType) -> Result<(), DecodeError> {
        if self.message_type != expected.tag() {
            return Err(DecodeError::WrongMessageType {
                expected: expected.name(),
                actual: self.message_type,
            });
        }
        if self.major_version != MAJOR_VERSION {
            return Err(DecodeError::MajorVersionMismatch {
                message: expected.name(),
                expected: MAJOR_VERSION,
                actual: self.major_version,
            });
        }
        if self.minor_version != MINOR_VERSION {
            debug!(
                "{} message minor versions differ: {} != {}",
                expected.name(),
                self.minor_version,
                MINOR_VERSION
            );
        }
        Ok(())
    }

    /// True when the sender may append fields we do not know about
    pub fn is_newer_minor(&self) -> bool {
        self.minor_version > MINOR_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_layout() {
        let info = MessageInfo::new(MessageType::ObstacleData.tag());
        assert_eq!(info.to_bytes(), [8, 0, MAJOR_VERSION, MINOR_VERSION]);
        assert_eq!(MessageInfo::peek(&info.to_bytes()).unwrap(), info);
    }

    #[test]
    fn test_check_rejects_type_and_major() {
        let info = MessageInfo::new(MessageType::PointCloud.tag());
        assert!(info.check(MessageType::PointCloud).is_ok());
        assert!(matches!(
            info.check(MessageType::StampedImage),
            Err(DecodeError::WrongMessageType { actual: 4, .. })
        ));

        let newer_major = MessageInfo {
            major_version: MAJOR_VERSION + 1,
            ..info
        };
        assert!(matches!(
            newer_major.check(MessageType::PointCloud),
            Err(DecodeError::MajorVersionMismatch { .. })
        ));

        let newer_minor = MessageInfo {
            minor_version: MINOR_VERSION + 1,
            ..info
        };
        assert!(newer_minor.check(MessageType::PointCloud).is_ok());
        assert!(newer_minor.is_newer_minor());
    }

    #[test]
    fn test_tag_table_is_closed() {
        for tag in 0..=12u16 {
            let kind = MessageType::from_tag(tag).unwrap();
            assert_eq!(kind.tag(), tag);
        }
        assert_eq!(MessageType::from_tag(13), None);
    }

    #[test]
    fn test_peek_short_input() {
        assert!(matches!(
            MessageInfo::peek(&[0, 0]),
            Err(DecodeError::Truncated { needed: 4, available: 2, .. })
        ));
    }
}
