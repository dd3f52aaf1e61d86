//! Ego velocity with the rotation into the raw camera frame

use crate::error::{DecodeError, Result};

use super::codec::{ByteReader, ByteWriter};
use super::envelope::{MessageInfo, MessageType};
use super::traits::WireMessage;

/// Encoded size, envelope included
pub const VELOCITY_SIZE: usize = 60;

/// Row-major 3x3 identity
pub const IDENTITY_3X3: [f32; 9] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// Velocity in the odometry frame (m/s)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityData {
    /// Nanoseconds
    pub time: u64,
    pub velocity: [f32; 3],
    /// Odometry frame to raw camera frame, row-major
    pub rotation_to_raw_camera: [f32; 9],
}

impl Default for VelocityData {
    fn default() -> Self {
        Self {
            time: 0,
            velocity: [0.0; 3],
            rotation_to_raw_camera: IDENTITY_3X3,
        }
    }
}

impl WireMessage for VelocityData {
    const KIND: MessageType = MessageType::VelocityData;

    fn encoded_len(&self) -> usize {
        VELOCITY_SIZE
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
        writer.put_u64(self.time)?;
        writer.put_f32s(&self.velocity)?;
        writer.put_f32s(&self.rotation_to_raw_camera)
    }

    fn read_body(
        reader: &mut ByteReader<'_>,
        _info: &MessageInfo,
    ) -> std::result::Result<Self, DecodeError> {
        Ok(Self {
            time: reader.get_u64()?,
            velocity: reader.get_f32_array()?,
            rotation_to_raw_camera: reader.get_f32_array()?,
        })
    }

    fn is_empty(&self) -> bool {
        self.time == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_layout() {
        let velocity = VelocityData {
            time: 99,
            velocity: [1.0, 2.0, 3.0],
            ..Default::default()
        };
        let bytes = velocity.to_bytes().unwrap();
        assert_eq!(bytes.len(), VELOCITY_SIZE);
        assert_eq!(&bytes[0..2], &11u16.to_le_bytes());
        assert_eq!(&bytes[12..16], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[24..28], &1.0f32.to_le_bytes());
        assert_eq!(VelocityData::decode(&bytes).unwrap(), velocity);
    }
}
