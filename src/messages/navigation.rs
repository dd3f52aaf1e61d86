//! Fused IMU, GPS and odometry fix

use crate::error::{DecodeError, Result};

use super::codec::{ByteReader, ByteWriter};
use super::envelope::{MessageInfo, MessageType};
use super::traits::WireMessage;

/// Encoded size, envelope included; fields are packed
pub const NAVIGATION_SIZE: usize = 212;

/// Row-major 4x4 identity
pub const IDENTITY_4X4: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Inertial sample in the body frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImuData {
    pub timestamp_ns: u64,
    /// m/s²
    pub acceleration: [f32; 3],
    /// rad/s
    pub gyro: [f32; 3],
    /// gauss
    pub magnetometer: [f32; 3],
    pub temperature_deg_c: f32,
}

/// WGS84 fix
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GpsData {
    pub timestamp_ns: u64,
    pub latitude_deg: f32,
    pub longitude_deg: f32,
    pub altitude_m: f32,
    pub horizontal_uncertainty_m: f32,
    pub vertical_uncertainty_m: f32,
    pub speed_m_s: f32,
    pub course_deg: f32,
    pub fix_type: i32,
    pub num_satellites: i32,
}

/// Dead-reckoning state in the body frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OdometryData {
    pub timestamp_ns: u64,
    pub position_m: [f32; 3],
    pub velocity_m_s: [f32; 3],
    pub angular_velocity_rad_s: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationData {
    pub timestamp_ns: u64,
    pub imu: ImuData,
    pub gps: GpsData,
    pub odom: OdometryData,
    /// Body frame to raw camera frame, row-major
    pub body_to_raw_camera: [f32; 16],
}

impl Default for NavigationData {
    fn default() -> Self {
        Self {
            timestamp_ns: 0,
            imu: ImuData::default(),
            gps: GpsData::default(),
            odom: OdometryData::default(),
            body_to_raw_camera: IDENTITY_4X4,
        }
    }
}

impl WireMessage for NavigationData {
    const KIND: MessageType = MessageType::NavigationData;

    fn encoded_len(&self) -> usize {
        NAVIGATION_SIZE
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
        writer.put_u64(self.timestamp_ns)?;

        let imu = &self.imu;
        writer.put_u64(imu.timestamp_ns)?;
        writer.put_f32s(&imu.acceleration)?;
        writer.put_f32s(&imu.gyro)?;
        writer.put_f32s(&imu.magnetometer)?;
        writer.put_f32(imu.temperature_deg_c)?;

        let gps = &self.gps;
        writer.put_u64(gps.timestamp_ns)?;
        writer.put_f32s(&[
            gps.latitude_deg,
            gps.longitude_deg,
            gps.altitude_m,
            gps.horizontal_uncertainty_m,
            gps.vertical_uncertainty_m,
            gps.speed_m_s,
            gps.course_deg,
        ])?;
        writer.put_i32(gps.fix_type)?;
        writer.put_i32(gps.num_satellites)?;

        let odom = &self.odom;
        writer.put_u64(odom.timestamp_ns)?;
        writer.put_f32s(&odom.position_m)?;
        writer.put_f32s(&odom.velocity_m_s)?;
        writer.put_f32s(&odom.angular_velocity_rad_s)?;

        writer.put_f32s(&self.body_to_raw_camera)
    }

    fn read_body(
        reader: &mut ByteReader<'_>,
        _info: &MessageInfo,
    ) -> std::result::Result<Self, DecodeError> {
        let timestamp_ns = reader.get_u64()?;

        let imu = ImuData {
            timestamp_ns: reader.get_u64()?,
            acceleration: reader.get_f32_array()?,
            gyro: reader.get_f32_array()?,
            magnetometer: reader.get_f32_array()?,
            temperature_deg_c: reader.get_f32()?,
        };

        let gps_timestamp = reader.get_u64()?;
        let [lat, lon, alt, h_unc, v_unc, speed, course] = reader.get_f32_array::<7>()?;
        let gps = GpsData {
            timestamp_ns: gps_timestamp,
            latitude_deg: lat,
            longitude_deg: lon,
            altitude_m: alt,
            horizontal_uncertainty_m: h_unc,
            vertical_uncertainty_m: v_unc,
            speed_m_s: speed,
            course_deg: course,
            fix_type: reader.get_i32()?,
            num_satellites: reader.get_i32()?,
        };

        let odom = OdometryData {
            timestamp_ns: reader.get_u64()?,
            position_m: reader.get_f32_array()?,
            velocity_m_s: reader.get_f32_array()?,
            angular_velocity_rad_s: reader.get_f32_array()?,
        };

        Ok(Self {
            timestamp_ns,
            imu,
            gps,
            odom,
            body_to_raw_camera: reader.get_f32_array()?,
        })
    }

    fn is_empty(&self) -> bool {
        self.timestamp_ns == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_size_and_round_trip() {
        let mut nav = NavigationData {
            timestamp_ns: 123,
            ..Default::default()
        };
        nav.imu.gyro = [0.1, 0.2, 0.3];
        nav.gps.latitude_deg = 52.5;
        nav.gps.fix_type = 3;
        nav.gps.num_satellites = 11;
        nav.odom.velocity_m_s = [1.0, 0.0, -0.5];

        let bytes = nav.to_bytes().unwrap();
        assert_eq!(bytes.len(), NAVIGATION_SIZE);
        // The transform occupies the last 64 bytes
        assert_eq!(&bytes[148..152], &1.0f32.to_le_bytes());
        assert_eq!(NavigationData::decode(&bytes).unwrap(), nav);
    }

    #[test]
    fn test_default_transform_is_identity() {
        let decoded = NavigationData::decode_lossy(&[0u8; 3]);
        assert_eq!(decoded.body_to_raw_camera, IDENTITY_4X4);
        assert!(decoded.is_empty());
    }
}
