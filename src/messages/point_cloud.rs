//! 3-D point clouds, plain and coloured

use crate::buffers::PooledBuffer;
use crate::error::{DecodeError, Result, SensorWireError};

use super::codec::{checked_payload, ByteReader, ByteWriter};
use super::envelope::{MessageInfo, MessageType};
use super::traits::WireMessage;

/// Fixed header region size for both cloud families
pub const POINT_CLOUD_HEADER_SIZE: usize = 512;

const POINT_BYTES: usize = 12;

/// `{x, y, z}` in metres
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// `{r, g, b}` stored as floats, parallel to the point array
pub type Color = Point;

fn write_header(writer: &mut ByteWriter<'_>, time: u64, frame_id: u64, count: usize) -> Result<()> {
    writer.put_u64(time)?;
    writer.put_u64(frame_id)?;
    writer.put_u64(count as u64)?;
    writer.pad_to(POINT_CLOUD_HEADER_SIZE)
}

fn write_points(writer: &mut ByteWriter<'_>, points: &[Point]) -> Result<()> {
    for point in points {
        writer.put_f32(point.x)?;
        writer.put_f32(point.y)?;
        writer.put_f32(point.z)?;
    }
    Ok(())
}

fn read_header(
    reader: &mut ByteReader<'_>,
    message: &'static str,
    arrays: usize,
) -> std::result::Result<(u64, u64, usize), DecodeError> {
    let time = reader.get_u64()?;
    let frame_id = reader.get_u64()?;
    let count = reader.get_u64()?;
    reader.skip_to(POINT_CLOUD_HEADER_SIZE)?;

    let payload = checked_payload(message, "point_count", count, POINT_BYTES * arrays)?;
    reader.require(payload)?;
    Ok((time, frame_id, payload / (POINT_BYTES * arrays)))
}

fn read_points(
    reader: &mut ByteReader<'_>,
    count: usize,
) -> std::result::Result<Vec<Point>, DecodeError> {
    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        let [x, y, z] = reader.get_f32_array::<3>()?;
        points.push(Point { x, y, z });
    }
    Ok(points)
}

/// Encode a cloud from a flat `x y z x y z ...` slice
///
/// Used by producers that already hold the points contiguously.
pub fn encode_flat_points(
    buffer: &mut PooledBuffer,
    time: u64,
    frame_id: u64,
    xyz: &[f32],
) -> Result<usize> {
    if xyz.len() % 3 != 0 {
        return Err(SensorWireError::invalid_parameter(
            "xyz",
            format!("{} floats is not a whole number of points", xyz.len()),
        ));
    }
    let count = xyz.len() / 3;
    let len = POINT_CLOUD_HEADER_SIZE + count * POINT_BYTES;
    buffer.clear();
    buffer.resize(len);

    let mut writer = ByteWriter::new(buffer.as_mut_slice());
    writer.put_info(MessageInfo::new(MessageType::PointCloud.tag()))?;
    write_header(&mut writer, time, frame_id, count)?;
    writer.put_f32s(xyz)?;
    Ok(writer.position())
}

/// Points from one stereo frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloud {
    pub time: u64,
    pub frame_id: u64,
    pub points: Vec<Point>,
}

impl WireMessage for PointCloud {
    const KIND: MessageType = MessageType::PointCloud;

    fn encoded_len(&self) -> usize {
        POINT_CLOUD_HEADER_SIZE + self.points.len() * POINT_BYTES
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
        write_header(writer, self.time, self.frame_id, self.points.len())?;
        write_points(writer, &self.points)
    }

    fn read_body(
        reader: &mut ByteReader<'_>,
        _info: &MessageInfo,
    ) -> std::result::Result<Self, DecodeError> {
        let (time, frame_id, count) = read_header(reader, Self::name(), 1)?;
        Ok(Self {
            time,
            frame_id,
            points: read_points(reader, count)?,
        })
    }

    fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Points plus one colour per point
///
/// The colour array follows the whole point array.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloudRgb {
    pub time: u64,
    pub frame_id: u64,
    pub points: Vec<Point>,
    pub colors: Vec<Color>,
}

impl WireMessage for PointCloudRgb {
    const KIND: MessageType = MessageType::PointCloudRgb;

    fn encoded_len(&self) -> usize {
        POINT_CLOUD_HEADER_SIZE + self.points.len() * POINT_BYTES * 2
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
        if self.points.len() != self.colors.len() {
            return Err(SensorWireError::invalid_parameter(
                "colors",
                format!(
                    "{} colors for {} points",
                    self.colors.len(),
                    self.points.len()
                ),
            ));
        }
        write_header(writer, self.time, self.frame_id, self.points.len())?;
        write_points(writer, &self.points)?;
        write_points(writer, &self.colors)
    }

    fn read_body(
        reader: &mut ByteReader<'_>,
        _info: &MessageInfo,
    ) -> std::result::Result<Self, DecodeError> {
        let (time, frame_id, count) = read_header(reader, Self::name(), 2)?;
        Ok(Self {
            time,
            frame_id,
            points: read_points(reader, count)?,
            colors: read_points(reader, count)?,
        })
    }

    fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
