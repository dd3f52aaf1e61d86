//! Obstacle lists in the ground plane
//!
//! Coordinates are `{x, z}` pairs in the camera frame; `y` (height) is
//! dropped because obstacles are projected onto the ground.

use crate::error::{DecodeError, Result, SensorWireError};

use super::codec::{checked_payload, ByteReader, ByteWriter};
use super::envelope::{MessageInfo, MessageType};
use super::traits::WireMessage;

/// Fixed header region size for both obstacle families
pub const OBSTACLE_HEADER_SIZE: usize = 512;

/// Bytes per obstacle record: four corners and a velocity
pub const OBSTACLE_BYTES: usize = 40;

/// Largest per-obstacle occupied cell list accepted
pub const MAX_OCCUPANCY_CELLS: usize = 4096;

const VEC2_BYTES: usize = 8;

/// Ground-plane vector
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub z: f32,
}

impl Vec2 {
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    fn write(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
        writer.put_f32(self.x)?;
        writer.put_f32(self.z)
    }

    fn read(reader: &mut ByteReader<'_>) -> std::result::Result<Self, DecodeError> {
        let [x, z] = reader.get_f32_array::<2>()?;
        Ok(Self { x, z })
    }
}

/// Bounding polygon and ground velocity of one obstacle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Obstacle {
    pub bounding_box: [Vec2; 4],
    pub velocity: Vec2,
}

impl Obstacle {
    fn write(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
        for corner in &self.bounding_box {
            corner.write(writer)?;
        }
        self.velocity.write(writer)
    }

    fn read(reader: &mut ByteReader<'_>) -> std::result::Result<Self, DecodeError> {
        let mut bounding_box = [Vec2::default(); 4];
        for corner in bounding_box.iter_mut() {
            *corner = Vec2::read(reader)?;
        }
        Ok(Self {
            bounding_box,
            velocity: Vec2::read(reader)?,
        })
    }
}

fn write_header(writer: &mut ByteWriter<'_>, time: u64, frame_id: u64, count: usize) -> Result<()> {
    writer.put_u64(time)?;
    writer.put_u64(frame_id)?;
    writer.put_u64(count as u64)?;
    writer.pad_to(OBSTACLE_HEADER_SIZE)
}

fn read_header(
    reader: &mut ByteReader<'_>,
    message: &'static str,
) -> std::result::Result<(u64, u64, u64), DecodeError> {
    let time = reader.get_u64()?;
    let frame_id = reader.get_u64()?;
    let count = reader.get_u64()?;
    reader.skip_to(OBSTACLE_HEADER_SIZE)?;
    // Every record is at least OBSTACLE_BYTES long
    let minimum = checked_payload(message, "obstacle_count", count, OBSTACLE_BYTES)?;
    reader.require(minimum)?;
    Ok((time, frame_id, count))
}

/// Obstacles detected in one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObstacleData {
    pub time: u64,
    pub frame_id: u64,
    pub obstacles: Vec<Obstacle>,
}

impl WireMessage for ObstacleData {
    const KIND: MessageType = MessageType::ObstacleData;

    fn encoded_len(&self) -> usize {
        OBSTACLE_HEADER_SIZE + self.obstacles.len() * OBSTACLE_BYTES
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
        write_header(writer, self.time, self.frame_id, self.obstacles.len())?;
        self.obstacles
            .iter()
            .try_for_each(|obstacle| obstacle.write(writer))
    }

    fn read_body(
        reader: &mut ByteReader<'_>,
        _info: &MessageInfo,
    ) -> std::result::Result<Self, DecodeError> {
        let (time, frame_id, count) = read_header(reader, Self::name())?;
        let obstacles = (0..count)
            .map(|_| Obstacle::read(reader))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            time,
            frame_id,
            obstacles,
        })
    }

    fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

/// An obstacle together with the grid cells it occupies
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OccupancyObstacle {
    pub obstacle: Obstacle,
    pub cells: Vec<Vec2>,
}

/// Obstacles with per-obstacle occupancy cell lists
///
/// Each record is the 40-byte obstacle, a `u32` cell count, then the cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OccupancyObstacleData {
    pub time: u64,
    pub frame_id: u64,
    pub obstacles: Vec<OccupancyObstacle>,
}

impl WireMessage for OccupancyObstacleData {
    const KIND: MessageType = MessageType::OccupancyObstacleData;

    fn encoded_len(&self) -> usize {
        OBSTACLE_HEADER_SIZE
            + self
                .obstacles
                .iter()
                .map(|entry| OBSTACLE_BYTES + 4 + entry.cells.len() * VEC2_BYTES)
                .sum::<usize>()
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
        write_header(writer, self.time, self.frame_id, self.obstacles.len())?;
        for entry in &self.obstacles {
            if entry.cells.len() > MAX_OCCUPANCY_CELLS {
                return Err(SensorWireError::invalid_parameter(
                    "cells",
                    format!(
                        "{} cells exceeds the {} cell limit",
                        entry.cells.len(),
                        MAX_OCCUPANCY_CELLS
                    ),
                ));
            }
            entry.obstacle.write(writer)?;
            writer.put_u32(entry.cells.len() as u32)?;
            for cell in &entry.cells {
                cell.write(writer)?;
            }
        }
        Ok(())
    }

    fn read_body(
        reader: &mut ByteReader<'_>,
        _info: &MessageInfo,
    ) -> std::result::Result<Self, DecodeError> {
        let (time, frame_id, count) = read_header(reader, Self::name())?;

        let mut obstacles = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let obstacle = Obstacle::read(reader)?;
            let cell_count = reader.get_u32()? as usize;
            if cell_count > MAX_OCCUPANCY_CELLS {
                return Err(DecodeError::ImplausibleSize {
                    message: Self::name(),
                    field: "cell_count",
                    value: cell_count as u64,
                    limit: MAX_OCCUPANCY_CELLS as u64,
                });
            }
            reader.require(cell_count * VEC2_BYTES)?;
            let cells = (0..cell_count)
                .map(|_| Vec2::read(reader))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            obstacles.push(OccupancyObstacle { obstacle, cells });
        }

        Ok(Self {
            time,
            frame_id,
            obstacles,
        })
    }

    fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(offset: f32) -> Obstacle {
        Obstacle {
            bounding_box: [
                Vec2::new(offset, 10.0),
                Vec2::new(offset + 1.0, 10.0),
                Vec2::new(offset + 1.0, 11.0),
                Vec2::new(offset, 11.0),
            ],
            velocity: Vec2::new(0.0, -1.5),
        }
    }

    #[test]
    fn test_obstacle_record_layout() {
        let data = ObstacleData {
            time: 3,
            frame_id: 4,
            obstacles: vec![square(0.0), square(2.0)],
        };
        let bytes = data.to_bytes().unwrap();
        assert_eq!(bytes.len(), OBSTACLE_HEADER_SIZE + 2 * OBSTACLE_BYTES);
        // Second record, first corner x
        assert_eq!(&bytes[552..556], &2.0f32.to_le_bytes());
        assert_eq!(ObstacleData::decode(&bytes).unwrap(), data);
    }

    #[test]
    fn test_occupancy_round_trip() {
        let data = OccupancyObstacleData {
            time: 9,
            frame_id: 10,
            obstacles: vec![
                OccupancyObstacle {
                    obstacle: square(1.0),
                    cells: vec![Vec2::new(1.0, 10.0), Vec2::new(1.5, 10.5)],
                },
                OccupancyObstacle {
                    obstacle: square(5.0),
                    cells: Vec::new(),
                },
            ],
        };
        let bytes = data.to_bytes().unwrap();
        assert_eq!(bytes.len(), data.encoded_len());
        assert_eq!(OccupancyObstacleData::decode(&bytes).unwrap(), data);
    }

    #[test]
    fn test_occupancy_cell_count_bounded() {
        let data = OccupancyObstacleData {
            time: 1,
            frame_id: 1,
            obstacles: vec![OccupancyObstacle {
                obstacle: square(0.0),
                cells: vec![Vec2::default()],
            }],
        };
        let mut bytes = data.to_bytes().unwrap();
        let count_at = OBSTACLE_HEADER_SIZE + OBSTACLE_BYTES;
        bytes[count_at..count_at + 4].copy_from_slice(&5000u32.to_le_bytes());
        assert!(matches!(
            OccupancyObstacleData::decode(&bytes),
            Err(DecodeError::ImplausibleSize { field: "cell_count", .. })
        ));
    }

    #[test]
    fn test_obstacle_count_beyond_payload() {
        let mut bytes = ObstacleData::default().to_bytes().unwrap();
        bytes[20..28].copy_from_slice(&1u64.to_le_bytes());
        assert!(matches!(
            ObstacleData::decode(&bytes),
            Err(DecodeError::Truncated { .. })
        ));
        assert!(ObstacleData::decode_lossy(&bytes).is_empty());
    }
}
