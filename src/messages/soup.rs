//! Everything a receiver needs to reproject a disparity map into points

use crate::error::{DecodeError, Result, SensorWireError};

use super::codec::{ByteReader, ByteWriter};
use super::envelope::{MessageInfo, MessageType};
use super::image::{write_image, StampedImage};
use super::traits::WireMessage;

/// Scalar header size: envelope, time, frame_id, baseline, focal length, 4x4
pub const SOUP_HEADER_SIZE: usize = 100;

/// Rectified colour image and disparity map sharing one stereo frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloudSoup {
    pub time: u64,
    pub frame_id: u64,
    pub baseline: f64,
    pub focal_length: f64,
    /// Row-major disparity-to-depth reprojection matrix
    pub disparity_to_depth: [f32; 16],
    pub rectified: StampedImage,
    pub disparity: StampedImage,
}

impl PointCloudSoup {
    /// Bundle two images, stamping them with the soup's time and frame id
    pub fn new(
        time: u64,
        frame_id: u64,
        baseline: f64,
        focal_length: f64,
        disparity_to_depth: [f32; 16],
        mut rectified: StampedImage,
        mut disparity: StampedImage,
    ) -> Self {
        for image in [&mut rectified, &mut disparity] {
            image.header.time = time;
            image.header.frame_id = frame_id;
        }
        Self {
            time,
            frame_id,
            baseline,
            focal_length,
            disparity_to_depth,
            rectified,
            disparity,
        }
    }
}

impl WireMessage for PointCloudSoup {
    const KIND: MessageType = MessageType::PointCloudSoup;

    fn encoded_len(&self) -> usize {
        SOUP_HEADER_SIZE + self.rectified.encoded_len() + self.disparity.encoded_len()
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
        let (rectified, disparity) = (&self.rectified.header, &self.disparity.header);
        if (rectified.rows, rectified.cols) != (disparity.rows, disparity.cols) {
            return Err(SensorWireError::invalid_parameter(
                "disparity",
                format!(
                    "disparity is {}x{} but rectified image is {}x{}",
                    disparity.rows, disparity.cols, rectified.rows, rectified.cols
                ),
            ));
        }

        writer.put_u64(self.time)?;
        writer.put_u64(self.frame_id)?;
        writer.put_f64(self.baseline)?;
        writer.put_f64(self.focal_length)?;
        writer.put_f32s(&self.disparity_to_depth)?;
        for image in [&self.rectified, &self.disparity] {
            write_image(writer, &image.header, &image.pixels, &image.side_channel)?;
        }
        Ok(())
    }

    fn read_body(
        reader: &mut ByteReader<'_>,
        _info: &MessageInfo,
    ) -> std::result::Result<Self, DecodeError> {
        let time = reader.get_u64()?;
        let frame_id = reader.get_u64()?;
        let baseline = reader.get_f64()?;
        let focal_length = reader.get_f64()?;
        let disparity_to_depth = reader.get_f32_array::<16>()?;
        let rectified = read_nested_image(reader)?;
        let disparity = read_nested_image(reader)?;

        let (expected, actual) = (&rectified.header, &disparity.header);
        if (expected.rows, expected.cols) != (actual.rows, actual.cols) {
            return Err(DecodeError::DimensionMismatch {
                message: Self::name(),
                field: "disparity",
                expected_rows: expected.rows,
                expected_cols: expected.cols,
                actual_rows: actual.rows,
                actual_cols: actual.cols,
            });
        }

        Ok(Self {
            time,
            frame_id,
            baseline,
            focal_length,
            disparity_to_depth,
            rectified,
            disparity,
        })
    }

    fn is_empty(&self) -> bool {
        self.rectified.is_empty() || self.disparity.is_empty()
    }
}

fn read_nested_image(reader: &mut ByteReader<'_>) -> std::result::Result<StampedImage, DecodeError> {
    let info = reader.get_info()?;
    info.check(MessageType::StampedImage)?;
    StampedImage::read_body(reader, &info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::image::{ColorConversion, ImageHeader, IMAGE_HEADER_SIZE};
    use crate::messages::pixel::PixelType;

    fn image(rows: u32, cols: u32, pixel_type: PixelType, fill: u8) -> StampedImage {
        let header = ImageHeader {
            rows,
            cols,
            pixel_type,
            color_conversion: ColorConversion::BGR2BGR,
            ..Default::default()
        };
        let len = header.pixel_bytes().unwrap();
        StampedImage::new(header, vec![fill; len])
    }

    fn soup() -> PointCloudSoup {
        let mut q = [0f32; 16];
        q[0] = 1.0;
        q[15] = 0.5;
        PointCloudSoup::new(
            77,
            12,
            0.3,
            1400.0,
            q,
            image(4, 6, PixelType::CV_8UC3, 0x10),
            image(4, 6, PixelType::CV_16SC1, 0x20),
        )
    }

    #[test]
    fn test_soup_stamps_nested_images() {
        let soup = soup();
        assert_eq!(soup.rectified.header.frame_id, 12);
        assert_eq!(soup.disparity.header.time, 77);
    }

    #[test]
    fn test_soup_layout_and_round_trip() {
        let soup = soup();
        let bytes = soup.to_bytes().unwrap();
        assert_eq!(
            bytes.len(),
            SOUP_HEADER_SIZE + 2 * IMAGE_HEADER_SIZE + 4 * 6 * 3 + 4 * 6 * 2
        );
        // The first nested image starts right after the scalar header
        assert_eq!(&bytes[SOUP_HEADER_SIZE..SOUP_HEADER_SIZE + 2], &[0, 0]);
        assert_eq!(PointCloudSoup::decode(&bytes).unwrap(), soup);
    }

    #[test]
    fn test_mismatched_dimensions_rejected() {
        let mut soup = soup();
        soup.disparity = image(4, 5, PixelType::CV_16SC1, 0);
        assert!(soup.to_bytes().is_err());
    }

    #[test]
    fn test_mismatched_dimensions_rejected_on_decode() {
        let rectified = image(4, 6, PixelType::CV_8UC3, 0x10);
        let disparity = image(4, 5, PixelType::CV_16SC1, 0x20);

        // Hand-assemble what a foreign writer could put on the wire
        let mut bytes = soup().to_bytes().unwrap();
        bytes.truncate(SOUP_HEADER_SIZE);
        bytes.extend_from_slice(&rectified.to_bytes().unwrap());
        bytes.extend_from_slice(&disparity.to_bytes().unwrap());

        assert!(matches!(
            PointCloudSoup::decode(&bytes),
            Err(DecodeError::DimensionMismatch {
                actual_rows: 4,
                actual_cols: 5,
                ..
            })
        ));
        assert!(PointCloudSoup::decode_lossy(&bytes).is_empty());
    }

    #[test]
    fn test_corrupt_nested_envelope_rejected() {
        let mut bytes = soup().to_bytes().unwrap();
        bytes[SOUP_HEADER_SIZE] = MessageType::PointCloud.tag() as u8;
        assert!(matches!(
            PointCloudSoup::decode(&bytes),
            Err(DecodeError::WrongMessageType { actual: 4, .. })
        ));
        assert!(PointCloudSoup::decode_lossy(&bytes).is_empty());
    }
}
