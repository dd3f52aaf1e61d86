//! Time-stamped camera frame

use crate::buffers::PooledBuffer;
use crate::error::{DecodeError, Result, SensorWireError};

use super::codec::{checked_payload, ByteReader, ByteWriter};
use super::envelope::{MessageInfo, MessageType, ENVELOPE_SIZE};
use super::pixel::PixelType;
use super::traits::WireMessage;

/// Fixed header region size
pub const IMAGE_HEADER_SIZE: usize = 64;

/// `rows * cols` above this is rejected as implausible
pub const MAX_IMAGE_PIXELS: u64 = 100_000_000;

/// Largest side channel accepted
pub const MAX_SIDE_CHANNEL_BYTES: usize = 1024;

/// Identifier at the start of an extrinsics side channel
pub const EXTRINSICS_ID: [u8; 16] = [
    0x2c, 0x5e, 0x9c, 0x77, 0xa7, 0x30, 0x42, 0xce, 0xac, 0x21, 0xc3, 0x3e, 0x26, 0x79, 0x3b, 0xcb,
];

const EXTRINSICS_LEN: usize = EXTRINSICS_ID.len() + 6 * 8;

/// Hint telling the receiver how to convert the pixels to BGR
///
/// Values other than the three constants are colour conversion codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorConversion(pub u8);

impl ColorConversion {
    pub const BGR2BGR: Self = Self(253);
    pub const INCONVERTIBLE: Self = Self(254);
    pub const UNSPECIFIED: Self = Self(255);

    /// True when the value is a conversion code rather than a marker
    pub fn is_conversion_code(self) -> bool {
        self.0 < Self::BGR2BGR.0
    }
}

impl Default for ColorConversion {
    fn default() -> Self {
        Self::UNSPECIFIED
    }
}

/// Scalar fields of a [`StampedImage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageHeader {
    pub time: u64,
    pub frame_id: u64,
    pub rows: u32,
    pub cols: u32,
    pub pixel_type: PixelType,
    pub color_conversion: ColorConversion,
}

impl ImageHeader {
    /// Pixel payload size implied by the header
    pub fn pixel_bytes(&self) -> Option<usize> {
        let bpp = self.pixel_type.bytes_per_pixel()?;
        (self.rows as usize)
            .checked_mul(self.cols as usize)?
            .checked_mul(bpp)
    }

    /// Encoded size of an image with this header and side channel
    pub fn encoded_len(&self, side_channel_len: usize) -> usize {
        IMAGE_HEADER_SIZE + self.pixel_bytes().unwrap_or(0) + side_channel_len
    }

    fn validate_payload(&self, pixels: &[u8], side_channel: &[u8]) -> Result<()> {
        let expected = self.pixel_bytes().ok_or_else(|| {
            SensorWireError::invalid_parameter(
                "pixel_type",
                format!("unsupported pixel type code {}", self.pixel_type.code()),
            )
        })?;
        if pixels.len() != expected {
            return Err(SensorWireError::invalid_parameter(
                "pixels",
                format!(
                    "{}x{} {} needs {} bytes, got {}",
                    self.rows,
                    self.cols,
                    self.pixel_type,
                    expected,
                    pixels.len()
                ),
            ));
        }
        if side_channel.len() > MAX_SIDE_CHANNEL_BYTES {
            return Err(SensorWireError::invalid_parameter(
                "side_channel",
                format!(
                    "{} bytes exceeds the {} byte limit",
                    side_channel.len(),
                    MAX_SIDE_CHANNEL_BYTES
                ),
            ));
        }
        Ok(())
    }
}

/// Write a complete image (envelope included) from borrowed parts
pub(crate) fn write_image(
    writer: &mut ByteWriter<'_>,
    header: &ImageHeader,
    pixels: &[u8],
    side_channel: &[u8],
) -> Result<()> {
    writer.put_info(MessageInfo::new(MessageType::StampedImage.tag()))?;
    write_image_body(writer, header, pixels, side_channel)
}

fn write_image_body(
    writer: &mut ByteWriter<'_>,
    header: &ImageHeader,
    pixels: &[u8],
    side_channel: &[u8],
) -> Result<()> {
    header.validate_payload(pixels, side_channel)?;

    let start = writer.position() - ENVELOPE_SIZE;
    writer.put_u64(header.time)?;
    writer.put_u64(header.frame_id)?;
    writer.put_u32(header.rows)?;
    writer.put_u32(header.cols)?;
    writer.put_u32(header.pixel_type.code())?;
    writer.put_u8(header.color_conversion.0)?;
    writer.put_u8(0)?;
    writer.put_u16(side_channel.len() as u16)?;
    writer.pad_to(start + IMAGE_HEADER_SIZE)?;
    writer.put_bytes(pixels)?;
    writer.put_bytes(side_channel)
}

/// A camera frame with optional side channel bytes
///
/// Layout: 64-byte header (`time @4`, `frame_id @12`, `rows @20`,
/// `cols @24`, `pixel_type @28`, `color_conversion @32`,
/// `side_channel_len @34`), pixels, side channel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StampedImage {
    pub header: ImageHeader,
    pub pixels: Vec<u8>,
    pub side_channel: Vec<u8>,
}

impl StampedImage {
    pub fn new(header: ImageHeader, pixels: Vec<u8>) -> Self {
        Self {
            header,
            pixels,
            side_channel: Vec::new(),
        }
    }

    /// Attach side channel bytes
    pub fn with_side_channel(mut self, side_channel: Vec<u8>) -> Self {
        self.side_channel = side_channel;
        self
    }

    /// Encode straight from borrowed pixel memory into a pooled buffer
    ///
    /// Avoids building an owned [`StampedImage`] when the pixels already
    /// live in a camera or codec buffer.
    pub fn encode_parts(
        buffer: &mut PooledBuffer,
        header: &ImageHeader,
        pixels: &[u8],
        side_channel: &[u8],
    ) -> Result<usize> {
        let len = header.encoded_len(side_channel.len());
        buffer.clear();
        buffer.resize(len);
        let mut writer = ByteWriter::new(buffer.as_mut_slice());
        write_image(&mut writer, header, pixels, side_channel)?;
        Ok(writer.position())
    }

    /// Decoded extrinsics, if the side channel carries them
    pub fn extrinsics(&self) -> Option<Extrinsics> {
        Extrinsics::from_side_channel(&self.side_channel)
    }
}

impl WireMessage for StampedImage {
    const KIND: MessageType = MessageType::StampedImage;

    fn encoded_len(&self) -> usize {
        IMAGE_HEADER_SIZE + self.pixels.len() + self.side_channel.len()
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
        write_image_body(writer, &self.header, &self.pixels, &self.side_channel)
    }

    fn read_body(
        reader: &mut ByteReader<'_>,
        _info: &MessageInfo,
    ) -> std::result::Result<Self, DecodeError> {
        let start = reader.position() - ENVELOPE_SIZE;
        let time = reader.get_u64()?;
        let frame_id = reader.get_u64()?;
        let rows = reader.get_u32()?;
        let cols = reader.get_u32()?;
        let pixel_type = PixelType(reader.get_u32()?);
        let color_conversion = ColorConversion(reader.get_u8()?);
        reader.advance(1)?;
        let side_channel_len = reader.get_u16()? as usize;
        reader.skip_to(start + IMAGE_HEADER_SIZE)?;

        let pixel_count = rows as u64 * cols as u64;
        if pixel_count > MAX_IMAGE_PIXELS {
            return Err(DecodeError::ImplausibleSize {
                message: "StampedImage",
                field: "rows*cols",
                value: pixel_count,
                limit: MAX_IMAGE_PIXELS,
            });
        }
        if side_channel_len > MAX_SIDE_CHANNEL_BYTES {
            return Err(DecodeError::ImplausibleSize {
                message: "StampedImage",
                field: "side_channel_len",
                value: side_channel_len as u64,
                limit: MAX_SIDE_CHANNEL_BYTES as u64,
            });
        }
        let bpp = pixel_type
            .bytes_per_pixel()
            .ok_or(DecodeError::UnknownPixelType(pixel_type.code()))?;
        let pixel_bytes = checked_payload("StampedImage", "rows*cols", pixel_count, bpp)?;
        reader.require(pixel_bytes + side_channel_len)?;

        let pixels = reader.get_bytes(pixel_bytes)?.to_vec();
        let side_channel = reader.get_bytes(side_channel_len)?.to_vec();

        Ok(Self {
            header: ImageHeader {
                time,
                frame_id,
                rows,
                cols,
                pixel_type,
                color_conversion,
            },
            pixels,
            side_channel,
        })
    }

    fn is_empty(&self) -> bool {
        self.header.rows == 0 || self.header.cols == 0
    }
}

/// Camera pose carried in an image side channel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extrinsics {
    pub euler_x_deg: f64,
    pub euler_y_deg: f64,
    pub euler_z_deg: f64,
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
}

impl Extrinsics {
    /// Side channel bytes: identifier then six little-endian `f64`
    pub fn to_side_channel(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(EXTRINSICS_LEN);
        bytes.extend_from_slice(&EXTRINSICS_ID);
        for value in [
            self.euler_x_deg,
            self.euler_y_deg,
            self.euler_z_deg,
            self.tx,
            self.ty,
            self.tz,
        ] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// Recognise an extrinsics side channel
    pub fn from_side_channel(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != EXTRINSICS_LEN || bytes[..EXTRINSICS_ID.len()] != EXTRINSICS_ID {
            return None;
        }
        let mut reader = ByteReader::new(&bytes[EXTRINSICS_ID.len()..], "Extrinsics");
        Some(Self {
            euler_x_deg: reader.get_f64().ok()?,
            euler_y_deg: reader.get_f64().ok()?,
            euler_z_deg: reader.get_f64().ok()?,
            tx: reader.get_f64().ok()?,
            ty: reader.get_f64().ok()?,
            tz: reader.get_f64().ok()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(rows: u32, cols: u32, pixel_type: PixelType) -> ImageHeader {
        ImageHeader {
            time: 1000,
            frame_id: 42,
            rows,
            cols,
            pixel_type,
            color_conversion: ColorConversion::BGR2BGR,
        }
    }

    #[test]
    fn test_header_offsets() {
        let image = StampedImage::new(header(2, 3, PixelType::CV_8UC1), vec![1, 2, 3, 4, 5, 6])
            .with_side_channel(vec![9, 9]);
        let bytes = image.to_bytes().unwrap();

        assert_eq!(bytes.len(), IMAGE_HEADER_SIZE + 6 + 2);
        assert_eq!(&bytes[0..4], &[0, 0, 0, 1]);
        assert_eq!(u64::from_le_bytes(bytes[4..12].try_into().unwrap()), 1000);
        assert_eq!(u64::from_le_bytes(bytes[12..20].try_into().unwrap()), 42);
        assert_eq!(u32::from_le_bytes(bytes[20..24].try_into().unwrap()), 2);
        assert_eq!(u32::from_le_bytes(bytes[24..28].try_into().unwrap()), 3);
        assert_eq!(u32::from_le_bytes(bytes[28..32].try_into().unwrap()), 0);
        assert_eq!(bytes[32], 253);
        assert_eq!(u16::from_le_bytes([bytes[34], bytes[35]]), 2);
        assert!(bytes[36..64].iter().all(|&b| b == 0));
        assert_eq!(&bytes[64..70], &[1, 2, 3, 4, 5, 6]);
        assert_eq!(&bytes[70..], &[9, 9]);
    }

    #[test]
    fn test_encode_rejects_wrong_pixel_count() {
        let image = StampedImage::new(header(2, 2, PixelType::CV_8UC3), vec![0; 5]);
        assert!(matches!(
            image.to_bytes(),
            Err(SensorWireError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_oversized_side_channel_rejected() {
        let mut bytes = StampedImage::new(header(1, 1, PixelType::CV_8UC1), vec![0])
            .to_bytes()
            .unwrap();
        bytes[34..36].copy_from_slice(&2000u16.to_le_bytes());
        assert!(matches!(
            StampedImage::decode(&bytes),
            Err(DecodeError::ImplausibleSize { field: "side_channel_len", .. })
        ));
    }

    #[test]
    fn test_unknown_pixel_type_rejected() {
        let mut bytes = StampedImage::new(header(1, 1, PixelType::CV_8UC1), vec![0])
            .to_bytes()
            .unwrap();
        bytes[28..32].copy_from_slice(&(1u32 << 20).to_le_bytes());
        assert_eq!(
            StampedImage::decode(&bytes),
            Err(DecodeError::UnknownPixelType(1 << 20))
        );
    }

    #[test]
    fn test_extrinsics_side_channel() {
        let pose = Extrinsics {
            euler_x_deg: 1.5,
            euler_y_deg: -2.0,
            euler_z_deg: 0.25,
            tx: 0.1,
            ty: 0.2,
            tz: 0.3,
        };
        let image = StampedImage::new(header(1, 1, PixelType::CV_8UC1), vec![7])
            .with_side_channel(pose.to_side_channel());
        let decoded = StampedImage::decode(&image.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.extrinsics(), Some(pose));
        assert_eq!(Extrinsics::from_side_channel(b"not extrinsics"), None);
    }
}
