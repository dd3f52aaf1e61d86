//! OpenCV-compatible pixel type codes
//!
//! A type code packs the element depth into the low 3 bits and
//! `channels - 1` into the next 9 bits.

use std::fmt;

const DEPTH_BITS: u32 = 3;
const DEPTH_MASK: u32 = (1 << DEPTH_BITS) - 1;
const CHANNEL_MASK: u32 = 511;

/// Image element type as carried in the `pixel_type` header field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelType(pub u32);

impl PixelType {
    pub const DEPTH_8U: u32 = 0;
    pub const DEPTH_8S: u32 = 1;
    pub const DEPTH_16U: u32 = 2;
    pub const DEPTH_16S: u32 = 3;
    pub const DEPTH_32S: u32 = 4;
    pub const DEPTH_32F: u32 = 5;
    pub const DEPTH_64F: u32 = 6;
    pub const DEPTH_16F: u32 = 7;

    pub const CV_8UC1: Self = Self::make(Self::DEPTH_8U, 1);
    pub const CV_8UC3: Self = Self::make(Self::DEPTH_8U, 3);
    pub const CV_8UC4: Self = Self::make(Self::DEPTH_8U, 4);
    pub const CV_8SC1: Self = Self::make(Self::DEPTH_8S, 1);
    pub const CV_16UC1: Self = Self::make(Self::DEPTH_16U, 1);
    pub const CV_16UC3: Self = Self::make(Self::DEPTH_16U, 3);
    pub const CV_16SC1: Self = Self::make(Self::DEPTH_16S, 1);
    pub const CV_32SC1: Self = Self::make(Self::DEPTH_32S, 1);
    pub const CV_32FC1: Self = Self::make(Self::DEPTH_32F, 1);
    pub const CV_32FC3: Self = Self::make(Self::DEPTH_32F, 3);
    pub const CV_64FC1: Self = Self::make(Self::DEPTH_64F, 1);

    /// Build a type code from depth and channel count
    pub const fn make(depth: u32, channels: u32) -> Self {
        Self((depth & DEPTH_MASK) | ((channels - 1) << DEPTH_BITS))
    }

    /// Raw code
    pub fn code(self) -> u32 {
        self.0
    }

    /// Element depth code
    pub fn depth(self) -> u32 {
        self.0 & DEPTH_MASK
    }

    /// Interleaved channels per pixel
    pub fn channels(self) -> u32 {
        ((self.0 >> DEPTH_BITS) & CHANNEL_MASK) + 1
    }

    /// Bytes per channel element, `None` for codes outside the known depths
    pub fn elem_size(self) -> Option<usize> {
        if self.0 >> (DEPTH_BITS + 9) != 0 {
            return None;
        }
        match self.depth() {
            Self::DEPTH_8U | Self::DEPTH_8S => Some(1),
            Self::DEPTH_16U | Self::DEPTH_16S | Self::DEPTH_16F => Some(2),
            Self::DEPTH_32S | Self::DEPTH_32F => Some(4),
            Self::DEPTH_64F => Some(8),
            _ => None,
        }
    }

    /// Bytes per pixel across all channels
    pub fn bytes_per_pixel(self) -> Option<usize> {
        self.elem_size()
            .map(|size| size * self.channels() as usize)
    }
}

impl From<u32> for PixelType {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = match self.depth() {
            Self::DEPTH_8U => "8U",
            Self::DEPTH_8S => "8S",
            Self::DEPTH_16U => "16U",
            Self::DEPTH_16S => "16S",
            Self::DEPTH_32S => "32S",
            Self::DEPTH_32F => "32F",
            Self::DEPTH_64F => "64F",
            _ => "16F",
        };
        write!(f, "CV_{}C{}", depth, self.channels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(PixelType::CV_8UC1.code(), 0);
        assert_eq!(PixelType::CV_8UC3.code(), 16);
        assert_eq!(PixelType::CV_16SC1.code(), 3);
        assert_eq!(PixelType::CV_32FC3.code(), 21);
        assert_eq!(PixelType::CV_64FC1.code(), 6);
    }

    #[test]
    fn test_sizes() {
        assert_eq!(PixelType::CV_8UC3.bytes_per_pixel(), Some(3));
        assert_eq!(PixelType::CV_16UC1.bytes_per_pixel(), Some(2));
        assert_eq!(PixelType::CV_32FC3.bytes_per_pixel(), Some(12));
        assert_eq!(PixelType(1 << 20).elem_size(), None);
        assert_eq!(PixelType::CV_8UC4.to_string(), "CV_8UC4");
    }
}
