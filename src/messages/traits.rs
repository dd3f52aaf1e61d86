//! Common framing behaviour shared by every message family

use log::warn;

use crate::buffers::PooledBuffer;
use crate::error::{DecodeError, Result, SensorWireError};

use super::codec::{ByteReader, ByteWriter};
use super::envelope::{MessageInfo, MessageType};

/// A message family with a fixed header and a derived-length payload
///
/// Implementors describe only their body; the envelope, the size checks
/// and the fail-soft path are provided here.
pub trait WireMessage: Sized + Default {
    /// Family tag written into the envelope
    const KIND: MessageType;

    /// Total encoded size including the envelope
    fn encoded_len(&self) -> usize;

    /// Write every field after the envelope
    fn write_body(&self, writer: &mut ByteWriter<'_>) -> Result<()>;

    /// Read every field after an envelope that already passed [`MessageInfo::check`]
    fn read_body(
        reader: &mut ByteReader<'_>,
        info: &MessageInfo,
    ) -> std::result::Result<Self, DecodeError>;

    /// True for the default value returned by a rejected decode
    fn is_empty(&self) -> bool;

    /// Family name for diagnostics
    fn name() -> &'static str {
        Self::KIND.name()
    }

    /// Encode into the front of `dst`, returning the bytes written
    fn write_to(&self, dst: &mut [u8]) -> Result<usize> {
        let len = self.encoded_len();
        if dst.len() < len {
            return Err(SensorWireError::insufficient_space(len, dst.len()));
        }

        let mut writer = ByteWriter::new(&mut dst[..len]);
        writer.put_info(MessageInfo::new(Self::KIND.tag()))?;
        self.write_body(&mut writer)?;

        if writer.position() != len {
            return Err(SensorWireError::invalid_parameter(
                Self::name(),
                format!(
                    "wrote {} bytes but the layout declares {}",
                    writer.position(),
                    len
                ),
            ));
        }
        Ok(len)
    }

    /// Size `buffer` to this message and encode into it
    fn encode_into(&self, buffer: &mut PooledBuffer) -> Result<usize> {
        buffer.clear();
        buffer.resize(self.encoded_len());
        self.write_to(buffer.as_mut_slice())
    }

    /// Encode into a fresh vector
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; self.encoded_len()];
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Decode one message from the front of `src`
    ///
    /// Returns the message and the number of bytes it occupied. Nothing
    /// past the envelope is read when the envelope is rejected.
    fn decode_prefix(src: &[u8]) -> std::result::Result<(Self, usize), DecodeError> {
        let mut reader = ByteReader::new(src, Self::name());
        let info = reader.get_info()?;
        info.check(Self::KIND)?;
        let message = Self::read_body(&mut reader, &info)?;
        Ok((message, reader.position()))
    }

    /// Decode a buffer holding exactly one message
    ///
    /// Trailing bytes are accepted only from a sender with a newer minor
    /// version.
    fn decode(src: &[u8]) -> std::result::Result<Self, DecodeError> {
        let (message, used) = Self::decode_prefix(src)?;
        if used != src.len() {
            let info = MessageInfo::peek(src)?;
            if !info.is_newer_minor() {
                return Err(DecodeError::SizeMismatch {
                    message: Self::name(),
                    declared: used,
                    available: src.len(),
                });
            }
        }
        Ok(message)
    }

    /// Decode, logging and returning the empty default on any rejection
    fn decode_lossy(src: &[u8]) -> Self {
        match Self::decode(src) {
            Ok(message) => message,
            Err(err) => {
                warn!("Dropping {} message: {}", Self::name(), err);
                Self::default()
            }
        }
    }
}
