//! Positional little-endian field readers and writers
//!
//! Every message is a fixed sequence of fields at fixed offsets. All
//! multi-byte values are little-endian regardless of the host.

use crate::error::{DecodeError, Result, SensorWireError};

use super::envelope::{MessageInfo, ENVELOPE_SIZE};

macro_rules! put_le {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(&mut self, value: $ty) -> Result<()> {
                self.put_bytes(&value.to_le_bytes())
            }
        )*
    };
}

macro_rules! get_le {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(&mut self) -> std::result::Result<$ty, DecodeError> {
                const LEN: usize = std::mem::size_of::<$ty>();
                let mut raw = [0u8; LEN];
                raw.copy_from_slice(self.get_bytes(LEN)?);
                Ok(<$ty>::from_le_bytes(raw))
            }
        )*
    };
}

/// Cursor writing fields into a caller-supplied region
#[derive(Debug)]
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    /// Start writing at offset 0 of `buf`
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Space left in the region
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn claim(&mut self, len: usize) -> Result<&mut [u8]> {
        if len > self.remaining() {
            return Err(SensorWireError::insufficient_space(len, self.remaining()));
        }
        let start = self.pos;
        self.pos += len;
        Ok(&mut self.buf[start..start + len])
    }

    /// Copy raw bytes
    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.claim(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Write `len` zero bytes
    pub fn put_zeros(&mut self, len: usize) -> Result<()> {
        self.claim(len)?.fill(0);
        Ok(())
    }

    /// Zero-fill up to absolute `offset` (end of a fixed header region)
    pub fn pad_to(&mut self, offset: usize) -> Result<()> {
        if offset < self.pos {
            return Err(SensorWireError::invalid_parameter(
                "offset",
                format!("header fields overrun the {}-byte header region", offset),
            ));
        }
        self.put_zeros(offset - self.pos)
    }

    /// Write the four envelope bytes
    pub fn put_info(&mut self, info: MessageInfo) -> Result<()> {
        self.put_bytes(&info.to_bytes())
    }

    pub fn put_u8(&mut self, value: u8) -> Result<()> {
        self.put_bytes(&[value])
    }

    pub fn put_bool(&mut self, value: bool) -> Result<()> {
        self.put_u8(value as u8)
    }

    put_le! {
        put_u16: u16,
        put_u32: u32,
        put_u64: u64,
        put_i32: i32,
        put_f32: f32,
        put_f64: f64,
    }

    /// Write consecutive `f32` values
    pub fn put_f32s(&mut self, values: &[f32]) -> Result<()> {
        let out = self.claim(values.len() * 4)?;
        for (chunk, value) in out.chunks_exact_mut(4).zip(values) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        Ok(())
    }
}

/// Cursor reading fields from received bytes
///
/// Every read is bounds-checked; running out of input yields
/// [`DecodeError::Truncated`] naming the message being decoded.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
    message: &'static str,
}

impl<'a> ByteReader<'a> {
    /// Start reading at offset 0 of `buf`
    pub fn new(buf: &'a [u8], message: &'static str) -> Self {
        Self {
            buf,
            pos: 0,
            message,
        }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Unread input
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn truncated(&self, needed: usize) -> DecodeError {
        DecodeError::Truncated {
            message: self.message,
            needed: self.pos.saturating_add(needed),
            available: self.buf.len(),
        }
    }

    /// Fail unless at least `len` more bytes are present
    pub fn require(&self, len: usize) -> std::result::Result<(), DecodeError> {
        if len > self.remaining() {
            return Err(self.truncated(len));
        }
        Ok(())
    }

    /// Borrow the next `len` bytes
    pub fn get_bytes(&mut self, len: usize) -> std::result::Result<&'a [u8], DecodeError> {
        self.require(len)?;
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..start + len])
    }

    /// Skip `len` bytes
    pub fn advance(&mut self, len: usize) -> std::result::Result<(), DecodeError> {
        self.get_bytes(len).map(|_| ())
    }

    /// Jump to absolute `offset` (end of a fixed header region)
    pub fn skip_to(&mut self, offset: usize) -> std::result::Result<(), DecodeError> {
        if offset < self.pos {
            return Ok(());
        }
        self.advance(offset - self.pos)
    }

    /// Read the envelope
    pub fn get_info(&mut self) -> std::result::Result<MessageInfo, DecodeError> {
        let info = MessageInfo::peek(self.rest()).map_err(|_| self.truncated(ENVELOPE_SIZE))?;
        self.pos += ENVELOPE_SIZE;
        Ok(info)
    }

    pub fn get_u8(&mut self) -> std::result::Result<u8, DecodeError> {
        Ok(self.get_bytes(1)?[0])
    }

    pub fn get_bool(&mut self) -> std::result::Result<bool, DecodeError> {
        Ok(self.get_u8()? != 0)
    }

    get_le! {
        get_u16: u16,
        get_u32: u32,
        get_u64: u64,
        get_i32: i32,
        get_f32: f32,
        get_f64: f64,
    }

    /// Read `N` consecutive `f32` values
    pub fn get_f32_array<const N: usize>(&mut self) -> std::result::Result<[f32; N], DecodeError> {
        let mut out = [0f32; N];
        for value in out.iter_mut() {
            *value = self.get_f32()?;
        }
        Ok(out)
    }
}

/// `count * unit` with overflow treated as an implausible declaration
pub(crate) fn checked_payload(
    message: &'static str,
    field: &'static str,
    count: u64,
    unit: usize,
) -> std::result::Result<usize, DecodeError> {
    count
        .checked_mul(unit as u64)
        .and_then(|bytes| usize::try_from(bytes).ok())
        .ok_or(DecodeError::ImplausibleSize {
            message,
            field,
            value: count,
            limit: usize::MAX as u64 / unit.max(1) as u64,
        })
}
