//! Tiny request/reply messages

use crate::error::{DecodeError, Result};

use super::codec::{ByteReader, ByteWriter};
use super::envelope::{MessageInfo, MessageType, ENVELOPE_SIZE};
use super::traits::WireMessage;

macro_rules! bool_message {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name {
            pub value: bool,
        }

        impl $name {
            pub fn new(value: bool) -> Self {
                Self { value }
            }
        }

        impl WireMessage for $name {
            const KIND: MessageType = $kind;

            fn encoded_len(&self) -> usize {
                ENVELOPE_SIZE + 1
            }

            fn write_body(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
                writer.put_bool(self.value)
            }

            fn read_body(
                reader: &mut ByteReader<'_>,
                _info: &MessageInfo,
            ) -> std::result::Result<Self, DecodeError> {
                Ok(Self {
                    value: reader.get_bool()?,
                })
            }

            fn is_empty(&self) -> bool {
                false
            }
        }
    };
}

bool_message!(
    /// Switch a boolean feature (recording, waiting) on or off
    SetBoolRequest,
    MessageType::SetBoolRequest
);

bool_message!(
    /// Whether a [`SetBoolRequest`] was applied
    SetBoolResponse,
    MessageType::SetBoolResponse
);

bool_message!(
    /// Whether a [`CameraParameterRequest`] was applied
    CameraParameterResponse,
    MessageType::CameraParameterResponse
);

/// New value for a camera parameter (exposure, gain)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraParameterRequest {
    pub value: f32,
}

impl CameraParameterRequest {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl WireMessage for CameraParameterRequest {
    const KIND: MessageType = MessageType::CameraParameterRequest;

    fn encoded_len(&self) -> usize {
        ENVELOPE_SIZE + 4
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
        writer.put_f32(self.value)
    }

    fn read_body(
        reader: &mut ByteReader<'_>,
        _info: &MessageInfo,
    ) -> std::result::Result<Self, DecodeError> {
        Ok(Self {
            value: reader.get_f32()?,
        })
    }

    fn is_empty(&self) -> bool {
        false
    }
}
