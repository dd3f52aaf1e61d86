//! Quality-assurance findings raised by the processing pipeline

use std::fmt;

use log::warn;

use crate::error::{DecodeError, Result};

use super::codec::{checked_payload, ByteReader, ByteWriter};
use super::envelope::{MessageInfo, MessageType};
use super::traits::WireMessage;

/// Fixed header region size
pub const QA_HEADER_SIZE: usize = 64;

/// Bytes per finding record
pub const FINDING_BYTES: usize = 320;

const DOMAIN_CAP: usize = 32;
const KEY_CAP: usize = 128;
const MESSAGE_CAP: usize = 128;
const UNIT_CAP: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Severity {
    #[default]
    Info = 0,
    Warning = 1,
    Error = 2,
}

impl Severity {
    fn from_wire(value: u8) -> Self {
        match value {
            0 => Self::Info,
            1 => Self::Warning,
            2 => Self::Error,
            other => {
                warn!("Unknown finding severity {}, treating as info", other);
                Self::Info
            }
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// One measurement with its verdict
///
/// Strings longer than their field are truncated on a character boundary
/// so at least one NUL byte always remains.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Finding {
    /// "image", "system", ...
    pub domain: String,
    pub key: String,
    pub message: String,
    pub unit: String,
    pub value: f64,
    pub severity: Severity,
}

impl Finding {
    pub fn new(
        domain: impl Into<String>,
        key: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            key: key.into(),
            message: message.into(),
            unit: unit.into(),
            value,
            severity,
        }
    }

    fn write(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
        put_fixed_str(writer, &self.domain, DOMAIN_CAP)?;
        put_fixed_str(writer, &self.key, KEY_CAP)?;
        put_fixed_str(writer, &self.message, MESSAGE_CAP)?;
        put_fixed_str(writer, &self.unit, UNIT_CAP)?;
        writer.put_f64(self.value)?;
        writer.put_u8(self.severity as u8)?;
        writer.put_zeros(7)
    }

    fn read(reader: &mut ByteReader<'_>) -> std::result::Result<Self, DecodeError> {
        let domain = get_fixed_str(reader, DOMAIN_CAP)?;
        let key = get_fixed_str(reader, KEY_CAP)?;
        let message = get_fixed_str(reader, MESSAGE_CAP)?;
        let unit = get_fixed_str(reader, UNIT_CAP)?;
        let value = reader.get_f64()?;
        let severity = Severity::from_wire(reader.get_u8()?);
        reader.advance(7)?;
        Ok(Self {
            domain,
            key,
            message,
            unit,
            value,
            severity,
        })
    }
}

fn truncate_to(text: &str, cap: usize) -> &str {
    if text.len() < cap {
        return text;
    }
    let mut end = cap - 1;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn put_fixed_str(writer: &mut ByteWriter<'_>, text: &str, cap: usize) -> Result<()> {
    let text = truncate_to(text, cap);
    writer.put_bytes(text.as_bytes())?;
    writer.put_zeros(cap - text.len())
}

fn get_fixed_str(
    reader: &mut ByteReader<'_>,
    cap: usize,
) -> std::result::Result<String, DecodeError> {
    let raw = reader.get_bytes(cap)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(cap);
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

/// Findings reported for one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QaFindings {
    pub time: u64,
    pub frame_id: u64,
    pub findings: Vec<Finding>,
}

impl WireMessage for QaFindings {
    const KIND: MessageType = MessageType::QaFindings;

    fn encoded_len(&self) -> usize {
        QA_HEADER_SIZE + self.findings.len() * FINDING_BYTES
    }

    fn write_body(&self, writer: &mut ByteWriter<'_>) -> Result<()> {
        writer.put_u64(self.time)?;
        writer.put_u64(self.frame_id)?;
        writer.put_u64(self.findings.len() as u64)?;
        writer.pad_to(QA_HEADER_SIZE)?;
        self.findings
            .iter()
            .try_for_each(|finding| finding.write(writer))
    }

    fn read_body(
        reader: &mut ByteReader<'_>,
        _info: &MessageInfo,
    ) -> std::result::Result<Self, DecodeError> {
        let time = reader.get_u64()?;
        let frame_id = reader.get_u64()?;
        let count = reader.get_u64()?;
        reader.skip_to(QA_HEADER_SIZE)?;
        reader.require(checked_payload(Self::name(), "finding_count", count, FINDING_BYTES)?)?;

        let findings = (0..count)
            .map(|_| Finding::read(reader))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            time,
            frame_id,
            findings,
        })
    }

    fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}
