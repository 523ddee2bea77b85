//! On-disk envelope for stored session files
//!
//! Layout (all integers little endian):
//!
//! ```text
//! +-------+---------+------+-------+-------------+---------+
//! | magic | version | kind | crc32 | payload len | payload |
//! |  4 B  |   1 B   | 1 B  |  4 B  |     4 B     |   ...   |
//! +-------+---------+------+-------+-------------+---------+
//! ```
//!
//! The payload is bincode. The checksum covers the payload only.

use serde::{de::DeserializeOwned, Serialize};

pub const MAGIC: [u8; 4] = *b"RSTR";
pub const FORMAT_VERSION: u8 = 1;
pub const HEADER_LEN: usize = 14;

/// What a stored file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FileKind {
    Locale = 1,
    Roster = 2,
}

impl FileKind {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(FileKind::Locale),
            2 => Some(FileKind::Roster),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("File too short: {len} bytes")]
    TooShort { len: usize },
    #[error("Bad magic bytes")]
    BadMagic,
    #[error("Unsupported format version {0}")]
    UnsupportedVersion(u8),
    #[error("Expected {expected:?} file, found kind {actual}")]
    WrongKind { expected: FileKind, actual: u8 },
    #[error("Payload length mismatch: header says {declared}, found {actual}")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("Checksum mismatch: expected {expected:08x}, computed {actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(usize),
    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}

/// Serialize `value` and wrap it in an envelope
pub fn encode<T: Serialize + ?Sized>(kind: FileKind, value: &T) -> Result<Vec<u8>, EnvelopeError> {
    let payload = bincode::serialize(value)?;
    let len = u32::try_from(payload.len()).map_err(|_| EnvelopeError::PayloadTooLarge(payload.len()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&MAGIC);
    out.push(FORMAT_VERSION);
    out.push(kind as u8);
    out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Validate an envelope and deserialize its payload
pub fn decode<T: DeserializeOwned>(kind: FileKind, bytes: &[u8]) -> Result<T, EnvelopeError> {
    if bytes.len() < HEADER_LEN {
        return Err(EnvelopeError::TooShort { len: bytes.len() });
    }
    if bytes[0..4] != MAGIC {
        return Err(EnvelopeError::BadMagic);
    }
    if bytes[4] != FORMAT_VERSION {
        return Err(EnvelopeError::UnsupportedVersion(bytes[4]));
    }
    if FileKind::from_u8(bytes[5]) != Some(kind) {
        return Err(EnvelopeError::WrongKind {
            expected: kind,
            actual: bytes[5],
        });
    }

    let expected = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
    let declared = u32::from_le_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]) as usize;
    let payload = &bytes[HEADER_LEN..];
    if payload.len() != declared {
        return Err(EnvelopeError::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }

    let actual = crc32fast::hash(payload);
    if actual != expected {
        return Err(EnvelopeError::ChecksumMismatch { expected, actual });
    }

    Ok(bincode::deserialize(payload)?)
}
