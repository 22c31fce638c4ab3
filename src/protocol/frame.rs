//! # Frame Codec
//!
//! Every message exchanged with the printer, in either direction, is wrapped
//! in the same frame:
//!
//! ```text
//! ┌──────┬──────┬────────┬──────┬─────┬──────┬─────────────┬─────┬──────┐
//! │ 0x51 │ 0x78 │ opcode │ 0x00 │ len │ 0x00 │ payload...  │ crc │ 0xFF │
//! └──────┴──────┴────────┴──────┴─────┴──────┴─────────────┴─────┴──────┘
//!   magic (2)     1 byte   rsvd   1 B   rsvd   `len` bytes   1 B   term
//! ```
//!
//! The checksum covers the payload bytes only (see [`super::crc8`]). The
//! length field is a single byte, so payloads are capped at 255 bytes.
//!
//! ## Example
//!
//! ```
//! use catprint::protocol::frame::{self, Frame};
//!
//! let bytes = frame::encode(0xA1, &[0x00, 0x05])?;
//! assert_eq!(bytes, vec![0x51, 0x78, 0xA1, 0x00, 0x02, 0x00, 0x00, 0x05, 0x1B, 0xFF]);
//!
//! let frame = frame::decode(&bytes)?;
//! assert_eq!(frame, Frame { opcode: 0xA1, payload: vec![0x00, 0x05] });
//! # Ok::<(), catprint::CatPrintError>(())
//! ```

use super::crc8::crc8;
use crate::error::{CatPrintError, Result};

/// Two-byte frame preamble
pub const MAGIC: [u8; 2] = [0x51, 0x78];

/// Last byte of every frame
pub const TERMINATOR: u8 = 0xFF;

/// Magic + opcode + reserved + length + reserved
pub const HEADER_LEN: usize = 6;

/// Checksum + terminator
pub const TRAILER_LEN: usize = 2;

/// Largest payload the length byte can describe
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

/// A decoded (or about to be encoded) protocol frame.
///
/// The opcode is kept as a raw byte because inbound frames may carry opcodes
/// this crate never sends (flow control uses `0xAE`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub opcode: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a frame, rejecting payloads that do not fit the length byte.
    pub fn new(opcode: u8, payload: Vec<u8>) -> Result<Self> {
        if payload.len() > MAX_PAYLOAD {
            return Err(CatPrintError::PayloadTooLarge { len: payload.len() });
        }
        Ok(Self { opcode, payload })
    }

    /// Total encoded length of this frame.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.payload.len() + TRAILER_LEN
    }

    /// Serialize to wire bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self.opcode, &self.payload)
    }
}

/// Build the wire bytes for one frame.
///
/// ## Errors
///
/// [`CatPrintError::PayloadTooLarge`] if `payload` is longer than 255 bytes.
pub fn encode(opcode: u8, payload: &[u8]) -> Result<Vec<u8>> {
    let len = u8::try_from(payload.len())
        .map_err(|_| CatPrintError::PayloadTooLarge { len: payload.len() })?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len() + TRAILER_LEN);
    out.extend_from_slice(&MAGIC);
    out.push(opcode);
    out.push(0x00);
    out.push(len);
    out.push(0x00);
    out.extend_from_slice(payload);
    out.push(crc8(payload));
    out.push(TERMINATOR);
    Ok(out)
}

/// Parse exactly one frame from `bytes`.
///
/// The slice must hold a single complete frame with nothing trailing. The
/// two reserved header bytes are not checked: the printer sets byte 3 to
/// `0x01` on some of its notifications.
///
/// ## Errors
///
/// - [`CatPrintError::MalformedFrame`] for a bad magic, bad terminator or a
///   length field that disagrees with the number of bytes actually present
/// - [`CatPrintError::ChecksumMismatch`] when the structure is fine but the
///   checksum is not
pub fn decode(bytes: &[u8]) -> Result<Frame> {
    if bytes.len() < HEADER_LEN + TRAILER_LEN {
        return Err(CatPrintError::MalformedFrame(format!(
            "{} bytes is shorter than an empty frame",
            bytes.len()
        )));
    }
    if bytes[0..2] != MAGIC {
        return Err(CatPrintError::MalformedFrame(format!(
            "bad magic {:02X} {:02X}",
            bytes[0], bytes[1]
        )));
    }
    let terminator = bytes[bytes.len() - 1];
    if terminator != TERMINATOR {
        return Err(CatPrintError::MalformedFrame(format!(
            "bad terminator {:02X}",
            terminator
        )));
    }

    let declared = bytes[4] as usize;
    let actual = bytes.len() - HEADER_LEN - TRAILER_LEN;
    if declared != actual {
        return Err(CatPrintError::MalformedFrame(format!(
            "length field says {} payload bytes, found {}",
            declared, actual
        )));
    }

    let payload = &bytes[HEADER_LEN..HEADER_LEN + declared];
    let expected = bytes[HEADER_LEN + declared];
    let computed = crc8(payload);
    if expected != computed {
        return Err(CatPrintError::ChecksumMismatch {
            expected,
            actual: computed,
        });
    }

    Ok(Frame {
        opcode: bytes[2],
        payload: payload.to_vec(),
    })
}

// ============================================================================
// TESTS
// ============================================================================
