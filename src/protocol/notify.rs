//! # Printer Notifications
//!
//! Bytes arriving on the notify characteristic are one of:
//!
//! - a **flow-control signal**: one of two exact 9-byte sequences asking the
//!   host to pause or resume sending
//! - a **status report**: the answer to a device-state query (`0xA3`),
//!   whose first payload byte is a bitfield of physical conditions
//! - any other frame (device info, acknowledgements), passed through as-is
//!
//! ## Status Bits
//!
//! | Bit | Condition |
//! |-----|-----------|
//! | 0 | No paper |
//! | 1 | Cover open |
//! | 2 | Overheating |
//! | 3 | Low power |
//!
//! Bits are independent; several may be set at once.

use bitflags::bitflags;

use super::commands::Opcode;
use super::frame::{self, Frame};
use crate::error::{CatPrintError, Result};

/// Sent by the printer when its buffer is full.
pub const PAUSE_SEQUENCE: [u8; 9] = [0x51, 0x78, 0xAE, 0x01, 0x01, 0x00, 0x10, 0x70, 0xFF];

/// Sent by the printer when it can take more data.
pub const RESUME_SEQUENCE: [u8; 9] = [0x51, 0x78, 0xAE, 0x01, 0x01, 0x00, 0x00, 0x00, 0xFF];

bitflags! {
    /// Physical conditions reported in a device-state response.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StatusReport: u8 {
        const NO_PAPER = 0b0000_0001;
        const COVER_OPEN = 0b0000_0010;
        const OVERHEATING = 0b0000_0100;
        const LOW_POWER = 0b0000_1000;
    }
}

impl StatusReport {
    /// Decode the status byte. Undocumented bits are dropped.
    #[inline]
    pub fn from_status_byte(byte: u8) -> Self {
        Self::from_bits_truncate(byte)
    }

    /// `true` when no condition is flagged.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.is_empty()
    }

    /// Human-readable description of every flagged condition.
    pub fn describe(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.contains(Self::NO_PAPER) {
            out.push("no paper");
        }
        if self.contains(Self::COVER_OPEN) {
            out.push("cover open");
        }
        if self.contains(Self::OVERHEATING) {
            out.push("overheating");
        }
        if self.contains(Self::LOW_POWER) {
            out.push("low power");
        }
        out
    }
}

/// Flow-control request from the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowSignal {
    Pause,
    Resume,
}

/// A classified inbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Flow(FlowSignal),
    Status(StatusReport),
    Other(Frame),
}

/// Match the two flow-control sequences exactly.
#[inline]
pub fn flow_signal(bytes: &[u8]) -> Option<FlowSignal> {
    if bytes == PAUSE_SEQUENCE {
        Some(FlowSignal::Pause)
    } else if bytes == RESUME_SEQUENCE {
        Some(FlowSignal::Resume)
    } else {
        None
    }
}

/// Classify one notification.
///
/// ## Errors
///
/// Anything that is neither a flow-control sequence nor a valid frame
/// returns the frame decoding error. A device-state frame with an empty
/// payload is [`CatPrintError::MalformedFrame`].
pub fn classify(bytes: &[u8]) -> Result<Notification> {
    if let Some(signal) = flow_signal(bytes) {
        return Ok(Notification::Flow(signal));
    }

    let frame = frame::decode(bytes)?;
    if frame.opcode == Opcode::GetDeviceState.byte() {
        let byte = frame.payload.first().copied().ok_or_else(|| {
            CatPrintError::MalformedFrame("device state response has no status byte".to_string())
        })?;
        return Ok(Notification::Status(StatusReport::from_status_byte(byte)));
    }

    Ok(Notification::Other(frame))
}

// ============================================================================
// TESTS
// ============================================================================
