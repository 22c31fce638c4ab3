//! # Command Catalog
//!
//! This module implements the closed set of commands understood by GB01-family
//! "cat" printers, and the rules for turning each one into a frame payload.
//!
//! ## Opcode Table
//!
//! | Opcode | Command | Payload |
//! |--------|---------|---------|
//! | `0xA0` | Retract paper | u16 steps, big-endian |
//! | `0xA1` | Feed paper | u16 steps, big-endian |
//! | `0xA2` | Draw bitmap line | one packed 1bpp scanline |
//! | `0xA3` | Query device state | `0x00` |
//! | `0xA4` | Set print quality | 1 byte, range depends on the printer |
//! | `0xA6` | Lattice control | 11-byte start or finish vector |
//! | `0xA8` | Query device info | `0x00` |
//! | `0xAF` | Set energy | u16, big-endian |
//! | `0xBD` | Auxiliary feed speed | 1 byte, device-specific constant |
//! | `0xBE` | Set drawing mode | `0` image, `1` text |
//!
//! ## Validation
//!
//! Values are checked against a [`PrinterProfile`] before anything is
//! encoded. Out-of-range values fail with
//! [`CatPrintError::InvalidCommandPayload`]; nothing is clamped, and opcodes
//! the profile does not list are refused.
//!
//! ```
//! use catprint::printer::PrinterProfile;
//! use catprint::protocol::commands::Command;
//!
//! let profile = PrinterProfile::gb01();
//! let frame = Command::FeedPaper(0x0102).to_frame(&profile)?;
//! assert_eq!(frame.payload, vec![0x01, 0x02]);
//!
//! assert!(Command::SetQuality(9).to_frame(&profile).is_err());
//! # Ok::<(), catprint::CatPrintError>(())
//! ```

use serde::{Deserialize, Serialize};

use super::frame::{self, Frame};
use crate::error::{CatPrintError, Result};
use crate::printer::PrinterProfile;

/// Lattice vector sent before the first scanline of a job.
pub const PRINT_LATTICE: [u8; 11] = [
    0xAA, 0x55, 0x17, 0x38, 0x44, 0x5F, 0x5F, 0x5F, 0x44, 0x38, 0x2C,
];

/// Lattice vector sent after the last scanline of a job.
pub const FINISH_LATTICE: [u8; 11] = [
    0xAA, 0x55, 0x17, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x17,
];

/// One-byte command selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Opcode {
    RetractPaper = 0xA0,
    FeedPaper = 0xA1,
    DrawLine = 0xA2,
    GetDeviceState = 0xA3,
    SetQuality = 0xA4,
    Lattice = 0xA6,
    GetDeviceInfo = 0xA8,
    SetEnergy = 0xAF,
    AuxFeed = 0xBD,
    DrawingMode = 0xBE,
}

impl Opcode {
    /// Every opcode in the catalog.
    pub const ALL: [Opcode; 10] = [
        Opcode::RetractPaper,
        Opcode::FeedPaper,
        Opcode::DrawLine,
        Opcode::GetDeviceState,
        Opcode::SetQuality,
        Opcode::Lattice,
        Opcode::GetDeviceInfo,
        Opcode::SetEnergy,
        Opcode::AuxFeed,
        Opcode::DrawingMode,
    ];

    #[inline]
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Look up a wire byte. Bytes outside the catalog return `None`.
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.byte() == byte)
    }
}

/// Drawing mode selected by `0xBE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawingMode {
    #[default]
    Image,
    Text,
}

impl DrawingMode {
    #[inline]
    pub fn byte(self) -> u8 {
        match self {
            DrawingMode::Image => 0,
            DrawingMode::Text => 1,
        }
    }
}

/// Which lattice vector to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lattice {
    Start,
    Finish,
}

impl Lattice {
    pub fn vector(self) -> &'static [u8; 11] {
        match self {
            Lattice::Start => &PRINT_LATTICE,
            Lattice::Finish => &FINISH_LATTICE,
        }
    }
}

/// Auxiliary feed speed. The byte values come from the printer profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSpeed {
    /// Sent before image scanlines
    Image,
    /// Sent before feeding blank paper
    Blank,
}

/// A single printer command with its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "snake_case")]
pub enum Command {
    RetractPaper(u16),
    FeedPaper(u16),
    DrawLine(Vec<u8>),
    GetDeviceState,
    SetQuality(u8),
    Lattice(Lattice),
    GetDeviceInfo,
    SetEnergy(u16),
    AuxFeed(FeedSpeed),
    DrawingMode(DrawingMode),
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::RetractPaper(_) => Opcode::RetractPaper,
            Command::FeedPaper(_) => Opcode::FeedPaper,
            Command::DrawLine(_) => Opcode::DrawLine,
            Command::GetDeviceState => Opcode::GetDeviceState,
            Command::SetQuality(_) => Opcode::SetQuality,
            Command::Lattice(_) => Opcode::Lattice,
            Command::GetDeviceInfo => Opcode::GetDeviceInfo,
            Command::SetEnergy(_) => Opcode::SetEnergy,
            Command::AuxFeed(_) => Opcode::AuxFeed,
            Command::DrawingMode(_) => Opcode::DrawingMode,
        }
    }

    /// Build the validated payload for `profile`.
    ///
    /// ## Errors
    ///
    /// [`CatPrintError::InvalidCommandPayload`] when the profile does not
    /// support the opcode, the quality is outside the profile's range, or a
    /// scanline is not exactly `profile.width_bytes()` long.
    pub fn payload(&self, profile: &PrinterProfile) -> Result<Vec<u8>> {
        let opcode = self.opcode();
        if !profile.supports(opcode) {
            return Err(CatPrintError::InvalidCommandPayload(format!(
                "{:?} ({:#04x}) is not supported by {}",
                opcode,
                opcode.byte(),
                profile.name
            )));
        }

        let payload = match self {
            Command::RetractPaper(steps) | Command::FeedPaper(steps) => {
                steps.to_be_bytes().to_vec()
            }
            Command::SetEnergy(energy) => energy.to_be_bytes().to_vec(),
            Command::DrawLine(bits) => {
                let expected = profile.width_bytes();
                if bits.len() != expected {
                    return Err(CatPrintError::InvalidCommandPayload(format!(
                        "scanline is {} bytes, {} expects {}",
                        bits.len(),
                        profile.name,
                        expected
                    )));
                }
                bits.clone()
            }
            Command::GetDeviceState | Command::GetDeviceInfo => vec![0x00],
            Command::SetQuality(quality) => {
                if !profile.quality.contains(*quality) {
                    return Err(CatPrintError::InvalidCommandPayload(format!(
                        "quality {:#04x} outside {:#04x}..={:#04x} for {}",
                        quality, profile.quality.min, profile.quality.max, profile.name
                    )));
                }
                vec![*quality]
            }
            Command::Lattice(lattice) => lattice.vector().to_vec(),
            Command::AuxFeed(speed) => vec![profile.feed_speed(*speed)],
            Command::DrawingMode(mode) => vec![mode.byte()],
        };

        Ok(payload)
    }

    /// Validate and wrap in a [`Frame`].
    pub fn to_frame(&self, profile: &PrinterProfile) -> Result<Frame> {
        Frame::new(self.opcode().byte(), self.payload(profile)?)
    }

    /// Validate and encode straight to wire bytes.
    pub fn encode(&self, profile: &PrinterProfile) -> Result<Vec<u8>> {
        let payload = self.payload(profile)?;
        frame::encode(self.opcode().byte(), &payload)
    }
}

// ============================================================================
// TESTS
// ============================================================================
