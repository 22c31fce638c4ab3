//! # Cat Printer Protocol
//!
//! Low-level building blocks for the binary protocol spoken by GB01-family
//! Bluetooth LE thermal printers.
//!
//! ## Module Structure
//!
//! - [`crc8`]: payload checksum
//! - [`frame`]: frame encoding and decoding
//! - [`commands`]: opcode catalog and payload validation
//! - [`notify`]: flow-control sequences and status reports sent by the printer
//!
//! ## Usage Example
//!
//! ```
//! use catprint::printer::PrinterProfile;
//! use catprint::protocol::commands::{Command, DrawingMode};
//!
//! let profile = PrinterProfile::gb01();
//!
//! let mut data = Vec::new();
//! data.extend(Command::SetQuality(0x33).encode(&profile)?);
//! data.extend(Command::SetEnergy(0xE02E).encode(&profile)?);
//! data.extend(Command::DrawingMode(DrawingMode::Image).encode(&profile)?);
//! data.extend(Command::DrawLine(vec![0xFF; 48]).encode(&profile)?);
//! data.extend(Command::FeedPaper(112).encode(&profile)?);
//!
//! // Send `data` in transfer-unit-sized pieces via a transport...
//! # Ok::<(), catprint::CatPrintError>(())
//! ```

pub mod commands;
pub mod crc8;
pub mod frame;
pub mod notify;

pub use commands::{Command, DrawingMode, FeedSpeed, Lattice, Opcode};
pub use frame::Frame;
pub use notify::{FlowSignal, Notification, StatusReport};
