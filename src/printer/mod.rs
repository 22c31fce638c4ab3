//! # Printer Module
//!
//! Printer-variant configuration.
//!
//! ## Modules
//!
//! - [`profile`]: per-variant width, quality range and supported opcodes

pub mod profile;

pub use profile::{PrinterProfile, QualityRange};
