//! # Error Types
//!
//! This module defines error types used throughout the catprint library.
//!
//! Failures fall into three groups:
//!
//! - **Pre-flight**: [`CatPrintError::NoTargetConfigured`] and
//!   [`CatPrintError::DeviceNotFound`] are raised before anything is written
//!   to the printer.
//! - **Build time**: [`CatPrintError::PayloadTooLarge`] and
//!   [`CatPrintError::InvalidCommandPayload`] are raised while turning a
//!   command into a frame. Values are never clamped.
//!   [`CatPrintError::Config`] covers printer profiles that cannot be loaded.
//! - **Inbound**: [`CatPrintError::ChecksumMismatch`] and
//!   [`CatPrintError::MalformedFrame`] only come out of frame decoding.

use thiserror::Error;

/// Main error type for catprint operations
#[derive(Debug, Error)]
pub enum CatPrintError {
    /// A session was started without an address or advertised name.
    #[error("No printer address or name configured")]
    NoTargetConfigured,

    /// Discovery gave up after polling for the configured number of attempts.
    #[error("No printer matching {target} found after {attempts} attempts")]
    DeviceNotFound { target: String, attempts: u32 },

    /// Frame payloads carry a one-byte length field.
    #[error("Payload of {len} bytes does not fit in a frame (max 255)")]
    PayloadTooLarge { len: usize },

    /// Command value outside the range the printer profile accepts
    #[error("Invalid command payload: {0}")]
    InvalidCommandPayload(String),

    /// Unknown or inconsistent printer profile
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Inbound frame whose trailing checksum disagrees with its payload.
    #[error("Checksum mismatch: frame says {expected:#04x}, payload hashes to {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// Inbound bytes that are not a well-formed frame
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Transport-level errors (discovery, connection, writes)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Image processing error
    #[error("Image error: {0}")]
    Image(String),

    /// A queued job failed partway through.
    ///
    /// `completed` operations were fully transmitted before `source` occurred.
    /// Whatever reached the printer stays printed.
    #[error("Print job aborted after {completed}/{total} operations: {source}")]
    JobAborted {
        completed: usize,
        total: usize,
        #[source]
        source: Box<CatPrintError>,
    },

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for CatPrintError {
    fn from(err: image::ImageError) -> Self {
        CatPrintError::Image(err.to_string())
    }
}

/// Result type alias using [`CatPrintError`].
pub type Result<T> = std::result::Result<T, CatPrintError>;
