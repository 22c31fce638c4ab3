//! # Catprint - Thermal Cat Printer Protocol Library
//!
//! Catprint drives the small BLE thermal printers sold as "cat printers"
//! (GB01 and friends). It provides:
//!
//! - **Protocol implementation**: framing, CRC-8, the command catalog
//! - **Bitmap encoding**: images to packed 1-bit scanlines
//! - **Flow control**: the printer's pause/resume and status notifications
//! - **Sessions**: an ordered job queue sent in MTU-sized fragments
//! - **Transport**: a small trait over the BLE primitives, plus file and mock backends
//!
//! ## Quick Start
//!
//! ```no_run
//! use catprint::{
//!     session::{ImageJob, Session},
//!     transport::FileTransport,
//!     PrinterProfile,
//! };
//!
//! # async fn run() -> catprint::Result<()> {
//! let image = image::open("cat.png")?;
//!
//! let mut session = Session::new(PrinterProfile::gb01());
//! session.set_name("GB01");
//! session
//!     .enqueue_prologue()
//!     .draw_image(ImageJob::raster(image))
//!     .enqueue_epilogue();
//!
//! // Dump the exact byte stream instead of printing
//! let mut transport = FileTransport::new("cat.bin");
//! let report = session.print(&mut transport).await?;
//! println!("{} frames", report.frames);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | Frames, CRC-8, commands, notifications |
//! | [`render`] | Image scaling, pixel policies, bit packing |
//! | [`session`] | Command queue, packetizer, flow control |
//! | [`transport`] | Transport trait and backends |
//! | [`printer`] | Printer profiles |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! Two built-in profiles cover the common firmware:
//! - GB01 (384 dots, lattice and auxiliary feed commands)
//! - Classic (384 dots, reduced command set, quality 1-5)
//!
//! Other models can be described with a JSON profile.

pub mod error;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use error::{CatPrintError, Result};
pub use printer::PrinterProfile;
pub use session::{PrintReport, Session, SessionConfig};
pub use transport::{Target, Transport};
