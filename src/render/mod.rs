//! # Rendering Module
//!
//! Turns raster images into the printer's 1-bit scanline format.
//!
//! ## Modules
//!
//! - [`bitmap`]: scaling, padding and LSB-first packing into [`bitmap::BitmapLine`]s
//! - [`dither`]: pixel classification policies, including Bayer 8x8 ordered dithering
//!
//! ## Usage Example
//!
//! ```
//! use catprint::render::bitmap::{BitmapEncoder, BlankLines};
//! use catprint::render::dither::PixelPolicy;
//! use image::{DynamicImage, Rgba, RgbaImage};
//!
//! let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 2, Rgba([0, 0, 0, 255])));
//! let encoder = BitmapEncoder::new(16, PixelPolicy::default(), BlankLines::Keep);
//!
//! let lines = encoder.render(&image);
//! assert_eq!(lines.len(), 2);
//! assert_eq!(lines[0].bytes(), &[0xFF, 0x00]);
//! ```

pub mod bitmap;
pub mod dither;
