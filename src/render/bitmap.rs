//! # Scanline Encoding
//!
//! Converts an arbitrary raster image into the printer's line format: one
//! packed 1bpp row per scanline, exactly `width_dots` pixels wide.
//!
//! ## Pipeline
//!
//! ```text
//! image ─▶ fit to width ─▶ classify pixels ─▶ pack LSB-first ─▶ BitmapLine*
//!          (scale down     (PixelPolicy)      (bit set = ink)
//!           or pad right)
//! ```
//!
//! ## Fitting
//!
//! - **Wider than the head**: scaled down so the width equals `width_dots`.
//!   The new height is `floor(height * width_dots / width)`, never less
//!   than one row.
//! - **Narrower**: left-aligned, and the columns to the right are padded
//!   with not-drawn pixels regardless of the pixel policy.
//!
//! ## Bit Packing
//!
//! The printer reads each byte least-significant bit first:
//!
//! - Bit 0 (LSB) = leftmost pixel of the byte
//! - Bit 7 (MSB) = rightmost pixel of the byte
//! - 1 = drawn (ink), 0 = blank
//!
//! An 8-pixel run that is fully drawn therefore packs to `0xFF`, and a run
//! where only the first pixel is drawn packs to `0x01`.
//!
//! ## Blank Lines
//!
//! With [`BlankLines::Skip`] any row whose packed bytes are all zero is
//! dropped. This shortens text and graphics jobs. Raster jobs use
//! [`BlankLines::Keep`] so every row is paced identically.
//!
//! ```
//! use catprint::render::bitmap::{pack_line, BitmapEncoder, BlankLines};
//! use catprint::render::dither::PixelPolicy;
//! use image::{DynamicImage, Rgba, RgbaImage};
//!
//! assert_eq!(pack_line(&[true, false, false, false, false, false, false, false]), vec![0x01]);
//!
//! let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 1, Rgba([0, 0, 0, 255])));
//! let encoder = BitmapEncoder::new(8, PixelPolicy::DarkOpaque, BlankLines::Keep);
//! let lines = encoder.render(&image);
//! assert_eq!(lines[0].bytes(), &[0xFF]);
//! ```

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, RgbaImage};
use serde::{Deserialize, Serialize};

use super::dither::PixelPolicy;
use crate::printer::PrinterProfile;

/// Whether rows with no drawn pixels are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlankLines {
    #[default]
    Keep,
    Skip,
}

/// One packed scanline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapLine {
    /// Source row after fitting
    pub row: u32,
    bits: Vec<u8>,
}

impl BitmapLine {
    pub fn new(row: u32, bits: Vec<u8>) -> Self {
        Self { row, bits }
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bits
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bits
    }

    /// `true` if no pixel on this line is drawn.
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.bits.iter().all(|&b| b == 0)
    }
}

/// Pack a row of pixel values into bytes, LSB first.
///
/// If the row length is not a multiple of 8, the last byte is padded with
/// zero (blank) bits in its high positions.
pub fn pack_line(pixels: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; pixels.len().div_ceil(8)];
    for (i, &pixel) in pixels.iter().enumerate() {
        if pixel {
            bytes[i / 8] |= 1 << (i % 8);
        }
    }
    bytes
}

/// Height after scaling `width x height` down to `target_width`.
///
/// Rounds down, with a floor of one row.
pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    if width == 0 {
        return 0;
    }
    let scaled = (height as u64 * target_width as u64) / width as u64;
    (scaled as u32).max(1)
}

/// Turns images into scanlines for a fixed head width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapEncoder {
    width_dots: u32,
    policy: PixelPolicy,
    blank_lines: BlankLines,
}

impl BitmapEncoder {
    pub fn new(width_dots: u32, policy: PixelPolicy, blank_lines: BlankLines) -> Self {
        Self {
            width_dots,
            policy,
            blank_lines,
        }
    }

    /// Encoder for the head width of `profile`.
    pub fn for_profile(
        profile: &PrinterProfile,
        policy: PixelPolicy,
        blank_lines: BlankLines,
    ) -> Self {
        Self::new(profile.width_dots as u32, policy, blank_lines)
    }

    #[inline]
    pub fn width_dots(&self) -> u32 {
        self.width_dots
    }

    /// Scale an image down to the head width if it is wider.
    ///
    /// Narrower images are returned unchanged; padding happens during
    /// [`render`](Self::render).
    pub fn fit(&self, image: &DynamicImage) -> RgbaImage {
        let rgba = image.to_rgba8();
        if rgba.width() <= self.width_dots {
            return rgba;
        }
        let height = scaled_height(rgba.width(), rgba.height(), self.width_dots);
        imageops::resize(&rgba, self.width_dots, height, FilterType::Triangle)
    }

    /// Render `image` into scanlines.
    ///
    /// Deterministic: the same image and settings always produce the same
    /// lines.
    pub fn render(&self, image: &DynamicImage) -> Vec<BitmapLine> {
        let fitted = self.fit(image);
        let content_width = fitted.width().min(self.width_dots) as usize;
        let width = self.width_dots as usize;

        let mut lines = Vec::with_capacity(fitted.height() as usize);
        let mut pixels = vec![false; width];

        for y in 0..fitted.height() {
            for (x, drawn) in pixels.iter_mut().enumerate() {
                *drawn = x < content_width
                    && self
                        .policy
                        .is_drawn(x, y as usize, fitted.get_pixel(x as u32, y));
            }

            let line = BitmapLine::new(y, pack_line(&pixels));
            if self.blank_lines == BlankLines::Skip && line.is_blank() {
                continue;
            }
            lines.push(line);
        }

        lines
    }
}

/// Unpack scanlines into a grayscale preview (black = drawn).
///
/// Each line becomes one row, in order; skipped blank lines do not appear.
pub fn to_preview(lines: &[BitmapLine], width_dots: u32) -> GrayImage {
    let mut img = GrayImage::from_pixel(width_dots, lines.len() as u32, Luma([255u8]));

    for (y, line) in lines.iter().enumerate() {
        for x in 0..width_dots as usize {
            let Some(&byte) = line.bytes().get(x / 8) else {
                break;
            };
            if (byte >> (x % 8)) & 1 == 1 {
                img.put_pixel(x as u32, y as u32, Luma([0u8]));
            }
        }
    }

    img
}

// ============================================================================
// TESTS
// ============================================================================
