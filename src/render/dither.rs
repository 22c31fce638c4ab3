//! # Pixel Classification
//!
//! Thermal heads are binary: every pixel is either burned or left blank.
//! This module decides, pixel by pixel, which source pixels count as
//! "drawn". Different jobs want different rules, so the rule is an explicit
//! [`PixelPolicy`] chosen by the caller.
//!
//! | Policy | Drawn when | Typical source |
//! |--------|------------|----------------|
//! | [`PixelPolicy::DarkOpaque`] | R, G and B all below `0x80` and alpha above `0x80` | rendered text or formulas on a transparent canvas |
//! | [`PixelPolicy::Threshold`] | luminance (composited over white) below the threshold | line art, logos, already-monochrome images |
//! | [`PixelPolicy::Bayer`] | darkness exceeds the 8x8 Bayer threshold at that position | photos |
//!
//! ## Ordered Dithering
//!
//! The Bayer matrix spreads 64 thresholds over an 8x8 tile. A pixel of
//! darkness `d` (0.0 = white, 1.0 = black) is drawn when `d` exceeds
//! `(BAYER8[y % 8][x % 8] + 0.5) / 64`, so pure white never prints and pure
//! black always does.
//!
//! ```
//! use catprint::render::dither::should_print;
//!
//! assert!(should_print(0, 0, 1.0));
//! assert!(!should_print(0, 0, 0.0));
//! ```

use image::Rgba;
use serde::{Deserialize, Serialize};

/// Bayer 8x8 dithering matrix
///
/// Values range from 0-63, each appearing once.
pub const BAYER8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Channel cut-off used by [`PixelPolicy::DarkOpaque`].
pub const DARK_OPAQUE_CUTOFF: u8 = 0x80;

/// Default luminance cut-off for [`PixelPolicy::Threshold`].
pub const DEFAULT_LUMA_THRESHOLD: u8 = 0x80;

/// Rule deciding whether a source pixel is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PixelPolicy {
    /// Dark in every colour channel and mostly opaque.
    DarkOpaque,
    /// Luminance below `threshold` after compositing over white.
    Threshold { threshold: u8 },
    /// Ordered dithering on luminance.
    Bayer,
}

impl Default for PixelPolicy {
    fn default() -> Self {
        PixelPolicy::Threshold {
            threshold: DEFAULT_LUMA_THRESHOLD,
        }
    }
}

impl PixelPolicy {
    /// Classify the pixel at `(x, y)`.
    #[inline]
    pub fn is_drawn(&self, x: usize, y: usize, pixel: &Rgba<u8>) -> bool {
        match *self {
            PixelPolicy::DarkOpaque => {
                let [r, g, b, a] = pixel.0;
                r < DARK_OPAQUE_CUTOFF
                    && g < DARK_OPAQUE_CUTOFF
                    && b < DARK_OPAQUE_CUTOFF
                    && a > DARK_OPAQUE_CUTOFF
            }
            PixelPolicy::Threshold { threshold } => luma_over_white(pixel) < threshold,
            PixelPolicy::Bayer => {
                let darkness = 1.0 - luma_over_white(pixel) as f32 / 255.0;
                should_print(x, y, darkness)
            }
        }
    }
}

/// Rec. 601 luminance of `pixel` composited onto a white background.
#[inline]
pub fn luma_over_white(pixel: &Rgba<u8>) -> u8 {
    let [r, g, b, a] = pixel.0;
    let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
    let alpha = a as u32;
    ((luma * alpha + 255 * (255 - alpha)) / 255) as u8
}

/// Get the dithering threshold for a pixel position.
///
/// Returns a value in the range (0, 1), never exactly 0 or 1.
#[inline]
pub fn threshold(x: usize, y: usize) -> f32 {
    let matrix_value = BAYER8[y & 7][x & 7];
    (matrix_value as f32 + 0.5) / 64.0
}

/// Determine if a dot should be printed at the given position.
///
/// `intensity` is darkness: 0.0 = white, 1.0 = black.
#[inline]
pub fn should_print(x: usize, y: usize, intensity: f32) -> bool {
    intensity > threshold(x, y)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    #[test]
    fn test_bayer_matrix_values() {
        let mut seen = [false; 64];
        for row in &BAYER8 {
            for &val in row {
                assert!(val < 64, "Matrix value {} out of range", val);
                assert!(!seen[val as usize], "Duplicate value {}", val);
                seen[val as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s), "Not all values 0-63 present");
    }

    #[test]
    fn test_threshold_range() {
        for y in 0..8 {
            for x in 0..8 {
                let t = threshold(x, y);
                assert!(t > 0.0 && t < 1.0, "Threshold at ({},{}) = {}", x, y, t);
            }
        }
    }

    #[test]
    fn test_gray_distribution() {
        let mut count = 0;
        for y in 0..8 {
            for x in 0..8 {
                if should_print(x, y, 0.5) {
                    count += 1;
                }
            }
        }
        assert_eq!(count, 32);
    }

    #[test]
    fn test_dark_opaque_policy() {
        let policy = PixelPolicy::DarkOpaque;
        assert!(policy.is_drawn(0, 0, &BLACK));
        assert!(!policy.is_drawn(0, 0, &WHITE));
        // Transparent black is background on a text canvas
        assert!(!policy.is_drawn(0, 0, &CLEAR));
        // One bright channel is enough to count as not drawn
        assert!(!policy.is_drawn(0, 0, &Rgba([0x7F, 0x7F, 0x80, 0xFF])));
        assert!(policy.is_drawn(0, 0, &Rgba([0x7F, 0x7F, 0x7F, 0x81])));
        assert!(!policy.is_drawn(0, 0, &Rgba([0x00, 0x00, 0x00, 0x80])));
    }

    #[test]
    fn test_threshold_policy() {
        let policy = PixelPolicy::default();
        assert!(policy.is_drawn(0, 0, &BLACK));
        assert!(!policy.is_drawn(0, 0, &WHITE));
        // Transparent pixels composite to white
        assert!(!policy.is_drawn(0, 0, &CLEAR));
        // Pure red is darker than mid-gray in luma
        assert!(policy.is_drawn(0, 0, &Rgba([255, 0, 0, 255])));
    }

    #[test]
    fn test_bayer_policy_extremes() {
        let policy = PixelPolicy::Bayer;
        for y in 0..16 {
            for x in 0..16 {
                assert!(policy.is_drawn(x, y, &BLACK));
                assert!(!policy.is_drawn(x, y, &WHITE));
                assert!(!policy.is_drawn(x, y, &CLEAR));
            }
        }
    }

    #[test]
    fn test_luma_over_white() {
        assert_eq!(luma_over_white(&WHITE), 255);
        assert_eq!(luma_over_white(&BLACK), 0);
        assert_eq!(luma_over_white(&CLEAR), 255);
    }
}
