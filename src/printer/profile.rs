//! # Printer Profiles
//!
//! The cat-printer family shares one protocol but the firmware variants
//! disagree on details: accepted quality values, which opcodes exist, and
//! the auxiliary feed constants. A [`PrinterProfile`] captures those
//! differences as plain data so a single command catalog serves all of them.
//!
//! ## Built-in Profiles
//!
//! | Profile | Width | Quality | Energy | Lattice / info / aux feed |
//! |---------|-------|---------|--------|---------------------------|
//! | `gb01` | 384 dots | `0x31..=0x35` (default `0x33`) | `0xE02E` | yes |
//! | `classic` | 384 dots | `1..=5` (default 5) | `0x1000` | no |
//!
//! ## Usage
//!
//! ```
//! use catprint::printer::PrinterProfile;
//!
//! let profile = PrinterProfile::gb01();
//! println!("Print width: {} dots ({} bytes)",
//!          profile.width_dots,
//!          profile.width_bytes());
//! ```
//!
//! Custom profiles can be loaded from JSON with [`PrinterProfile::from_json`].

use serde::{Deserialize, Serialize};

use crate::error::{CatPrintError, Result};
use crate::protocol::commands::{FeedSpeed, Opcode};

/// Default maximum bytes per BLE write
pub const DEFAULT_MTU: usize = 30;

/// Inclusive range of accepted print-quality bytes, plus the value sent when
/// the caller does not pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityRange {
    pub min: u8,
    pub max: u8,
    pub default: u8,
}

impl QualityRange {
    #[inline]
    pub fn contains(&self, value: u8) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// # Printer Profile
///
/// Hardware characteristics of one printer variant.
///
/// - **advertised_name**: BLE local name used for discovery by name
/// - **width_dots**: fixed printable width; every scanline is this wide
/// - **mtu**: maximum bytes per transport write
/// - **finish_feed**: steps fed after the last scanline so the print clears
///   the tear bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterProfile {
    pub name: String,
    pub advertised_name: String,
    pub width_dots: u16,
    pub quality: QualityRange,
    pub default_energy: u16,
    pub opcodes: Vec<Opcode>,
    pub image_speed: u8,
    pub blank_speed: u8,
    #[serde(default = "default_mtu")]
    pub mtu: usize,
    pub finish_feed: u16,
}

fn default_mtu() -> usize {
    DEFAULT_MTU
}

impl PrinterProfile {
    /// # GB01
    ///
    /// 58mm paper, 384-dot head. Understands the full catalog, including
    /// lattice control and the auxiliary feed-speed command.
    pub fn gb01() -> Self {
        Self {
            name: "GB01".to_string(),
            advertised_name: "GB01".to_string(),
            width_dots: 384,
            quality: QualityRange {
                min: 0x31,
                max: 0x35,
                default: 0x33,
            },
            default_energy: 0xE02E,
            opcodes: Opcode::ALL.to_vec(),
            image_speed: 0x23,
            blank_speed: 0x19,
            mtu: DEFAULT_MTU,
            finish_feed: 0x70,
        }
    }

    /// # Classic
    ///
    /// Older firmware with the reduced catalog: feed, retract, draw, state
    /// query, quality `1..=5`, energy and drawing mode.
    pub fn classic() -> Self {
        Self {
            name: "Classic".to_string(),
            advertised_name: "GB01".to_string(),
            width_dots: 384,
            quality: QualityRange {
                min: 1,
                max: 5,
                default: 5,
            },
            default_energy: 0x1000,
            opcodes: vec![
                Opcode::RetractPaper,
                Opcode::FeedPaper,
                Opcode::DrawLine,
                Opcode::GetDeviceState,
                Opcode::SetQuality,
                Opcode::SetEnergy,
                Opcode::DrawingMode,
            ],
            image_speed: 0,
            blank_speed: 0,
            mtu: DEFAULT_MTU,
            finish_feed: 5,
        }
    }

    /// Scanline length in bytes (`width_dots / 8`, rounded up).
    #[inline]
    pub fn width_bytes(&self) -> usize {
        (self.width_dots as usize).div_ceil(8)
    }

    #[inline]
    pub fn supports(&self, opcode: Opcode) -> bool {
        self.opcodes.contains(&opcode)
    }

    /// Auxiliary feed byte for `speed`.
    #[inline]
    pub fn feed_speed(&self, speed: FeedSpeed) -> u8 {
        match speed {
            FeedSpeed::Image => self.image_speed,
            FeedSpeed::Blank => self.blank_speed,
        }
    }

    /// Parse a built-in profile name (case-insensitive).
    pub fn by_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "gb01" => Ok(Self::gb01()),
            "classic" => Ok(Self::classic()),
            other => Err(CatPrintError::Config(format!(
                "Unknown profile '{}'. Use 'gb01' or 'classic'",
                other
            ))),
        }
    }

    /// Load a custom profile from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let profile: Self = serde_json::from_str(json).map_err(|e| {
            CatPrintError::Config(format!("Invalid profile JSON: {}", e))
        })?;
        profile.validate()?;
        Ok(profile)
    }

    /// Check internal consistency of a profile.
    pub fn validate(&self) -> Result<()> {
        if self.width_dots == 0 {
            return Err(CatPrintError::Config(
                "width_dots must be non-zero".to_string(),
            ));
        }
        if self.width_bytes() > crate::protocol::frame::MAX_PAYLOAD {
            return Err(CatPrintError::Config(format!(
                "{} dots does not fit in one frame",
                self.width_dots
            )));
        }
        if self.quality.min > self.quality.max || !self.quality.contains(self.quality.default) {
            return Err(CatPrintError::Config(format!(
                "quality default {:#04x} outside {:#04x}..={:#04x}",
                self.quality.default, self.quality.min, self.quality.max
            )));
        }
        if self.mtu == 0 {
            return Err(CatPrintError::Config(
                "mtu must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// List all built-in profiles.
    pub fn built_in() -> Vec<Self> {
        vec![Self::gb01(), Self::classic()]
    }
}

impl Default for PrinterProfile {
    fn default() -> Self {
        Self::gb01()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gb01_dimensions() {
        let profile = PrinterProfile::gb01();
        assert_eq!(profile.width_dots, 384);
        assert_eq!(profile.width_bytes(), 48);
        assert_eq!(profile.mtu, 30);
    }

    #[test]
    fn test_width_bytes_rounds_up() {
        let mut profile = PrinterProfile::gb01();
        profile.width_dots = 12;
        assert_eq!(profile.width_bytes(), 2);
        profile.width_dots = 8;
        assert_eq!(profile.width_bytes(), 1);
    }

    #[test]
    fn test_built_ins_are_valid() {
        for profile in PrinterProfile::built_in() {
            profile.validate().unwrap();
        }
    }

    #[test]
    fn test_classic_has_reduced_catalog() {
        let classic = PrinterProfile::classic();
        assert!(classic.supports(Opcode::DrawLine));
        assert!(!classic.supports(Opcode::Lattice));
        assert!(!classic.supports(Opcode::GetDeviceInfo));
        assert!(!classic.supports(Opcode::AuxFeed));
    }

    #[test]
    fn test_by_name() {
        assert_eq!(PrinterProfile::by_name("GB01").unwrap().name, "GB01");
        assert_eq!(PrinterProfile::by_name("classic").unwrap().name, "Classic");
        assert!(matches!(
            PrinterProfile::by_name("tsp650"),
            Err(CatPrintError::Config(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let json = serde_json::to_string(&PrinterProfile::gb01()).unwrap();
        let parsed = PrinterProfile::from_json(&json).unwrap();
        assert_eq!(parsed, PrinterProfile::gb01());
    }

    #[test]
    fn test_json_defaults_mtu() {
        let json = r#"{
            "name": "Tiny",
            "advertised_name": "MX05",
            "width_dots": 8,
            "quality": { "min": 1, "max": 5, "default": 3 },
            "default_energy": 4096,
            "opcodes": ["feed_paper", "draw_line"],
            "image_speed": 0,
            "blank_speed": 0,
            "finish_feed": 1
        }"#;
        let profile = PrinterProfile::from_json(json).unwrap();
        assert_eq!(profile.mtu, DEFAULT_MTU);
        assert!(profile.supports(Opcode::DrawLine));
        assert!(!profile.supports(Opcode::SetEnergy));
    }

    #[test]
    fn test_json_rejects_bad_quality_default() {
        let mut profile = PrinterProfile::classic();
        profile.quality.default = 9;
        let json = serde_json::to_string(&profile).unwrap();
        assert!(matches!(
            PrinterProfile::from_json(&json),
            Err(CatPrintError::Config(_))
        ));
    }

    #[test]
    fn test_config_errors_are_not_command_errors() {
        let err = PrinterProfile::from_json("{ not json").unwrap_err();
        assert!(matches!(err, CatPrintError::Config(_)));
        assert!(err.to_string().starts_with("Invalid configuration"));

        let mut profile = PrinterProfile::gb01();
        profile.mtu = 0;
        assert!(matches!(profile.validate(), Err(CatPrintError::Config(_))));
    }
}
