use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layer::names;

#[derive(Error, Debug, PartialEq)]
pub enum ColorParseError {
    #[error("color must start with '#': {0:?}")]
    MissingHash(String),

    #[error("expected 6 or 8 hex digits, got {0:?}")]
    InvalidLength(String),

    #[error("invalid hex digits in {0:?}")]
    InvalidDigits(String),
}

/// RGBA color, written as `#RRGGBB` or `#RRGGBBAA` in theme files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(128, 128, 128)
    }
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    pub fn alpha(&self) -> f32 {
        self.a as f32 / 255.0
    }

    /// Normalised RGBA with the alpha channel scaled by `opacity`.
    pub fn to_f32_array(&self, opacity: f32) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.alpha() * opacity.clamp(0.0, 1.0),
        ]
    }

    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let digits = hex
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(hex.to_string()))?;
        if digits.len() != 6 && digits.len() != 8 {
            return Err(ColorParseError::InvalidLength(hex.to_string()));
        }
        let channel = |i: usize| {
            digits
                .get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| ColorParseError::InvalidDigits(hex.to_string()))
        };
        let a = if digits.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> String {
        color.to_string()
    }
}

/// How items on a layer are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    pub color: Color,
    /// Stroke width used when an item does not specify one.
    #[serde(default = "default_width")]
    pub width: f64,
}

fn default_width() -> f64 {
    0.1
}

impl LayerStyle {
    pub const fn new(color: Color, width: f64) -> Self {
        Self { color, width }
    }
}

/// Colors for every board layer and the viewer's virtual layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardTheme {
    pub background: Color,
    pub layers: BTreeMap<String, LayerStyle>,
    pub default_layer: LayerStyle,
    pub via_through: Color,
    pub via_blind_buried: Color,
    pub via_micro: Color,
    pub via_hole: Color,
    pub pad_front: Color,
    pub pad_back: Color,
    pub pad_hole: Color,
    pub pad_plated_hole: Color,
    pub grid: Color,
    pub grid_axes: Color,
    pub drawing_sheet: Color,
    pub selection: Color,
    pub highlight: Color,
}

impl Default for BoardTheme {
    fn default() -> Self {
        let layer = |name: &str, hex: u32| {
            let [_, r, g, b] = hex.to_be_bytes();
            (name.to_string(), LayerStyle::new(Color::rgb(r, g, b), 0.1))
        };
        let layers = BTreeMap::from([
            layer(names::F_CU, 0xC83434),
            layer("In1.Cu", 0x7FC87F),
            layer("In2.Cu", 0xCEDE7E),
            layer("In3.Cu", 0x4FCBCB),
            layer("In4.Cu", 0xDB628B),
            layer(names::B_CU, 0x4D7FC4),
            layer(names::F_ADHES, 0x843184),
            layer(names::B_ADHES, 0x0000F5),
            layer(names::F_PASTE, 0xB4A0A0),
            layer(names::B_PASTE, 0x00C2C2),
            layer(names::F_SILKS, 0xF2EDA1),
            layer(names::B_SILKS, 0xE8B2A7),
            layer(names::F_MASK, 0xD864FF),
            layer(names::B_MASK, 0x02FFEE),
            layer(names::F_CRTYD, 0xFF26E2),
            layer(names::B_CRTYD, 0x26E9FF),
            layer(names::F_FAB, 0xAFAFAF),
            layer(names::B_FAB, 0x585D84),
            layer(names::DWGS_USER, 0xC2C2C2),
            layer(names::CMTS_USER, 0x5994DC),
            layer(names::ECO1_USER, 0xB4DBD2),
            layer(names::ECO2_USER, 0xD8C852),
            layer(names::EDGE_CUTS, 0xD0D2CD),
            layer(names::MARGIN, 0xFF26E2),
        ]);
        Self {
            background: Color::rgb(0x00, 0x10, 0x23),
            layers,
            default_layer: LayerStyle::new(Color::rgb(0x80, 0x80, 0x80), 0.1),
            via_through: Color::rgb(0xEC, 0xEC, 0xEC),
            via_blind_buried: Color::rgb(0xBB, 0x97, 0x22),
            via_micro: Color::rgb(0x00, 0x84, 0x84),
            via_hole: Color::rgb(0xE3, 0xB7, 0x2E),
            pad_front: Color::rgb(0xC8, 0x34, 0x34),
            pad_back: Color::rgb(0x4D, 0x7F, 0xC4),
            pad_hole: Color::rgb(0xE3, 0xB7, 0x2E),
            pad_plated_hole: Color::rgb(0xC2, 0xC2, 0x00),
            grid: Color::rgb(0x84, 0x84, 0x84),
            grid_axes: Color::rgb(0xC2, 0xC2, 0xC2),
            drawing_sheet: Color::rgb(0xC8, 0x72, 0x72),
            selection: Color::rgba(0xFF, 0xFF, 0xFF, 0xB0),
            highlight: Color::rgb(0xFF, 0xFF, 0xFF),
        }
    }
}

impl BoardTheme {
    /// Style for a board layer, falling back to `default_layer`.
    pub fn layer_style(&self, name: &str) -> LayerStyle {
        self.layers.get(name).copied().unwrap_or(self.default_layer)
    }

    pub fn layer_color(&self, name: &str) -> Color {
        self.layer_style(name).color
    }
}
