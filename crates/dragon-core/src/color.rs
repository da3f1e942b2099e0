//! RGB colors, `#RRGGBB` conversion and the single-letter color keys.

use crate::error::ColorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unpacks a `0xRRGGBB` integer.
    pub const fn from_packed(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        }
    }

    pub const fn packed(&self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Parses a strict `#RRGGBB` string.
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        let digits = hex
            .strip_prefix('#')
            .filter(|d| d.len() == 6 && d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| ColorError::InvalidHex(hex.to_string()))?;

        let value =
            u32::from_str_radix(digits, 16).map_err(|_| ColorError::InvalidHex(hex.to_string()))?;
        Ok(Self::from_packed(value))
    }

    /// Formats as an upper-case `#RRGGBB` string.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn with_alpha(self, a: u8) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = ColorValue::deserialize(deserializer)?;
        value.resolve().map_err(serde::de::Error::custom)
    }
}

/// An RGB color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// A color as it may appear in a settings file: `"#RRGGBB"` or a packed
/// `0xRRGGBB` integer written by older versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorValue {
    Hex(String),
    Packed(u32),
}

impl ColorValue {
    pub fn resolve(&self) -> Result<Rgb, ColorError> {
        match self {
            ColorValue::Hex(s) => Rgb::from_hex(s),
            ColorValue::Packed(v) if *v <= 0xFF_FFFF => Ok(Rgb::from_packed(*v)),
            ColorValue::Packed(v) => Err(ColorError::OutOfRange(*v)),
        }
    }

    /// Resolves the value, substituting `default` (and logging) when it
    /// cannot be parsed.
    pub fn resolve_or(&self, default: Rgb) -> Rgb {
        self.resolve().unwrap_or_else(|e| {
            tracing::warn!("{}, using {}", e, default);
            default
        })
    }
}

impl From<Rgb> for ColorValue {
    fn from(color: Rgb) -> Self {
        ColorValue::Hex(color.to_hex())
    }
}

/// Resolves an optional settings color against a default.
pub fn color_or(value: Option<&ColorValue>, default: Rgb) -> Rgb {
    value.map_or(default, |v| v.resolve_or(default))
}

const COLOR_KEYS: [(char, Rgb); 6] = [
    ('r', Rgb::RED),
    ('g', Rgb::GREEN),
    ('b', Rgb::BLUE),
    ('k', Rgb::BLACK),
    ('s', Rgb::BLACK),
    ('w', Rgb::WHITE),
];

/// Maps the recolor keys `r g b k s w` to their colors.
pub fn color_from_key(key: char) -> Option<Rgb> {
    COLOR_KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, color)| *color)
}
