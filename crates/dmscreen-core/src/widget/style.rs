//! Presentation attributes for widgets.

use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An RGBA8 color stored as a CSS hex string (`#rrggbb` or `#rrggbbaa`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Error returned when a string is not a valid hex color.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid hex color: {0}")]
pub struct ParseColorError(pub String);

impl HexColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub const fn transparent() -> Self {
        Self::rgba(0, 0, 0, 0)
    }
}

impl FromStr for HexColor {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("transparent") {
            return Ok(Self::transparent());
        }
        let hex = trimmed
            .strip_prefix('#')
            .ok_or_else(|| ParseColorError(s.to_string()))?;
        if !hex.is_ascii() {
            return Err(ParseColorError(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ParseColorError(s.to_string()))
        };
        match hex.len() {
            // #rgb expands each nibble
            3 => Ok(Self::rgb(
                channel(0..1)? * 17,
                channel(1..2)? * 17,
                channel(2..3)? * 17,
            )),
            6 => Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Ok(Self::rgba(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => Err(ParseColorError(s.to_string())),
        }
    }
}

impl From<String> for HexColor {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|err| {
            log::warn!("{}; falling back to black", err);
            Self::black()
        })
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl From<Color> for HexColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::rgba(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

impl From<HexColor> for Color {
    fn from(color: HexColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Visual style of a widget frame. Purely presentational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetStyle {
    pub background_color: HexColor,
    pub text_color: HexColor,
    pub border_color: HexColor,
    /// Border width in pixels.
    pub border_width: f64,
    /// Corner radius in pixels.
    pub border_radius: f64,
}

impl Default for WidgetStyle {
    fn default() -> Self {
        Self {
            background_color: HexColor::rgb(0x2d, 0x2d, 0x2d),
            text_color: HexColor::rgb(0xe5, 0xe7, 0xeb),
            border_color: HexColor::rgb(0x4a, 0x9e, 0xff),
            border_width: 2.0,
            border_radius: 8.0,
        }
    }
}
