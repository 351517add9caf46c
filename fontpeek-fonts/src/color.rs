//! RGBA colors parsed from CSS-style names and hex notation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to parse a color string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color '{0}': expected a color name or #rgb, #rgba, #rrggbb, #rrggbbaa")]
pub struct ColorParseError(pub String);

/// A straight (non-premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

const NAMED_COLORS: &[(&str, Rgba)] = &[
    ("black", Rgba::rgb(0, 0, 0)),
    ("white", Rgba::rgb(255, 255, 255)),
    ("red", Rgba::rgb(255, 0, 0)),
    ("green", Rgba::rgb(0, 128, 0)),
    ("lime", Rgba::rgb(0, 255, 0)),
    ("blue", Rgba::rgb(0, 0, 255)),
    ("yellow", Rgba::rgb(255, 255, 0)),
    ("cyan", Rgba::rgb(0, 255, 255)),
    ("aqua", Rgba::rgb(0, 255, 255)),
    ("magenta", Rgba::rgb(255, 0, 255)),
    ("fuchsia", Rgba::rgb(255, 0, 255)),
    ("gray", Rgba::rgb(128, 128, 128)),
    ("grey", Rgba::rgb(128, 128, 128)),
    ("silver", Rgba::rgb(192, 192, 192)),
    ("maroon", Rgba::rgb(128, 0, 0)),
    ("olive", Rgba::rgb(128, 128, 0)),
    ("teal", Rgba::rgb(0, 128, 128)),
    ("navy", Rgba::rgb(0, 0, 128)),
    ("purple", Rgba::rgb(128, 0, 128)),
    ("orange", Rgba::rgb(255, 165, 0)),
    ("transparent", Rgba::new(0, 0, 0, 0)),
];

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Same color with `alpha` scaled by `coverage` (0..=255).
    pub fn with_coverage(self, coverage: u8) -> [u8; 4] {
        let a = (self.a as u16 * coverage as u16 + 127) / 255;
        [self.r, self.g, self.b, a as u8]
    }
}

fn hex_nibble(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|d| d as u8)
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let bytes = hex.as_bytes();
    let nibbles: Vec<u8> = bytes.iter().map(|&c| hex_nibble(c)).collect::<Option<_>>()?;
    let pair = |i: usize| nibbles[i] << 4 | nibbles[i + 1];
    match nibbles.len() {
        3 => Some(Rgba::rgb(nibbles[0] * 17, nibbles[1] * 17, nibbles[2] * 17)),
        4 => Some(Rgba::new(
            nibbles[0] * 17,
            nibbles[1] * 17,
            nibbles[2] * 17,
            nibbles[3] * 17,
        )),
        6 => Some(Rgba::rgb(pair(0), pair(2), pair(4))),
        8 => Some(Rgba::new(pair(0), pair(2), pair(4), pair(6))),
        _ => None,
    }
}

impl FromStr for Rgba {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed.strip_prefix('#') {
            Some(hex) => parse_hex(hex),
            None => {
                let lower = trimmed.to_ascii_lowercase();
                NAMED_COLORS
                    .iter()
                    .find(|(name, _)| *name == lower)
                    .map(|(_, color)| *color)
            }
        };
        parsed.ok_or_else(|| ColorParseError(s.to_string()))
    }
}

impl TryFrom<String> for Rgba {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((name, _)) = NAMED_COLORS.iter().find(|(_, color)| color == self) {
            return f.write_str(name);
        }
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Rgba> for image::Rgba<u8> {
    fn from(color: Rgba) -> Self {
        image::Rgba(color.to_array())
    }
}
