//! Render configuration shared read-only by every preview in a run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::Rgba;

/// Lines drawn when no custom sample text is configured.
pub const DEFAULT_SAMPLE_TEXT: &[&str] = &[
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "abcdefghijklmnopqrstuvwxyz",
    "0123456789 !@#$%&*()[]{}?",
    "The quick brown fox jumps over the lazy dog",
];

/// Typographic points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Weight/slant applied to the preview.
///
/// Faces are fetched in their regular cut, so bold and italic are
/// synthesized at rasterization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontStyle {
    #[default]
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub const ALL: [FontStyle; 4] = [
        FontStyle::Regular,
        FontStyle::Bold,
        FontStyle::Italic,
        FontStyle::BoldItalic,
    ];

    pub fn is_bold(self) -> bool {
        matches!(self, FontStyle::Bold | FontStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, FontStyle::Italic | FontStyle::BoldItalic)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FontStyle::Regular => "regular",
            FontStyle::Bold => "bold",
            FontStyle::Italic => "italic",
            FontStyle::BoldItalic => "bold-italic",
        }
    }
}

/// OpenType glyph variant requested while shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontVariant {
    #[default]
    Normal,
    SmallCaps,
    Superscript,
    Subscript,
}

impl FontVariant {
    pub const ALL: [FontVariant; 4] = [
        FontVariant::Normal,
        FontVariant::SmallCaps,
        FontVariant::Superscript,
        FontVariant::Subscript,
    ];

    /// OpenType feature tag that enables the variant, if any.
    pub fn feature_tag(self) -> Option<&'static str> {
        match self {
            FontVariant::Normal => None,
            FontVariant::SmallCaps => Some("smcp"),
            FontVariant::Superscript => Some("sups"),
            FontVariant::Subscript => Some("subs"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FontVariant::Normal => "normal",
            FontVariant::SmallCaps => "small-caps",
            FontVariant::Superscript => "superscript",
            FontVariant::Subscript => "subscript",
        }
    }
}

macro_rules! impl_str_enum {
    ($ty:ty, $what:literal) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| {
                        let valid: Vec<&str> = <$ty>::ALL.iter().map(|v| v.as_str()).collect();
                        format!("invalid {} '{}' (expected one of: {})", $what, s, valid.join(", "))
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_str_enum!(FontStyle, "font style");
impl_str_enum!(FontVariant, "font variant");

/// Style parameters for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Font size in points.
    pub size: u32,
    pub style: FontStyle,
    pub variant: FontVariant,
    pub foreground: Rgba,
    pub background: Rgba,
    /// Dots per inch used to convert points to pixels.
    pub dpi: u32,
    /// Margin around the sample, in points.
    pub margin: u32,
    /// Sample lines, drawn top to bottom.
    pub text: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            size: 48,
            style: FontStyle::Regular,
            variant: FontVariant::Normal,
            foreground: Rgba::BLACK,
            background: Rgba::WHITE,
            dpi: 100,
            margin: 5,
            text: DEFAULT_SAMPLE_TEXT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RenderConfig {
    /// Font size converted to pixels at the configured DPI.
    pub fn pixel_size(&self) -> f32 {
        self.size as f32 * self.dpi as f32 / POINTS_PER_INCH
    }

    /// Margin converted to whole pixels at the configured DPI.
    pub fn margin_pixels(&self) -> u32 {
        (self.margin as f32 * self.dpi as f32 / POINTS_PER_INCH).round() as u32
    }

    /// Sample lines with blank lines kept, so spacing is preserved.
    pub fn sample_lines(&self) -> impl Iterator<Item = &str> {
        self.text.iter().flat_map(|block| block.split('\n'))
    }
}
