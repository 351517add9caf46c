//! Text shaping using HarfBuzz via rustybuzz.
//!
//! Applies kerning, standard ligatures and the OpenType feature for the
//! requested [`FontVariant`]. Positions are returned in font units; the
//! engine scales them.

use std::str::FromStr;

use rustybuzz::{Face, Feature, GlyphBuffer, UnicodeBuffer};

use crate::config::FontVariant;

/// A single shaped glyph with positioning information in font units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapedGlyph {
    /// Glyph ID from the font
    pub glyph_id: u16,

    /// Horizontal advance
    pub x_advance: f32,

    /// Horizontal offset from the current pen position
    pub x_offset: f32,

    /// Vertical offset from the baseline (positive is up)
    pub y_offset: f32,
}

/// Feature list for a shaping call.
pub fn features_for(variant: FontVariant) -> Vec<Feature> {
    ["kern", "liga", "calt", "ccmp", "locl"]
        .into_iter()
        .chain(variant.feature_tag())
        .filter_map(|tag| Feature::from_str(tag).ok())
        .collect()
}

/// Shape one line of text.
pub fn shape_line(face: &Face<'_>, text: &str, features: &[Feature]) -> Vec<ShapedGlyph> {
    let mut buffer = UnicodeBuffer::new();
    buffer.push_str(text);
    buffer.guess_segment_properties();
    let glyphs = rustybuzz::shape(face, features, buffer);
    extract_glyphs(&glyphs)
}

fn extract_glyphs(buffer: &GlyphBuffer) -> Vec<ShapedGlyph> {
    buffer
        .glyph_infos()
        .iter()
        .zip(buffer.glyph_positions())
        .map(|(info, pos)| ShapedGlyph {
            glyph_id: info.glyph_id as u16,
            x_advance: pos.x_advance as f32,
            x_offset: pos.x_offset as f32,
            y_offset: pos.y_offset as f32,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_include_variant_tag() {
        let normal = features_for(FontVariant::Normal);
        let small_caps = features_for(FontVariant::SmallCaps);
        assert_eq!(small_caps.len(), normal.len() + 1);
    }
}
