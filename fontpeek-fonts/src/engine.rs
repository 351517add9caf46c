//! Sample rasterization: shape each line with rustybuzz, render glyphs with
//! swash, composite onto an RGBA canvas.

use image::RgbaImage;
use rustybuzz::Face;
use swash::FontRef;
use swash::scale::image::{Content, Image};
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::{Angle, Format, Transform, Vector};

use crate::config::RenderConfig;
use crate::error::RasterError;
use crate::shaper::{features_for, shape_line};
use crate::woff::decode_woff;

/// Largest width or height the engine will allocate.
pub const MAX_DIMENSION: u32 = 16_384;

/// Slant applied when italic is synthesized.
const ITALIC_SKEW_DEGREES: f32 = 12.0;

/// Emboldening strength as a fraction of the pixel size.
const BOLD_STRENGTH: f32 = 1.0 / 28.0;

/// Color sources first so emoji and COLR fonts keep their colors; plain
/// outlines are the fallback.
const SOURCES: &[Source] = &[
    Source::ColorBitmap(StrikeWith::BestFit),
    Source::ColorOutline(0),
    Source::Outline,
];

/// Container format sniffed from the first bytes of a font file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFormat {
    TrueType,
    OpenType,
    Collection,
    Woff,
    Woff2,
    Unknown,
}

impl FontFormat {
    pub fn sniff(data: &[u8]) -> Self {
        match data.get(..4) {
            Some([0x00, 0x01, 0x00, 0x00]) | Some(b"true") => FontFormat::TrueType,
            Some(b"OTTO") => FontFormat::OpenType,
            Some(b"ttcf") => FontFormat::Collection,
            Some(b"wOFF") => FontFormat::Woff,
            Some(b"wOF2") => FontFormat::Woff2,
            _ => FontFormat::Unknown,
        }
    }
}

/// Turns font bytes into a sample image.
///
/// Implementations may panic on hostile input; [`crate::Rasterizer`] is the
/// boundary that contains that.
pub trait RasterEngine {
    fn rasterize(&self, data: &[u8], config: &RenderConfig) -> Result<RgbaImage, RasterError>;
}

impl<E: RasterEngine + ?Sized> RasterEngine for &E {
    fn rasterize(&self, data: &[u8], config: &RenderConfig) -> Result<RgbaImage, RasterError> {
        (**self).rasterize(data, config)
    }
}

impl<E: RasterEngine + ?Sized> RasterEngine for Box<E> {
    fn rasterize(&self, data: &[u8], config: &RenderConfig) -> Result<RgbaImage, RasterError> {
        (**self).rasterize(data, config)
    }
}

/// rustybuzz + swash engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlyphEngine;

/// A rendered glyph positioned relative to the top of the first line.
struct PlacedGlyph {
    x: i32,
    y: i32,
    image: Image,
}

/// Pixel bounds accumulated over all glyphs and line boxes.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
}

impl Bounds {
    fn include(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        self.min_x = self.min_x.min(x0);
        self.min_y = self.min_y.min(y0);
        self.max_x = self.max_x.max(x1);
        self.max_y = self.max_y.max(y1);
    }
}

impl RasterEngine for GlyphEngine {
    fn rasterize(&self, data: &[u8], config: &RenderConfig) -> Result<RgbaImage, RasterError> {
        let decoded;
        let data = match FontFormat::sniff(data) {
            FontFormat::Woff2 => return Err(RasterError::UnsupportedFormat("WOFF2")),
            FontFormat::Woff => {
                decoded = decode_woff(data)?;
                decoded.as_slice()
            }
            _ => data,
        };
        let invalid = || RasterError::InvalidFont { len: data.len() };
        let font = FontRef::from_index(data, 0).ok_or_else(invalid)?;
        let face = Face::from_slice(data, 0).ok_or_else(invalid)?;

        let lines: Vec<&str> = config.sample_lines().collect();
        if lines.iter().all(|line| line.trim().is_empty()) {
            return Err(RasterError::EmptySample);
        }

        let px = config.pixel_size();
        let unscaled = font.metrics(&[]);
        let units_per_em = unscaled.units_per_em.max(1) as f32;
        let scale = px / units_per_em;
        let metrics = unscaled.scale(px);
        let ascent = metrics.ascent.ceil();
        let line_height = (metrics.ascent + metrics.descent + metrics.leading)
            .ceil()
            .max(1.0);

        let features = features_for(config.variant);
        let mut context = ScaleContext::new();
        let mut scaler = context.builder(font).size(px).hint(true).build();

        let mut placed = Vec::new();
        let mut bounds = Bounds {
            min_x: 0,
            min_y: 0,
            max_x: 0,
            max_y: (line_height * lines.len() as f32).ceil() as i32,
        };

        for (row, line) in lines.iter().enumerate() {
            let baseline = ascent + line_height * row as f32;
            let mut pen_x = 0.0f32;

            for glyph in shape_line(&face, line, &features) {
                let x = pen_x + glyph.x_offset * scale;
                let y = baseline - glyph.y_offset * scale;
                pen_x += glyph.x_advance * scale;

                let mut render = Render::new(SOURCES);
                render
                    .format(Format::Alpha)
                    .offset(Vector::new(x.fract(), 0.0));
                if config.style.is_bold() {
                    render.embolden(px * BOLD_STRENGTH);
                }
                if config.style.is_italic() {
                    render.transform(Some(Transform::skew(
                        Angle::from_degrees(ITALIC_SKEW_DEGREES),
                        Angle::from_degrees(0.0),
                    )));
                }
                let Some(image) = render.render(&mut scaler, glyph.glyph_id) else {
                    continue;
                };
                if image.placement.width == 0 || image.placement.height == 0 {
                    continue;
                }

                let gx = x.floor() as i32 + image.placement.left;
                let gy = y.round() as i32 - image.placement.top;
                bounds.include(
                    gx,
                    gy,
                    gx + image.placement.width as i32,
                    gy + image.placement.height as i32,
                );
                placed.push(PlacedGlyph {
                    x: gx,
                    y: gy,
                    image,
                });
            }
            bounds.include(0, 0, pen_x.ceil() as i32, 0);
        }

        let margin = config.margin_pixels() as i64;
        let width = (bounds.max_x - bounds.min_x) as i64 + 2 * margin;
        let height = (bounds.max_y - bounds.min_y) as i64 + 2 * margin;
        if width <= 0 || height <= 0 || width > MAX_DIMENSION as i64 || height > MAX_DIMENSION as i64 {
            return Err(RasterError::TooLarge {
                width: width.clamp(0, u32::MAX as i64) as u32,
                height: height.clamp(0, u32::MAX as i64) as u32,
            });
        }

        let mut canvas = RgbaImage::from_pixel(width as u32, height as u32, config.background.into());
        let origin_x = margin as i32 - bounds.min_x;
        let origin_y = margin as i32 - bounds.min_y;
        for glyph in &placed {
            composite(
                &mut canvas,
                &glyph.image,
                origin_x + glyph.x,
                origin_y + glyph.y,
                config,
            );
        }
        Ok(canvas)
    }
}

/// Draw one glyph image onto the canvas with its top-left at `(x, y)`.
fn composite(canvas: &mut RgbaImage, glyph: &Image, x: i32, y: i32, config: &RenderConfig) {
    let gw = glyph.placement.width as usize;
    let gh = glyph.placement.height as usize;
    let (cw, ch) = (canvas.width() as i32, canvas.height() as i32);

    for row in 0..gh {
        let py = y + row as i32;
        if py < 0 || py >= ch {
            continue;
        }
        for col in 0..gw {
            let px = x + col as i32;
            if px < 0 || px >= cw {
                continue;
            }
            let idx = row * gw + col;
            let src = match glyph.content {
                Content::Mask => match glyph.data.get(idx) {
                    Some(&coverage) => config.foreground.with_coverage(coverage),
                    None => continue,
                },
                Content::Color => match glyph.data.get(idx * 4..idx * 4 + 4) {
                    Some(&[r, g, b, a]) => [r, g, b, a],
                    _ => continue,
                },
                Content::SubpixelMask => match glyph.data.get(idx * 4..idx * 4 + 3) {
                    Some(&[r, g, b]) => {
                        let coverage = ((r as u16 + g as u16 + b as u16) / 3) as u8;
                        config.foreground.with_coverage(coverage)
                    }
                    _ => continue,
                },
            };
            blend_over(canvas.get_pixel_mut(px as u32, py as u32), src);
        }
    }
}

/// Porter-Duff "source over" with straight alpha.
fn blend_over(dst: &mut image::Rgba<u8>, src: [u8; 4]) {
    let sa = src[3] as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let blended = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        dst[c] = blended.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
