//! Font sample rasterization for fontpeek.
//!
//! This crate provides:
//! - `RenderConfig` with the style knobs for a preview (size, style, variant,
//!   colors, DPI, margin, sample text)
//! - HarfBuzz-based shaping via rustybuzz
//! - WOFF 1.0 decoding to sfnt, so WOFF downloads render like TrueType
//! - `GlyphEngine`, which shapes the sample lines and rasterizes them with
//!   swash into an `image::RgbaImage`
//! - `Rasterizer`, the adapter that contains engine panics and reports them
//!   as `RasterError::Panicked`
//!
//! # Architecture
//!
//! `Rasterizer` owns a `RasterEngine` and an immutable `RenderConfig`. The
//! engine is a trait so callers (and tests) can swap the swash engine for a
//! fake.

pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod rasterizer;
pub mod shaper;
pub mod woff;

pub use color::Rgba;
pub use config::{DEFAULT_SAMPLE_TEXT, FontStyle, FontVariant, RenderConfig};
pub use engine::{FontFormat, GlyphEngine, RasterEngine};
pub use error::RasterError;
pub use rasterizer::Rasterizer;
pub use woff::decode_woff;
