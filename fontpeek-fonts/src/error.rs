//! Typed error types for fontpeek-fonts.

use thiserror::Error;

/// Errors produced while turning font bytes into a sample image.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The bytes are a font container the engine cannot read directly.
    #[error("unsupported font format: {0}")]
    UnsupportedFormat(&'static str),

    /// A WOFF container that does not decode to a font.
    #[error("invalid WOFF data: {0}")]
    InvalidWoff(&'static str),

    /// The bytes could not be parsed as a TrueType/OpenType face.
    #[error("invalid font data ({len} bytes)")]
    InvalidFont {
        /// Size of the rejected buffer.
        len: usize,
    },

    /// There is no sample text to draw.
    #[error("sample text is empty")]
    EmptySample,

    /// The computed image exceeds the size limit.
    #[error("rendered image too large: {width}x{height}")]
    TooLarge { width: u32, height: u32 },

    /// The engine panicked; the payload message is kept when it is a string.
    #[error("caught panic: {0}")]
    Panicked(String),
}
