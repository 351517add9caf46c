//! Inline terminal graphics.
//!
//! Images are PNG-encoded and sent with either the Kitty graphics protocol
//! or the iTerm2 inline image protocol. Support is detected from the
//! environment only; the terminal is never queried.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};

/// Kitty limits each escape sequence payload to 4096 bytes.
const KITTY_CHUNK: usize = 4096;

/// `TERM_PROGRAM` values of terminals that speak the iTerm2 protocol.
const ITERM2_PROGRAMS: &[&str] = &["iTerm.app", "WezTerm", "mintty", "vscode", "Tabby", "rio", "par-term"];

/// Supported graphics protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphicsProtocol {
    Kitty,
    Iterm2,
}

impl GraphicsProtocol {
    /// Detect from the process environment.
    pub fn detect() -> Option<Self> {
        Self::detect_with(|name| std::env::var(name).ok())
    }

    /// Detect using `lookup` to read environment variables.
    pub fn detect_with(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        if lookup("KITTY_WINDOW_ID").is_some_and(|v| !v.is_empty()) {
            return Some(GraphicsProtocol::Kitty);
        }
        let term = lookup("TERM").unwrap_or_default();
        if term == "xterm-kitty" || term == "xterm-ghostty" {
            return Some(GraphicsProtocol::Kitty);
        }
        let program = lookup("TERM_PROGRAM").unwrap_or_default();
        if program == "ghostty" {
            return Some(GraphicsProtocol::Kitty);
        }
        if ITERM2_PROGRAMS.contains(&program.as_str()) || lookup("ITERM_SESSION_ID").is_some() {
            return Some(GraphicsProtocol::Iterm2);
        }
        if lookup("KONSOLE_VERSION").is_some() {
            return Some(GraphicsProtocol::Kitty);
        }
        None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GraphicsProtocol::Kitty => "kitty",
            GraphicsProtocol::Iterm2 => "iterm2",
        }
    }

    pub fn encoder(self) -> Box<dyn TerminalEncoder> {
        match self {
            GraphicsProtocol::Kitty => Box::new(KittyEncoder),
            GraphicsProtocol::Iterm2 => Box::new(Iterm2Encoder),
        }
    }
}

impl FromStr for GraphicsProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kitty" => Ok(GraphicsProtocol::Kitty),
            "iterm2" | "iterm" => Ok(GraphicsProtocol::Iterm2),
            _ => Err(format!("invalid graphics protocol '{s}' (expected kitty or iterm2)")),
        }
    }
}

impl fmt::Display for GraphicsProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes an image to a terminal sink.
pub trait TerminalEncoder {
    fn encode(&self, sink: &mut dyn Write, image: &RgbaImage) -> io::Result<()>;
}

impl<E: TerminalEncoder + ?Sized> TerminalEncoder for &E {
    fn encode(&self, sink: &mut dyn Write, image: &RgbaImage) -> io::Result<()> {
        (**self).encode(sink, image)
    }
}

impl<E: TerminalEncoder + ?Sized> TerminalEncoder for Box<E> {
    fn encode(&self, sink: &mut dyn Write, image: &RgbaImage) -> io::Result<()> {
        (**self).encode(sink, image)
    }
}

/// Encode `image` as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> io::Result<Vec<u8>> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(io::Error::other)?;
    Ok(png)
}

/// Kitty graphics protocol: transmit-and-display a PNG in 4096-byte chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct KittyEncoder;

impl TerminalEncoder for KittyEncoder {
    fn encode(&self, sink: &mut dyn Write, image: &RgbaImage) -> io::Result<()> {
        let payload = BASE64.encode(encode_png(image)?);
        let chunks: Vec<&[u8]> = payload.as_bytes().chunks(KITTY_CHUNK).collect();
        let last = chunks.len().saturating_sub(1);
        for (i, chunk) in chunks.iter().enumerate() {
            let more = u8::from(i != last);
            if i == 0 {
                write!(sink, "\x1b_Ga=T,f=100,q=2,m={more};")?;
            } else {
                write!(sink, "\x1b_Gm={more};")?;
            }
            sink.write_all(chunk)?;
            sink.write_all(b"\x1b\\")?;
        }
        writeln!(sink)
    }
}

/// iTerm2 inline image protocol (OSC 1337 File).
#[derive(Debug, Clone, Copy, Default)]
pub struct Iterm2Encoder;

impl TerminalEncoder for Iterm2Encoder {
    fn encode(&self, sink: &mut dyn Write, image: &RgbaImage) -> io::Result<()> {
        let png = encode_png(image)?;
        write!(
            sink,
            "\x1b]1337;File=inline=1;size={};width={}px;height={}px;preserveAspectRatio=1:{}\x07",
            png.len(),
            image.width(),
            image.height(),
            BASE64.encode(&png)
        )?;
        writeln!(sink)
    }
}
