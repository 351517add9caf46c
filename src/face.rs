//! Family name to downloadable font face.
//!
//! The Google Fonts CSS2 endpoint answers with an `@font-face` stylesheet
//! whose `src` format depends on the `User-Agent` of the request, so the
//! agent is what selects TrueType or WOFF. WOFF2 is never requested: the
//! rasterizer reads sfnt and WOFF only.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use fontpeek_http::{CancelToken, Request, Transport, TransportError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ureq::http;
use url::Url;

/// Google Fonts CSS2 stylesheet endpoint.
pub const CSS2_API: &str = "https://fonts.googleapis.com/css2";

/// Stylesheets are tiny; anything bigger is not what we asked for.
const MAX_STYLESHEET_SIZE: u64 = 1024 * 1024;

static FONT_FACE_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"src:\s*url\(\s*['"]?([^'")\s]+)['"]?\s*\)(?:\s*format\(\s*['"]?([A-Za-z0-9-]+)['"]?\s*\))?"#,
    )
    .expect("FONT_FACE_SRC is a valid static regex pattern")
});

/// Errors raised while resolving a family to a face.
#[derive(Debug, Error)]
pub enum FaceError {
    #[error("invalid stylesheet endpoint: {0}")]
    Endpoint(url::ParseError),

    #[error("request failed: {0}")]
    Transport(TransportError),

    #[error("stylesheet request returned status {status}")]
    Status { status: u16 },

    #[error("no @font-face for family {family:?}")]
    NoFontFace { family: String },

    #[error("operation canceled")]
    Canceled,
}

impl FaceError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, FaceError::Canceled)
    }
}

impl From<url::ParseError> for FaceError {
    fn from(e: url::ParseError) -> Self {
        FaceError::Endpoint(e)
    }
}

impl From<TransportError> for FaceError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Canceled => FaceError::Canceled,
            other => FaceError::Transport(other),
        }
    }
}

/// Font container requested from the stylesheet endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceFormat {
    #[default]
    #[serde(alias = "ttf")]
    TrueType,
    Woff,
}

impl FaceFormat {
    pub const ALL: [FaceFormat; 2] = [FaceFormat::TrueType, FaceFormat::Woff];

    pub fn as_str(self) -> &'static str {
        match self {
            FaceFormat::TrueType => "truetype",
            FaceFormat::Woff => "woff",
        }
    }

    /// MIME type the font host serves this format with.
    pub fn mime(self) -> &'static str {
        match self {
            FaceFormat::TrueType => "font/ttf",
            FaceFormat::Woff => "font/woff",
        }
    }

    /// Agent that makes the stylesheet endpoint pick this format. Unknown
    /// agents get TrueType.
    pub fn user_agent(self) -> &'static str {
        match self {
            FaceFormat::TrueType => fontpeek_http::http::USER_AGENT,
            FaceFormat::Woff => "Mozilla/5.0 (Windows NT 6.1; WOW64; Trident/7.0; rv:11.0) like Gecko",
        }
    }
}

impl FromStr for FaceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "truetype" | "ttf" => Ok(FaceFormat::TrueType),
            "woff" => Ok(FaceFormat::Woff),
            _ => Err(format!(
                "invalid face format '{s}' (expected one of: truetype, woff)"
            )),
        }
    }
}

impl fmt::Display for FaceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where to download a face and what it must be served as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFaceReference {
    /// Face URL. Empty when the stylesheet declared a face without a source.
    pub src: String,
    /// Expected `Content-Type` of the face response.
    pub content_type: String,
}

/// Resolves a family name to a [`FontFaceReference`].
pub trait FaceResolver {
    fn resolve(
        &self,
        cancel: &CancelToken,
        family: &str,
        transport: &dyn Transport,
    ) -> Result<FontFaceReference, FaceError>;
}

impl<R: FaceResolver + ?Sized> FaceResolver for &R {
    fn resolve(
        &self,
        cancel: &CancelToken,
        family: &str,
        transport: &dyn Transport,
    ) -> Result<FontFaceReference, FaceError> {
        (**self).resolve(cancel, family, transport)
    }
}

/// Resolver backed by the CSS2 stylesheet endpoint.
#[derive(Debug, Clone)]
pub struct CssFaceResolver {
    endpoint: String,
    format: FaceFormat,
}

impl Default for CssFaceResolver {
    fn default() -> Self {
        Self::new(FaceFormat::default())
    }
}

impl CssFaceResolver {
    pub fn new(format: FaceFormat) -> Self {
        Self {
            endpoint: CSS2_API.to_string(),
            format,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn format(&self) -> FaceFormat {
        self.format
    }

    fn stylesheet_request(&self, family: &str) -> Result<Request, FaceError> {
        let mut url = Url::parse(&self.endpoint)?;
        url.query_pairs_mut().append_pair("family", family);
        http::Request::get(url.as_str())
            .header(http::header::USER_AGENT, self.format.user_agent())
            .body(())
            .map_err(|e| {
                FaceError::Transport(TransportError::InvalidUrl {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            })
    }
}

impl FaceResolver for CssFaceResolver {
    fn resolve(
        &self,
        cancel: &CancelToken,
        family: &str,
        transport: &dyn Transport,
    ) -> Result<FontFaceReference, FaceError> {
        let request = self.stylesheet_request(family)?;
        let response = transport.execute(&request, cancel)?;
        let status = response.status();
        let body = response
            .into_body()
            .read_to_vec(MAX_STYLESHEET_SIZE, cancel)?;
        if status != http::StatusCode::OK {
            return Err(FaceError::Status {
                status: status.as_u16(),
            });
        }

        let css = String::from_utf8_lossy(&body);
        parse_font_face(&css, self.format).ok_or_else(|| FaceError::NoFontFace {
            family: family.to_string(),
        })
    }
}

/// Pull the first face out of an `@font-face` stylesheet.
///
/// Returns `None` when there is no `@font-face` rule at all, and a reference
/// with an empty `src` when a rule exists but names no URL.
pub fn parse_font_face(css: &str, requested: FaceFormat) -> Option<FontFaceReference> {
    if !css.contains("@font-face") {
        return None;
    }
    let Some(caps) = FONT_FACE_SRC.captures(css) else {
        return Some(FontFaceReference {
            src: String::new(),
            content_type: requested.mime().to_string(),
        });
    };
    let src = caps.get(1).map_or("", |m| m.as_str()).to_string();
    let content_type = caps
        .get(2)
        .and_then(|m| mime_for_format_hint(m.as_str()))
        .or_else(|| mime_for_extension(&src))
        .unwrap_or(requested.mime())
        .to_string();
    Some(FontFaceReference { src, content_type })
}

fn mime_for_format_hint(hint: &str) -> Option<&'static str> {
    match hint.to_ascii_lowercase().as_str() {
        "truetype" => Some("font/ttf"),
        "opentype" => Some("font/otf"),
        "woff" => Some("font/woff"),
        "woff2" => Some("font/woff2"),
        _ => None,
    }
}

fn mime_for_extension(src: &str) -> Option<&'static str> {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    let (_, ext) = path.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "ttf" => Some("font/ttf"),
        "otf" => Some("font/otf"),
        "woff" => Some("font/woff"),
        "woff2" => Some("font/woff2"),
        _ => None,
    }
}
