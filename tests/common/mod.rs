//! Shared integration test helpers for fontpeek.
//!
//! `FakeWebfonts` answers the three kinds of request a run makes (catalog
//! listing, CSS2 stylesheet, font file) from memory, so whole `show`/`list`
//! runs can be driven without a network.
//!
//! Include with `mod common;` at the top of a test file.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

use fontpeek::{
    CssFaceResolver, FaceFormat, FamilyDescriptor, Fetcher, RenderLoop, TerminalEncoder, WebfontsCatalog,
};
use fontpeek_fonts::{RasterEngine, RasterError, Rasterizer, RenderConfig};
use fontpeek_http::{Body, CancelToken, Request, Response, Transport, TransportError};
use image::RgbaImage;
use ureq::http;
use url::Url;

pub const CATALOG_URL: &str = "https://api.fonts.test/v1/webfonts";
pub const CSS_URL: &str = "https://css.fonts.test/css2";
pub const FILES_URL: &str = "https://static.fonts.test/";

/// In-memory stand-in for the catalog, stylesheet and font file hosts.
pub struct FakeWebfonts {
    families: Vec<String>,
    missing: HashSet<String>,
    bodies: HashMap<String, Vec<u8>>,
    cancel_on: Option<(String, CancelToken)>,
    requests: RefCell<Vec<String>>,
}

impl FakeWebfonts {
    pub fn new(families: &[&str]) -> Self {
        Self {
            families: families.iter().map(|f| f.to_string()).collect(),
            missing: HashSet::new(),
            bodies: HashMap::new(),
            cancel_on: None,
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Font file for `family` answers 404.
    pub fn missing(mut self, family: &str) -> Self {
        self.missing.insert(family.to_string());
        self
    }

    /// Font file for `family` carries `body` instead of the default bytes.
    pub fn body(mut self, family: &str, body: &[u8]) -> Self {
        self.bodies.insert(family.to_string(), body.to_vec());
        self
    }

    /// Cancel `token` when the stylesheet for `family` is requested, as a
    /// Ctrl-C arriving mid-run would.
    pub fn cancel_on(mut self, family: &str, token: &CancelToken) -> Self {
        self.cancel_on = Some((family.to_string(), token.clone()));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    fn file_url(family: &str) -> String {
        format!("{FILES_URL}{}.ttf", family.replace(' ', "_"))
    }

    fn catalog(&self) -> (u16, &'static str, Vec<u8>) {
        let items: Vec<String> = self
            .families
            .iter()
            .map(|f| format!(r#"{{"family":"{f}","category":"sans-serif","variants":["regular"]}}"#))
            .collect();
        let body = format!(r#"{{"kind":"webfonts#webfontList","items":[{}]}}"#, items.join(","));
        (200, "application/json; charset=UTF-8", body.into_bytes())
    }

    fn stylesheet(&self, url: &Url) -> (u16, &'static str, Vec<u8>) {
        let family = url
            .query_pairs()
            .find(|(k, _)| k == "family")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        if !self.families.contains(&family) {
            return (400, "text/html", b"Bad Request".to_vec());
        }
        let css = format!(
            "@font-face {{\n  font-family: '{family}';\n  src: url({}) format('truetype');\n}}\n",
            Self::file_url(&family)
        );
        (200, "text/css; charset=utf-8", css.into_bytes())
    }

    fn font_file(&self, url: &str) -> (u16, &'static str, Vec<u8>) {
        let family = self
            .families
            .iter()
            .find(|f| Self::file_url(f) == url)
            .filter(|f| !self.missing.contains(*f));
        match family {
            Some(f) => (
                200,
                "font/ttf",
                self.bodies.get(f).cloned().unwrap_or_else(|| b"font".to_vec()),
            ),
            None => (404, "text/html; charset=UTF-8", b"<html>Not Found</html>".to_vec()),
        }
    }
}

impl Transport for FakeWebfonts {
    fn execute(&self, request: &Request, cancel: &CancelToken) -> Result<Response, TransportError> {
        let url = request.uri().to_string();
        let parsed = Url::parse(&url).expect("requests carry absolute URLs");
        if let Some((family, token)) = &self.cancel_on {
            let requested = parsed.query_pairs().any(|(k, v)| k == "family" && v == family.as_str());
            if url.starts_with(CSS_URL) && requested {
                token.cancel();
            }
        }
        cancel.check()?;
        self.requests.borrow_mut().push(url.clone());

        let (status, content_type, body) = if url.starts_with(CATALOG_URL) {
            self.catalog()
        } else if url.starts_with(CSS_URL) {
            self.stylesheet(&parsed)
        } else {
            self.font_file(&url)
        };
        Ok(http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, content_type)
            .body(Body::from_bytes(body))
            .expect("static response parts are valid"))
    }
}

/// Panics on bytes starting with `panic`, otherwise paints a 2x1 background.
pub struct TrippingEngine;

impl RasterEngine for TrippingEngine {
    fn rasterize(&self, data: &[u8], config: &RenderConfig) -> Result<RgbaImage, RasterError> {
        if data.starts_with(b"panic") {
            panic!("glyph outline out of bounds");
        }
        Ok(RgbaImage::from_pixel(2, 1, config.background.into()))
    }
}

/// Writes `<image WxH>` instead of an escape sequence.
pub struct TextEncoder;

impl TerminalEncoder for TextEncoder {
    fn encode(&self, sink: &mut dyn Write, image: &RgbaImage) -> io::Result<()> {
        writeln!(sink, "<image {}x{}>", image.width(), image.height())
    }
}

pub fn catalog<T: Transport>(transport: T) -> WebfontsCatalog<T> {
    WebfontsCatalog::new(transport).with_endpoint(CATALOG_URL)
}

pub fn render_loop<T: Transport>(
    transport: T,
) -> RenderLoop<CssFaceResolver, T, TrippingEngine, TextEncoder> {
    RenderLoop::new(
        Fetcher::new(
            CssFaceResolver::new(FaceFormat::TrueType).with_endpoint(CSS_URL),
            transport,
        ),
        Rasterizer::with_engine(TrippingEngine, RenderConfig::default()),
        TextEncoder,
    )
}

pub fn names(families: &[FamilyDescriptor]) -> Vec<&str> {
    families.iter().map(|f| f.family.as_str()).collect()
}
