//! Typed errors for a fontpeek run.
//!
//! [`FontpeekError`] aborts the invocation. [`FamilyError`] belongs to one
//! family: the render loop prints it inline and moves on to the next family.
//!
//! Wrapping variants put the inner error in their message and expose no
//! `source()`, so `{:#}` and anyhow's cause chain print it once.

use std::io;

use fontpeek_fonts::RasterError;
use fontpeek_http::{CacheError, Canceled, TransportError};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::face::FaceError;

/// Failures that stop the whole invocation.
#[derive(Debug, Error)]
pub enum FontpeekError {
    /// A glob pattern did not compile. Reported before any network I/O.
    #[error("bad pattern {pattern:?} ({index}): {reason}")]
    InvalidPattern {
        pattern: String,
        index: usize,
        reason: String,
    },

    #[error("must provide an API key (--key or api_key in the config file)")]
    MissingCredential,

    #[error("terminal graphics not available (set --protocol to kitty or iterm2 to force)")]
    TerminalUnsupported,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unable to retrieve font families: {0}")]
    Catalog(CatalogError),

    #[error("unable to set up the cache: {0}")]
    Cache(CacheError),

    #[error("operation canceled")]
    Canceled,

    #[error("write failed: {0}")]
    Io(io::Error),
}

impl From<CatalogError> for FontpeekError {
    fn from(e: CatalogError) -> Self {
        FontpeekError::Catalog(e)
    }
}

impl From<CacheError> for FontpeekError {
    fn from(e: CacheError) -> Self {
        FontpeekError::Cache(e)
    }
}

impl From<io::Error> for FontpeekError {
    fn from(e: io::Error) -> Self {
        FontpeekError::Io(e)
    }
}

impl From<Canceled> for FontpeekError {
    fn from(_: Canceled) -> Self {
        FontpeekError::Canceled
    }
}

/// Failures confined to a single family.
#[derive(Debug, Error)]
pub enum FamilyError {
    #[error("unable to retrieve font face: {0}")]
    FaceResolutionFailed(FaceError),

    #[error("missing face src")]
    MissingFaceSource,

    #[error("unable to retrieve font: {0}")]
    FetchFailed(TransportError),

    #[error("bad font data, status: {status}, content-type: {content_type:?} (expected {expected:?})")]
    InvalidResponse {
        status: u16,
        content_type: String,
        expected: String,
    },

    #[error("unable to read font: {0}")]
    BodyReadFailed(TransportError),

    #[error("unable to rasterize font: {0}")]
    RasterizeFailed(RasterError),

    #[error("unable to encode image: {0}")]
    EncodeFailed(io::Error),

    #[error("operation canceled")]
    Canceled,
}

impl FamilyError {
    pub fn is_canceled(&self) -> bool {
        match self {
            FamilyError::Canceled => true,
            FamilyError::FaceResolutionFailed(e) => e.is_canceled(),
            _ => false,
        }
    }
}

impl From<Canceled> for FamilyError {
    fn from(_: Canceled) -> Self {
        FamilyError::Canceled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_response_mentions_status() {
        let err = FamilyError::InvalidResponse {
            status: 404,
            content_type: "text/html".to_string(),
            expected: "font/ttf".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404"), "{msg}");
        assert!(msg.contains("text/html"), "{msg}");
    }

    #[test]
    fn test_invalid_pattern_names_pattern_and_index() {
        let err = FontpeekError::InvalidPattern {
            pattern: "[a".to_string(),
            index: 2,
            reason: "unclosed character class".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "bad pattern \"[a\" (2): unclosed character class"
        );
    }

    /// Render an error the way anyhow's `{:#}` does: each cause joined by ": ".
    fn chain(err: &dyn std::error::Error) -> String {
        let mut text = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            text.push_str(": ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        text
    }

    #[test]
    fn test_wrapped_errors_are_printed_once() {
        let read = || io::Error::new(io::ErrorKind::ConnectionReset, "connection reset");
        let fetch = FamilyError::FetchFailed(TransportError::Io(read()));
        assert_eq!(chain(&fetch), "unable to retrieve font: I/O error: connection reset");

        let body = FamilyError::BodyReadFailed(TransportError::Io(read()));
        assert_eq!(chain(&body), "unable to read font: I/O error: connection reset");

        let run = FontpeekError::from(CatalogError::from(TransportError::Io(read())));
        let text = chain(&run);
        assert_eq!(text.matches("connection reset").count(), 1, "{text}");
        assert_eq!(
            format!("{:#}", anyhow::Error::from(run)),
            "unable to retrieve font families: request failed: I/O error: connection reset"
        );
    }

    #[test]
    fn test_rasterize_failed_keeps_panic_text() {
        let err = FamilyError::RasterizeFailed(RasterError::Panicked("boom".to_string()));
        assert_eq!(err.to_string(), "unable to rasterize font: caught panic: boom");
    }
}
