//! fontpeek - preview Google webfonts in the terminal.
//!
//! A run lists the catalog, selects families with glob patterns, then for each
//! one downloads a font face, rasterizes a sample and writes it to the
//! terminal with the kitty or iTerm2 graphics protocol.
//!
//! Transport, caching and cancellation live in `fontpeek-http`; shaping and
//! rasterization in `fontpeek-fonts`. This crate holds the catalog and face
//! clients, the matcher, the render loop and the command-line front end.

/// Application version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod face;
pub mod fetch;
pub mod graphics;
pub mod logging;
pub mod matcher;
pub mod render;

#[cfg(test)]
mod test_support;

pub use catalog::{Catalog, CatalogError, FamilyDescriptor, SortOrder, WebfontsCatalog};
pub use config::{Config, ConfigError, ConfigOverrides};
pub use error::{FamilyError, FontpeekError};
pub use face::{CssFaceResolver, FaceError, FaceFormat, FaceResolver, FontFaceReference};
pub use fetch::Fetcher;
pub use graphics::{GraphicsProtocol, Iterm2Encoder, KittyEncoder, TerminalEncoder};
pub use matcher::{Glob, GlobError, Matcher};
pub use render::{RenderLoop, RenderSummary};
