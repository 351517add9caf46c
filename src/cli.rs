//! Command-line interface for fontpeek.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fontpeek_fonts::{FontStyle, FontVariant, Rgba};

use crate::catalog::SortOrder;
use crate::config::ConfigOverrides;
use crate::face::FaceFormat;
use crate::graphics::GraphicsProtocol;

/// fontpeek - a command-line Google webfonts viewer
#[derive(Debug, Parser)]
#[command(name = "fontpeek")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show available font families
    List {
        /// Also print category and variants
        #[arg(short, long)]
        long: bool,

        #[command(flatten)]
        shared: SharedArgs,
    },

    /// Show font previews for families matching the given glob patterns
    Show {
        /// Glob patterns (`*`, `?`, `[a-z]`, `[!x]`, `{a,b}`) matched against family names
        #[arg(value_name = "PATTERN")]
        patterns: Vec<String>,

        /// Show every family in the catalog
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        shared: SharedArgs,
    },

    /// Remove all cached responses
    ClearCache {
        #[command(flatten)]
        shared: SharedArgs,
    },
}

impl Commands {
    pub fn shared(&self) -> &SharedArgs {
        match self {
            Commands::List { shared, .. }
            | Commands::Show { shared, .. }
            | Commands::ClearCache { shared } => shared,
        }
    }
}

/// Log level argument for CLI
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    /// Convert to `log::LevelFilter`
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevelArg::Off => log::LevelFilter::Off,
            LogLevelArg::Error => log::LevelFilter::Error,
            LogLevelArg::Warn => log::LevelFilter::Warn,
            LogLevelArg::Info => log::LevelFilter::Info,
            LogLevelArg::Debug => log::LevelFilter::Debug,
            LogLevelArg::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Flags accepted by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct SharedArgs {
    /// Google Fonts Developer API key
    #[arg(long, value_name = "KEY")]
    pub key: Option<String>,

    /// Log HTTP requests and cache activity to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Set log level (overrides --verbose and RUST_LOG)
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevelArg>,

    /// Config file (default: ~/.config/fontpeek/config.yaml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Font preview size in points [default: 48]
    #[arg(long, value_name = "SIZE")]
    pub font_size: Option<u32>,

    /// Font preview style: regular, bold, italic, bold-italic
    #[arg(long, value_name = "STYLE")]
    pub font_style: Option<FontStyle>,

    /// Font preview variant: normal, small-caps, superscript, subscript
    #[arg(long, value_name = "VARIANT")]
    pub font_variant: Option<FontVariant>,

    /// Font preview foreground color [default: black]
    #[arg(long, value_name = "COLOR")]
    pub font_fg: Option<Rgba>,

    /// Font preview background color [default: white]
    #[arg(long, value_name = "COLOR")]
    pub font_bg: Option<Rgba>,

    /// Font preview DPI [default: 100]
    #[arg(long = "font-dpi", value_name = "DPI")]
    pub font_dpi: Option<u32>,

    /// Font preview margin in points [default: 5]
    #[arg(long, value_name = "POINTS")]
    pub font_margin: Option<u32>,

    /// Sample text line (repeat for several lines)
    #[arg(long, value_name = "TEXT")]
    pub text: Vec<String>,

    /// Font face format to download: truetype, woff
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<FaceFormat>,

    /// Graphics protocol to use instead of detecting one: kitty, iterm2
    #[arg(long, value_name = "PROTOCOL")]
    pub protocol: Option<GraphicsProtocol>,

    /// Catalog sort order: alpha, date, popularity, style, trending
    #[arg(long, value_name = "ORDER")]
    pub sort: Option<SortOrder>,

    /// Cache directory (default: platform cache dir)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Bypass the on-disk cache
    #[arg(long)]
    pub no_cache: bool,
}

impl SharedArgs {
    pub fn log_level(&self) -> Option<log::LevelFilter> {
        self.log_level.map(LogLevelArg::to_level_filter)
    }

    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_key: self.key.clone(),
            size: self.font_size,
            style: self.font_style,
            variant: self.font_variant,
            foreground: self.font_fg,
            background: self.font_bg,
            dpi: self.font_dpi,
            margin: self.font_margin,
            text: self.text.clone(),
            face_format: self.format,
            protocol: self.protocol,
            sort: self.sort,
            cache_dir: self.cache_dir.clone(),
            no_cache: self.no_cache,
        }
    }
}
