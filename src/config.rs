//! Configuration: an optional YAML file overlaid with command-line flags.
//!
//! The file lives at `~/.config/fontpeek/config.yaml` (`%APPDATA%\fontpeek`
//! on Windows). A missing file means defaults. Every field is optional.
//!
//! ```yaml
//! api_key: "AIza..."
//! sort: popularity
//! face_format: truetype
//! protocol: kitty
//! cache:
//!   ttl_days: 7
//! render:
//!   size: 32
//!   foreground: "#333333"
//!   text: ["Sphinx of black quartz, judge my vow"]
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fontpeek_fonts::{FontStyle, FontVariant, RenderConfig, Rgba};
use fontpeek_http::{CacheError, CacheOptions, Logger};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::SortOrder;
use crate::face::FaceFormat;
use crate::graphics::GraphicsProtocol;

/// Application name used for config and cache directories.
pub const APP_NAME: &str = "fontpeek";

/// Cache subdirectory holding catalog, stylesheet and font responses.
pub const CACHE_NAME: &str = "webfonts";

/// Longest accepted cache lifetime.
pub const MAX_TTL_DAYS: u64 = 3650;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config {path:?}: {error}")]
    Io { path: PathBuf, error: io::Error },

    #[error("YAML parse error in config {path:?}: {error}")]
    Parse {
        path: PathBuf,
        error: serde_yaml_ng::Error,
    },

    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Disk cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Overrides the platform cache directory.
    pub dir: Option<PathBuf>,
    pub ttl_days: u64,
    pub compress: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            ttl_days: 14,
            compress: true,
        }
    }
}

/// Everything a run needs to know, built once at startup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub cache: CacheConfig,
    pub render: RenderConfig,
    pub face_format: FaceFormat,
    /// Forces a graphics protocol instead of detecting one.
    pub protocol: Option<GraphicsProtocol>,
    pub sort: Option<SortOrder>,
}

/// Values given on the command line. `None` keeps the file/default value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub size: Option<u32>,
    pub style: Option<FontStyle>,
    pub variant: Option<FontVariant>,
    pub foreground: Option<Rgba>,
    pub background: Option<Rgba>,
    pub dpi: Option<u32>,
    pub margin: Option<u32>,
    pub text: Vec<String>,
    pub face_format: Option<FaceFormat>,
    pub protocol: Option<GraphicsProtocol>,
    pub sort: Option<SortOrder>,
    pub cache_dir: Option<PathBuf>,
    pub no_cache: bool,
}

impl Config {
    /// Default config file location.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    pub fn config_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            dirs::config_dir()
                .map(|dir| dir.join(APP_NAME))
                .unwrap_or_else(|| PathBuf::from("."))
        }
        #[cfg(not(target_os = "windows"))]
        {
            dirs::home_dir()
                .map(|home| home.join(".config").join(APP_NAME))
                .unwrap_or_else(|| PathBuf::from("."))
        }
    }

    /// Load from `path`, or from [`Config::config_path`] when `None`.
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::config_path(), false),
        };
        match fs::read_to_string(&path) {
            Ok(contents) => {
                log::info!("Loading config from {:?}", path);
                Self::from_yaml(&contents).map_err(|error| ConfigError::Parse { path, error })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound && !explicit => {
                log::debug!("Config file {:?} not found, using defaults", path);
                Ok(Self::default())
            }
            Err(error) => Err(ConfigError::Io { path, error }),
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml_ng::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(contents)
    }

    /// Overlay command-line values.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(key) = overrides.api_key {
            self.api_key = Some(key);
        }
        let render = &mut self.render;
        if let Some(size) = overrides.size {
            render.size = size;
        }
        if let Some(style) = overrides.style {
            render.style = style;
        }
        if let Some(variant) = overrides.variant {
            render.variant = variant;
        }
        if let Some(fg) = overrides.foreground {
            render.foreground = fg;
        }
        if let Some(bg) = overrides.background {
            render.background = bg;
        }
        if let Some(dpi) = overrides.dpi {
            render.dpi = dpi;
        }
        if let Some(margin) = overrides.margin {
            render.margin = margin;
        }
        if !overrides.text.is_empty() {
            render.text = overrides.text;
        }
        if let Some(format) = overrides.face_format {
            self.face_format = format;
        }
        if overrides.protocol.is_some() {
            self.protocol = overrides.protocol;
        }
        if overrides.sort.is_some() {
            self.sort = overrides.sort;
        }
        if overrides.cache_dir.is_some() {
            self.cache.dir = overrides.cache_dir;
        }
        if overrides.no_cache {
            self.cache.enabled = false;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let render = &self.render;
        if !(1..=1000).contains(&render.size) {
            return Err(ConfigError::Validation(format!(
                "font size must be between 1 and 1000, got {}",
                render.size
            )));
        }
        if !(1..=2400).contains(&render.dpi) {
            return Err(ConfigError::Validation(format!(
                "dpi must be between 1 and 2400, got {}",
                render.dpi
            )));
        }
        if render.margin > 1000 {
            return Err(ConfigError::Validation(format!(
                "margin must be at most 1000, got {}",
                render.margin
            )));
        }
        if !(1..=MAX_TTL_DAYS).contains(&self.cache.ttl_days) {
            return Err(ConfigError::Validation(format!(
                "cache ttl_days must be between 1 and {MAX_TTL_DAYS}, got {}",
                self.cache.ttl_days
            )));
        }
        Ok(())
    }

    /// API key, if one was configured and is not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Disk cache options, or `None` when caching is disabled.
    pub fn cache_options(&self, logger: Logger) -> Result<Option<CacheOptions>, CacheError> {
        if !self.cache.enabled {
            return Ok(None);
        }
        let options = match &self.cache.dir {
            Some(dir) => CacheOptions::new(dir.clone()),
            None => CacheOptions::app_cache_dir(APP_NAME, CACHE_NAME)?,
        };
        Ok(Some(
            options
                .with_ttl(Duration::from_secs(self.cache.ttl_days.saturating_mul(SECS_PER_DAY)))
                .with_gzip_compression(self.cache.compress)
                .with_logger(logger),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_days, 14);
        assert!(config.cache.compress);
        assert_eq!(config.render.size, 48);
        assert_eq!(config.face_format, FaceFormat::TrueType);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let config = Config::from_yaml(
            "api_key: abc\nsort: popularity\nrender:\n  size: 32\n  background: '#000'\ncache:\n  ttl_days: 3\n",
        )
        .unwrap();
        assert_eq!(config.api_key(), Some("abc"));
        assert_eq!(config.sort, Some(SortOrder::Popularity));
        assert_eq!(config.render.size, 32);
        assert_eq!(config.render.background, Rgba::BLACK);
        assert_eq!(config.render.dpi, 100);
        assert_eq!(config.cache.ttl_days, 3);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
        assert_eq!(Config::from_yaml("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_bad_color_is_parse_error() {
        assert!(Config::from_yaml("render:\n  foreground: not-a-color\n").is_err());
    }

    #[test]
    fn test_overrides_win() {
        let mut config = Config::from_yaml("api_key: file\nrender:\n  size: 32\n").unwrap();
        config.apply(ConfigOverrides {
            api_key: Some("flag".to_string()),
            size: Some(20),
            style: Some(FontStyle::Italic),
            text: vec!["Hello".to_string()],
            no_cache: true,
            ..Default::default()
        });
        assert_eq!(config.api_key(), Some("flag"));
        assert_eq!(config.render.size, 20);
        assert_eq!(config.render.style, FontStyle::Italic);
        assert_eq!(config.render.text, vec!["Hello".to_string()]);
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_empty_overrides_keep_file_values() {
        let mut config = Config::from_yaml("protocol: kitty\nrender:\n  text: [one]\n").unwrap();
        config.apply(ConfigOverrides::default());
        assert_eq!(config.protocol, Some(GraphicsProtocol::Kitty));
        assert_eq!(config.render.text, vec!["one".to_string()]);
    }

    #[test]
    fn test_validation_bounds() {
        let mut config = Config::default();
        config.render.size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = Config::default();
        config.render.dpi = 5000;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.render.margin = 1001;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cache.ttl_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_huge_ttl_is_rejected_and_does_not_overflow() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::from_yaml("cache:\n  ttl_days: 18446744073709551615\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        config.cache.dir = Some(dir.path().to_path_buf());

        let options = config.cache_options(Logger::noop()).unwrap().unwrap();
        assert_eq!(options.ttl(), Duration::from_secs(u64::MAX));

        let mut config = Config::default();
        config.cache.ttl_days = MAX_TTL_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let config = Config {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_key(), None);
    }

    #[test]
    fn test_load_from_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "face_format: woff\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.face_format, FaceFormat::Woff);

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            Config::load(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_cache_options_honor_settings() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.cache.dir = Some(dir.path().to_path_buf());
        config.cache.ttl_days = 2;

        let options = config.cache_options(Logger::noop()).unwrap().unwrap();
        assert_eq!(options.dir(), dir.path());
        assert_eq!(options.ttl(), Duration::from_secs(2 * 24 * 60 * 60));

        config.cache.enabled = false;
        assert!(config.cache_options(Logger::noop()).unwrap().is_none());
    }
}
