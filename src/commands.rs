//! Subcommand implementations.
//!
//! [`list`] and [`show`] take their collaborators as arguments so they can run
//! against fakes; [`run`] builds the real ones from the command line and the
//! config file.

use std::io::Write;

use fontpeek_fonts::{RasterEngine, Rasterizer};
use fontpeek_http::{CancelToken, DiskCache, Logger, LoggingTransport, Transport, UreqTransport};

use crate::catalog::{Catalog, CatalogError, FamilyDescriptor, WebfontsCatalog};
use crate::cli::{Cli, Commands, SharedArgs};
use crate::config::Config;
use crate::error::FontpeekError;
use crate::face::{CssFaceResolver, FaceResolver};
use crate::fetch::Fetcher;
use crate::graphics::{GraphicsProtocol, TerminalEncoder};
use crate::matcher::Matcher;
use crate::render::{RenderLoop, RenderSummary};

/// Target for HTTP and cache activity forwarded to the `log` facade.
const HTTP_LOG_TARGET: &str = "fontpeek::http";

fn catalog_error(e: CatalogError) -> FontpeekError {
    match e {
        CatalogError::Canceled => FontpeekError::Canceled,
        other => FontpeekError::Catalog(other),
    }
}

/// Write one family name per line, in catalog order.
pub fn list<C: Catalog, W: Write + ?Sized>(
    cancel: &CancelToken,
    api_key: &str,
    catalog: &C,
    long: bool,
    out: &mut W,
) -> Result<usize, FontpeekError> {
    let families = catalog.families(cancel, api_key).map_err(catalog_error)?;
    for family in &families {
        if long {
            writeln!(out, "{}", describe(family))?;
        } else {
            writeln!(out, "{}", family.family)?;
        }
    }
    out.flush()?;
    Ok(families.len())
}

fn describe(family: &FamilyDescriptor) -> String {
    format!(
        "{}\t{}\t{}",
        family.family,
        family.category,
        family.variants.join(",")
    )
}

/// Render previews for the families selected by `patterns` (or all of them).
///
/// Patterns are compiled before the catalog is requested, so a bad pattern
/// costs no network traffic.
pub fn show<C, R, T, E, N, W>(
    cancel: &CancelToken,
    api_key: &str,
    patterns: &[String],
    all: bool,
    catalog: &C,
    render_loop: &RenderLoop<R, T, E, N>,
    out: &mut W,
) -> Result<RenderSummary, FontpeekError>
where
    C: Catalog,
    R: FaceResolver,
    T: Transport,
    E: RasterEngine,
    N: TerminalEncoder,
    W: Write + ?Sized,
{
    let matcher = Matcher::new(patterns, all)?;
    let families = catalog.families(cancel, api_key).map_err(catalog_error)?;
    let selected = matcher.select(&families);
    log::info!(
        "{} of {} families selected",
        selected.len(),
        families.len()
    );
    render_loop.run(cancel, &selected, out)
}

/// Logger handed to the transport stack: forwards to `log` when HTTP debug
/// output would be shown, otherwise a no-op.
fn http_logger() -> Logger {
    if log::log_enabled!(target: HTTP_LOG_TARGET, log::Level::Debug) {
        Logger::log_facade(HTTP_LOG_TARGET)
    } else {
        Logger::noop()
    }
}

fn load_config(shared: &SharedArgs) -> Result<Config, FontpeekError> {
    let mut config = Config::load(shared.config.as_deref())?;
    config.apply(shared.overrides());
    config.validate()?;
    Ok(config)
}

fn require_key(config: &Config) -> Result<String, FontpeekError> {
    config
        .api_key()
        .map(str::to_string)
        .ok_or(FontpeekError::MissingCredential)
}

/// Network transport, wrapped in the disk cache unless caching is off.
fn build_transport(config: &Config, logger: &Logger) -> Result<Box<dyn Transport>, FontpeekError> {
    let network = LoggingTransport::new(UreqTransport::new(), logger.clone());
    match config.cache_options(logger.clone())? {
        Some(options) => {
            log::debug!("cache dir: {:?}", options.dir());
            Ok(Box::new(DiskCache::new(network, options)?))
        }
        None => Ok(Box::new(network)),
    }
}

/// Run the parsed command line.
pub fn run<W: Write + ?Sized>(cli: &Cli, cancel: &CancelToken, out: &mut W) -> Result<(), FontpeekError> {
    match &cli.command {
        Commands::List { long, shared } => {
            let config = load_config(shared)?;
            let api_key = require_key(&config)?;
            let logger = http_logger();
            let transport = build_transport(&config, &logger)?;
            let catalog = WebfontsCatalog::new(&*transport)
                .with_sort(config.sort)
                .with_logger(logger);
            list(cancel, &api_key, &catalog, *long, out)?;
            Ok(())
        }
        Commands::Show {
            patterns,
            all,
            shared,
        } => {
            let config = load_config(shared)?;
            let protocol = config
                .protocol
                .or_else(GraphicsProtocol::detect)
                .ok_or(FontpeekError::TerminalUnsupported)?;
            log::debug!("graphics protocol: {protocol}");
            let api_key = require_key(&config)?;

            // Fail on bad patterns before touching the cache directory.
            Matcher::new(patterns, *all)?;

            let logger = http_logger();
            let transport = build_transport(&config, &logger)?;
            let catalog = WebfontsCatalog::new(&*transport)
                .with_sort(config.sort)
                .with_logger(logger.clone());
            let fetcher = Fetcher::new(CssFaceResolver::new(config.face_format), &*transport)
                .with_logger(logger.clone());
            let render_loop = RenderLoop::new(
                fetcher,
                Rasterizer::new(config.render.clone()),
                protocol.encoder(),
            )
            .with_logger(logger);

            let summary = show(cancel, &api_key, patterns, *all, &catalog, &render_loop, out)?;
            log::info!("{summary}");
            Ok(())
        }
        Commands::ClearCache { shared } => {
            let config = load_config(shared)?;
            let Some(options) = config.cache_options(Logger::noop())? else {
                writeln!(out, "cache disabled")?;
                return Ok(());
            };
            let dir = options.dir().to_path_buf();
            let removed = DiskCache::new(UreqTransport::new(), options)?.clear()?;
            writeln!(out, "removed {removed} cached entries from {}", dir.display())?;
            Ok(())
        }
    }
}
