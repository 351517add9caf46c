//! Stderr logging for the binary.
//!
//! Routes the `log` facade to stderr as
//! `[timestamp] [LEVEL] [target] message` lines. Stdout stays reserved for
//! family names and image escape sequences.
//!
//! Level precedence: `--log-level`, then `-v` (debug), then `RUST_LOG`, then
//! warn.

use std::io::Write;
use std::str::FromStr;

use log::{LevelFilter, Log, Metadata, Record};

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            &chrono::Local::now().format("%H:%M:%S%.3f").to_string(),
            record,
        );
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn format_line(timestamp: &str, record: &Record<'_>) -> String {
    format!(
        "[{}] [{:<5}] [{}] {}\n",
        timestamp,
        record.level(),
        record.target(),
        record.args()
    )
}

/// Pick the effective level.
pub fn resolve_level(cli_level: Option<LevelFilter>, verbose: bool, rust_log: Option<&str>) -> LevelFilter {
    if let Some(level) = cli_level {
        return level;
    }
    if verbose {
        return LevelFilter::Debug;
    }
    rust_log
        .and_then(|value| LevelFilter::from_str(value.trim()).ok())
        .unwrap_or(LevelFilter::Warn)
}

/// Install the stderr logger. Only the first call installs anything.
pub fn init(cli_level: Option<LevelFilter>, verbose: bool) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let level = resolve_level(cli_level, verbose, rust_log.as_deref());
    let logger: &'static StderrLogger = Box::leak(Box::new(StderrLogger { level }));
    if log::set_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}
