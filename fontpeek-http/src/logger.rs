//! Per-run logging capability.
//!
//! Components that want to report progress take a [`Logger`] by value or
//! reference instead of reaching for a global. The default logger discards
//! everything.

use std::fmt;
use std::sync::Arc;

type LogFn = dyn Fn(fmt::Arguments<'_>) + Send + Sync;

/// A cloneable logging sink. `Logger::default()` is a no-op.
#[derive(Clone, Default)]
pub struct Logger {
    sink: Option<Arc<LogFn>>,
}

impl Logger {
    /// A logger that drops every message.
    pub fn noop() -> Self {
        Self::default()
    }

    /// Wrap an arbitrary closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(fmt::Arguments<'_>) + Send + Sync + 'static,
    {
        Self {
            sink: Some(Arc::new(f)),
        }
    }

    /// Forward messages to the `log` facade at debug level under `target`.
    pub fn log_facade(target: &'static str) -> Self {
        Self::from_fn(move |args| log::debug!(target: target, "{}", args))
    }

    /// Whether messages go anywhere. Lets callers skip expensive formatting.
    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn log(&self, args: fmt::Arguments<'_>) {
        if let Some(sink) = &self.sink {
            sink(args);
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
