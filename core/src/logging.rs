//! Leveled, structured logging capability used by the client.
//!
//! The client only needs to emit a couple of entries per request, so the
//! interface is a single `log` call with key/value fields. `TracingLogger`
//! forwards to `tracing`; the backend (subscriber) is the application's
//! business.

use std::fmt::{self, Display, Write as _};

pub use tracing::Level;

/// A structured field: name and displayable value.
pub type Field<'a> = (&'static str, &'a dyn Display);

pub trait Logger: Send + Sync + fmt::Debug {
    /// Whether entries at `level` would be recorded.
    fn enabled(&self, level: Level) -> bool;

    fn log(&self, level: Level, message: &str, fields: &[Field<'_>]);
}

/// Forwards entries to `tracing` under the `circleci` target, dropping
/// anything more verbose than its own maximum level.
#[derive(Debug, Clone, Copy)]
pub struct TracingLogger {
    max_level: Level,
}

impl TracingLogger {
    pub fn new(max_level: Level) -> Self {
        Self { max_level }
    }

    pub fn max_level(&self) -> Level {
        self.max_level
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl Logger for TracingLogger {
    fn enabled(&self, level: Level) -> bool {
        // tracing orders levels by verbosity: ERROR < ... < TRACE
        level <= self.max_level
    }

    fn log(&self, level: Level, message: &str, fields: &[Field<'_>]) {
        if !self.enabled(level) {
            return;
        }
        let fields = render_fields(fields);
        match level {
            Level::ERROR => tracing::error!(target: "circleci", fields = %fields, "{message}"),
            Level::WARN => tracing::warn!(target: "circleci", fields = %fields, "{message}"),
            Level::INFO => tracing::info!(target: "circleci", fields = %fields, "{message}"),
            Level::DEBUG => tracing::debug!(target: "circleci", fields = %fields, "{message}"),
            _ => tracing::trace!(target: "circleci", fields = %fields, "{message}"),
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn enabled(&self, _level: Level) -> bool {
        false
    }

    fn log(&self, _level: Level, _message: &str, _fields: &[Field<'_>]) {}
}

/// `key=value` pairs separated by spaces; values containing whitespace are
/// quoted.
pub(crate) fn render_fields(fields: &[Field<'_>]) -> String {
    let mut out = String::new();
    for (i, (name, value)) in fields.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let value = value.to_string();
        if value.is_empty() || value.contains(char::is_whitespace) {
            let _ = write!(out, "{name}={value:?}");
        } else {
            let _ = write!(out, "{name}={value}");
        }
    }
    out
}
