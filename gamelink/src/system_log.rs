//! Forwarding tracing events to the host's system log.
//!
//! [`SyslogLayer`] formats each event that passes the subscriber's filter as
//! one line and hands it to a [`SyslogWriter`] together with its severity.
//! The production writer is an RFC 3164 logger on the local `/dev/log`
//! socket, tagged with the configured program identifier.

use std::fmt::{self, Write as _};
use std::io;

use parking_lot::Mutex;
use syslog::{Facility, Formatter3164, LoggerBackend};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::logging::LogLevel;

/// Destination for formatted system-log lines.
pub trait SyslogWriter: Send + 'static {
    /// Write one message at `level`.
    fn write(&mut self, level: LogLevel, message: &str) -> io::Result<()>;
}

impl SyslogWriter for syslog::Logger<LoggerBackend, Formatter3164> {
    fn write(&mut self, level: LogLevel, message: &str) -> io::Result<()> {
        let res = match level {
            LogLevel::Error => self.err(message),
            LogLevel::Warn => self.warning(message),
            LogLevel::Info => self.info(message),
            LogLevel::Debug => self.debug(message),
        };
        res.map_err(|e| io::Error::other(e.to_string()))
    }
}

/// `tracing_subscriber` layer writing events to a [`SyslogWriter`].
pub struct SyslogLayer {
    writer: Mutex<Box<dyn SyslogWriter>>,
}

impl SyslogLayer {
    /// Layer over an arbitrary writer.
    pub fn new(writer: impl SyslogWriter) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Connect to the local system log as `ident` (daemon facility).
    pub fn connect(ident: &str) -> io::Result<Self> {
        let formatter = Formatter3164 {
            facility: Facility::LOG_DAEMON,
            hostname: None,
            process: ident.to_string(),
            pid: std::process::id(),
        };
        let logger = syslog::unix(formatter).map_err(|e| io::Error::other(e.to_string()))?;
        Ok(Self::new(logger))
    }
}

impl fmt::Debug for SyslogLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyslogLayer").finish_non_exhaustive()
    }
}

impl<S: Subscriber> Layer<S> for SyslogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut line = LineVisitor::default();
        event.record(&mut line);
        let level = severity(event.metadata().level());
        // The system log is best effort; a failed write never reaches the caller.
        let _ = self.writer.lock().write(level, &line.0);
    }
}

fn severity(level: &Level) -> LogLevel {
    match *level {
        Level::ERROR => LogLevel::Error,
        Level::WARN => LogLevel::Warn,
        Level::INFO => LogLevel::Info,
        _ => LogLevel::Debug,
    }
}

/// Message first, then `key=value` for the remaining fields.
#[derive(Default)]
struct LineVisitor(String);

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let fields = std::mem::take(&mut self.0);
            let _ = write!(self.0, "{value:?}{fields}");
        } else {
            let _ = write!(self.0, " {}={:?}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            let fields = std::mem::take(&mut self.0);
            let _ = write!(self.0, "{value}{fields}");
        } else {
            let _ = write!(self.0, " {}={}", field.name(), value);
        }
    }
}
