//! Logging setup for spotcount binaries.
//!
//! Library code only talks to the `log` facade. A binary turns its
//! `--log-level` / `--log-format` strings into [`LogSettings`] and calls
//! [`init`] once. Everything goes to stderr, since stdout carries the spot
//! count.

use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::EnvFilter;

#[derive(thiserror::Error, Debug)]
pub enum LoggerError {
    #[error("unknown log level `{0}` (expected off, error, warn, info, debug or trace)")]
    UnknownLevel(String),
    #[error("unknown log format `{0}` (expected text or json)")]
    UnknownFormat(String),
    #[error(transparent)]
    Install(#[from] log::SetLoggerError),
}

/// Line layout of emitted records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// `[elapsed LEVEL target] message`
    #[default]
    Text,
    /// One JSON object per line with `elapsed`, `level`, `target`, `message`.
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(LoggerError::UnknownFormat(s.to_owned())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::Warn,
            format: LogFormat::Text,
        }
    }
}

impl LogSettings {
    /// Parse command-line names, rejecting anything unknown.
    pub fn parse(level: &str, format: &str) -> Result<Self, LoggerError> {
        Ok(Self {
            level: parse_level(level)?,
            format: format.parse()?,
        })
    }
}

/// Parse `off`, `error`, `warn`, `info`, `debug` or `trace` (any case).
pub fn parse_level(name: &str) -> Result<LevelFilter, LoggerError> {
    LevelFilter::from_str(name.trim()).map_err(|_| LoggerError::UnknownLevel(name.to_owned()))
}

struct StderrLogger {
    settings: LogSettings,
    started: Instant,
}

impl StderrLogger {
    fn render(&self, elapsed: f64, record: &Record) -> String {
        match self.settings.format {
            LogFormat::Text => format!(
                "[{:7.3}s {:>5} {}] {}",
                elapsed,
                record.level(),
                record.target(),
                record.args()
            ),
            LogFormat::Json => serde_json::json!({
                "elapsed": elapsed,
                "level": record.level().as_str(),
                "target": record.target(),
                "message": record.args().to_string(),
            })
            .to_string(),
        }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.settings.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.render(self.started.elapsed().as_secs_f64(), record);
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger. Later calls keep the first settings.
pub fn init(settings: LogSettings) -> Result<(), LoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StderrLogger {
            settings,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(settings.level);
    }
    Ok(())
}

/// Install a `tracing` subscriber on stderr instead of the plain logger.
///
/// `RUST_LOG` overrides `settings.level` when set. Span close events carry
/// per-stage timings.
#[cfg(feature = "tracing")]
pub fn init_tracing(settings: LogSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str().to_ascii_lowercase()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let _ = match settings.format {
        LogFormat::Json => builder.json().flatten_event(true).finish().try_init(),
        LogFormat::Text => builder
            .with_timer(tracing_subscriber::fmt::time::Uptime::default())
            .finish()
            .try_init(),
    };
}
