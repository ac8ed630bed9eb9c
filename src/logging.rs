//! Structured logging setup.
//!
//! `tracing-subscriber` with an `EnvFilter` and a JSON or pretty `fmt` layer,
//! optionally writing through a `tracing-appender` non-blocking worker.
//!
//! | Variable                 | Values                          | Default |
//! |--------------------------|---------------------------------|---------|
//! | `SWAGGERIZE_LOG_LEVEL`   | trace, debug, info, warn, error | info    |
//! | `SWAGGERIZE_LOG_FORMAT`  | json, pretty                    | json    |
//! | `SWAGGERIZE_LOG_ASYNC`   | true, false                     | false   |
//! | `SWAGGERIZE_LOG_TARGETS` | extra comma-separated directives| none    |
//!
//! `RUST_LOG`, when set, replaces the level.

use anyhow::{Context, Result};
use std::env;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Anything other than `pretty` is JSON.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("pretty") {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
    pub async_logging: bool,
    pub target_filter: Option<String>,
    /// Include file and line (development only)
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            async_logging: false,
            target_filter: None,
            include_location: false,
        }
    }
}

impl LogConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            level: env::var("SWAGGERIZE_LOG_LEVEL").unwrap_or(defaults.level),
            format: env::var("SWAGGERIZE_LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.format),
            async_logging: env::var("SWAGGERIZE_LOG_ASYNC")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.async_logging),
            target_filter: env::var("SWAGGERIZE_LOG_TARGETS").ok(),
            include_location: defaults.include_location,
        }
    }

    /// The filter this config produces, ignoring `RUST_LOG`.
    pub fn filter(&self) -> EnvFilter {
        let level = match self.level.to_ascii_lowercase().as_str() {
            lvl @ ("trace" | "debug" | "info" | "warn" | "error") => lvl.to_string(),
            _ => "info".to_string(),
        };
        let mut filter = EnvFilter::new(level);
        if let Ok(directive) = "may_minihttp=warn".parse() {
            filter = filter.add_directive(directive);
        }
        for raw in self
            .target_filter
            .iter()
            .flat_map(|t| t.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            match raw.parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(_) => eprintln!("Ignoring invalid log directive: {raw}"),
            }
        }
        filter
    }
}

/// Install the global subscriber.
///
/// With async logging the returned guard flushes buffered lines on drop; keep
/// it alive for the life of the process.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| config.filter());

    let (writer, guard) = if config.async_logging {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        (tracing_subscriber::fmt::writer::BoxMakeWriter::new(writer), Some(guard))
    } else {
        (
            tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stdout),
            None,
        )
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("failed to initialize logging")?;
    Ok(guard)
}
