//! Logging setup shared by the wellsync binaries.
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! caller's job and happens once, through [`init_tracing`].
//!
//! ```ignore
//! use wellsync_core::tracing::{init_tracing, LogConfig};
//!
//! init_tracing(LogConfig::cli())?;
//! ```

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Errors that can occur while installing the subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("invalid log filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Subscriber configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level used for the `wellsync` targets when `RUST_LOG` is unset.
    pub level: Level,
    pub format: LogFormat,
    /// Include file and line number.
    pub with_location: bool,
    pub with_timestamp: bool,
    /// Explicit filter directive; takes precedence over `RUST_LOG`.
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            with_location: false,
            with_timestamp: true,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Quiet preset for interactive CLI use.
    #[must_use]
    pub fn cli() -> Self {
        Self {
            level: Level::WARN,
            format: LogFormat::Compact,
            with_location: false,
            with_timestamp: false,
            filter: None,
        }
    }

    /// Debug preset with source locations.
    #[must_use]
    pub fn verbose() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Compact,
            with_location: true,
            with_timestamp: true,
            filter: None,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    fn env_filter(&self) -> Result<EnvFilter, TracingError> {
        match self.filter {
            Some(ref directive) => Ok(EnvFilter::try_new(directive)?),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("wellsync={}", self.level)))),
        }
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already set or the filter directive does
/// not parse.
pub fn init_tracing(config: LogConfig) -> Result<(), TracingError> {
    let filter = config.env_filter()?;

    let layer = match config.format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .boxed(),
        LogFormat::Compact if config.with_timestamp => fmt::layer()
            .compact()
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .without_time()
            .with_file(config.with_location)
            .with_line_number(config.with_location)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let cli = LogConfig::cli();
        assert_eq!(cli.level, Level::WARN);
        assert_eq!(cli.format, LogFormat::Compact);
        assert!(!cli.with_timestamp);

        let verbose = LogConfig::verbose();
        assert_eq!(verbose.level, Level::DEBUG);
        assert!(verbose.with_location);
    }

    #[test]
    fn explicit_filter_is_validated() {
        let config = LogConfig::default().with_filter("wellsync=trace");
        assert!(config.env_filter().is_ok());

        let bad = LogConfig::default().with_filter("wellsync=notalevel[");
        assert!(bad.env_filter().is_err());
    }
}
