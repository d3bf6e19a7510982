//! CLI error types.

use std::fmt;

use wellsync_engine::SyncError;
use wellsync_providers::ProviderError;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Configuration error.
    Config(String),
    /// Provider error (write path, authorization).
    Provider(ProviderError),
    /// A sync pass was aborted.
    Sync(SyncError),
    /// Settings store could not be read or written.
    Settings(String),
    /// The OAuth redirect was not received.
    Callback(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Provider(err) => write!(f, "provider error: {}", err),
            Self::Sync(err) => write!(f, "sync failed: {}", err),
            Self::Settings(msg) => write!(f, "settings error: {}", msg),
            Self::Callback(msg) => write!(f, "authorization callback failed: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Provider(err) => Some(err),
            Self::Sync(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ProviderError> for CliError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err)
    }
}

impl From<SyncError> for CliError {
    fn from(err: SyncError) -> Self {
        Self::Sync(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_error_keeps_remediation_in_message() {
        let err = CliError::from(SyncError::permission_denied("Open Settings"));
        assert_eq!(
            err.to_string(),
            "sync failed: no accessible calendars: Open Settings"
        );
    }

    #[test]
    fn provider_error_display() {
        let err = CliError::from(ProviderError::not_found("event 'x'").with_provider("ics"));
        assert_eq!(err.to_string(), "provider error: [ics] not_found: event 'x'");
    }
}
