//! Fatal sync errors.

use thiserror::Error;

/// Result type for a sync pass.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that abort a whole sync pass.
///
/// Anything that only degrades the result (a provider failing to list
/// events, an expired token) is recorded in
/// [`SyncState::errors`](crate::SyncState) instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Another sync pass is already running. No state was touched.
    #[error("sync already running")]
    AlreadyRunning,

    /// Calendar access was not granted.
    #[error("no accessible calendars: {remediation}")]
    PermissionDenied { remediation: String },

    /// Access was granted but no calendar is writable and in scope.
    #[error("no writable calendars found")]
    NoWritableCalendars,
}

impl SyncError {
    /// Creates a permission denied error carrying user-facing remediation
    /// text.
    pub fn permission_denied(remediation: impl Into<String>) -> Self {
        Self::PermissionDenied {
            remediation: remediation.into(),
        }
    }

    /// Returns the text the caller should show the user, if any.
    pub fn remediation(&self) -> Option<&str> {
        match self {
            Self::PermissionDenied { remediation } => Some(remediation),
            _ => None,
        }
    }
}
