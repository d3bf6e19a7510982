//! Calendar sync engine for wellsync.
//!
//! [`SyncEngine`] reconciles the user's local calendar store with an
//! optional OAuth-authenticated remote calendar:
//!
//! - [`PermissionGate`]: requests and caches local access, fails closed
//! - [`SyncState`]: status record owned by the engine, read as snapshots
//! - [`merge`]: calendar scope filter and first-seen-wins deduplication
//! - [`SyncError`]: the fatal outcomes of a pass
//!
//! ```no_run
//! use std::sync::Arc;
//! use wellsync_engine::{EngineConfig, SyncEngine};
//! use wellsync_providers::ics::IcsDirectoryProvider;
//!
//! # async fn run() -> Result<(), wellsync_engine::SyncError> {
//! let local = Arc::new(IcsDirectoryProvider::new("/tmp/calendars"));
//! let engine = SyncEngine::new(local, EngineConfig::default());
//! let report = engine.synchronize().await?;
//! println!("{} events, {} warnings", report.events.len(), report.status.errors.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod merge;
pub mod permission;
pub mod reconciler;
pub mod state;

#[cfg(test)]
mod test_support;

pub use config::{EngineConfig, MAX_WINDOW_DAYS, Platform};
pub use error::{SyncError, SyncResult};
pub use permission::{PermissionGate, remediation_text};
pub use reconciler::{PendingAuthorization, SyncEngine, SyncReport};
pub use state::SyncState;
