//! Process-lifetime sync status.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wellsync_core::ProviderKind;

/// Status of the sync engine.
///
/// The engine owns the live value; [`SyncEngine::status`](crate::SyncEngine::status)
/// hands out clones, so mutating a returned `SyncState` has no effect on the
/// engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// When the last successful pass finished.
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Whether the user has turned sync on.
    pub enabled: bool,
    /// Calendars that were writable and in scope on the last successful
    /// pass.
    pub connected_calendar_ids: BTreeSet<String>,
    /// True while a pass is running.
    pub in_progress: bool,
    /// Non-fatal errors of the current or last pass, in the order they
    /// occurred.
    pub errors: Vec<String>,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of a pass. Errors from the previous pass are
    /// discarded.
    pub(crate) fn begin_pass(&mut self) {
        self.in_progress = true;
        self.errors.clear();
    }

    /// Records a non-fatal error from the given provider.
    pub(crate) fn record_error(&mut self, source: ProviderKind, error: impl fmt::Display) {
        self.errors.push(format!("{}: {}", source, error));
    }

    /// Records a successful pass.
    pub(crate) fn record_success(
        &mut self,
        finished_at: DateTime<Utc>,
        calendar_ids: impl IntoIterator<Item = String>,
    ) {
        self.last_sync_at = Some(finished_at);
        self.enabled = true;
        self.connected_calendar_ids = calendar_ids.into_iter().collect();
        self.in_progress = false;
    }

    /// Returns the time since the last successful pass.
    pub fn time_since_sync(&self) -> Option<Duration> {
        self.last_sync_at.map(|last| {
            let elapsed = Utc::now() - last;
            Duration::from_secs(elapsed.num_seconds().max(0) as u64)
        })
    }
}
