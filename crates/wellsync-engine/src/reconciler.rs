//! The sync engine.
//!
//! A pass runs through these steps:
//!
//! 1. Claim the in-progress flag (a busy engine rejects the call)
//! 2. Ask the [`PermissionGate`] for local access
//! 3. List local calendars and keep the in-scope ones
//! 4. Fetch local and remote events concurrently over the sync window
//! 5. Classify, then merge with local precedence
//! 6. Record the result in [`SyncState`]
//!
//! Steps 2 and 3 can abort the pass. Failures in step 4 are recorded in
//! `SyncState::errors` and the pass continues with what it has.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};
use url::Url;
use wellsync_core::{EventRecord, ProviderKind, TimeWindow, stamp_managed};
use wellsync_providers::{
    AuthorizationRequest, EventPatch, LocalCalendarProvider, OAuthSession, ProviderError,
    ProviderResult, RawEvent, RemoteCalendarProvider, normalize_events,
};

use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::merge;
use crate::permission::PermissionGate;
use crate::state::SyncState;

/// Result of a successful pass.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Merged events, local first.
    pub events: Vec<EventRecord>,
    /// State snapshot taken when the pass finished.
    pub status: SyncState,
}

/// What the caller needs to send the user to the consent page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuthorization {
    pub url: Url,
    pub state: String,
}

/// Reconciles the local calendar store with an optional remote calendar.
pub struct SyncEngine {
    local: Arc<dyn LocalCalendarProvider>,
    remote: Option<Arc<dyn RemoteCalendarProvider>>,
    gate: PermissionGate,
    config: EngineConfig,
    state: Mutex<SyncState>,
    session: RwLock<Option<OAuthSession>>,
    pending_auth: Mutex<Option<AuthorizationRequest>>,
}

/// Clears the in-progress flag when a pass ends, however it ends.
struct PassGuard<'a> {
    state: &'a Mutex<SyncState>,
    released: bool,
}

impl PassGuard<'_> {
    /// Records a successful pass and releases the flag under one lock.
    fn finish(
        mut self,
        finished_at: DateTime<Utc>,
        calendar_ids: Vec<String>,
    ) -> SyncState {
        self.released = true;
        let mut state = lock(self.state);
        state.record_success(finished_at, calendar_ids);
        state.clone()
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            lock(self.state).in_progress = false;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SyncEngine {
    pub fn new(local: Arc<dyn LocalCalendarProvider>, config: EngineConfig) -> Self {
        let gate = PermissionGate::new(local.clone(), &config);
        Self {
            local,
            remote: None,
            gate,
            config,
            state: Mutex::new(SyncState::new()),
            session: RwLock::new(None),
            pending_auth: Mutex::new(None),
        }
    }

    /// Builder: attach a remote provider. Remote sync stays inactive until
    /// an authorization completes.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteCalendarProvider>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn permission_gate(&self) -> &PermissionGate {
        &self.gate
    }

    /// Returns a snapshot of the sync state.
    pub fn status(&self) -> SyncState {
        lock(&self.state).clone()
    }

    /// Turns sync on or off.
    ///
    /// Turning sync on when it was off runs a pass immediately and returns
    /// its result. Turning it off only clears the flag.
    pub async fn enable(&self, on: bool) -> Option<SyncResult<SyncReport>> {
        let was_enabled = {
            let mut state = lock(&self.state);
            let was_enabled = state.enabled;
            if !on {
                state.enabled = false;
            }
            was_enabled
        };

        match (on, was_enabled) {
            (true, false) => {
                info!("sync enabled, running initial pass");
                Some(self.synchronize().await)
            }
            (false, true) => {
                info!("sync disabled");
                None
            }
            _ => None,
        }
    }

    /// Runs one sync pass centred on the current time.
    pub async fn synchronize(&self) -> SyncResult<SyncReport> {
        self.synchronize_at(Utc::now()).await
    }

    /// Runs one sync pass with the window centred on `now`.
    #[instrument(skip(self), fields(local = self.local.name()))]
    pub async fn synchronize_at(&self, now: DateTime<Utc>) -> SyncResult<SyncReport> {
        let guard = self.begin_pass()?;
        info!("sync started");

        if !self.gate.request_access().await {
            let remediation = self.gate.remediation();
            error!("sync aborted: calendar access not granted");
            return Err(SyncError::permission_denied(remediation));
        }

        let calendars = match self.local.list_calendars().await {
            Ok(calendars) => calendars,
            Err(e) => {
                self.record_error(ProviderKind::Local, &e);
                Vec::new()
            }
        };
        let calendar_ids: Vec<String> = merge::in_scope(calendars)
            .into_iter()
            .map(|calendar| calendar.id)
            .collect();
        if calendar_ids.is_empty() {
            error!("sync aborted: no writable calendars in scope");
            return Err(SyncError::NoWritableCalendars);
        }
        debug!(calendars = ?calendar_ids, "in-scope calendars");

        let window = self.config.window.around(now);
        let (local_events, remote_events) = tokio::join!(
            self.fetch_local(&calendar_ids, window),
            self.fetch_remote(window)
        );
        let local_count = local_events.len();
        let remote_count = remote_events.len();
        let events = merge::deduplicate(local_events, remote_events);

        let status = guard.finish(Utc::now(), calendar_ids);

        info!(
            local = local_count,
            remote = remote_count,
            merged = events.len(),
            errors = status.errors.len(),
            "sync finished"
        );
        Ok(SyncReport { events, status })
    }

    fn begin_pass(&self) -> SyncResult<PassGuard<'_>> {
        let mut state = lock(&self.state);
        if state.in_progress {
            debug!("sync already running, rejecting");
            return Err(SyncError::AlreadyRunning);
        }
        state.begin_pass();
        Ok(PassGuard {
            state: &self.state,
            released: false,
        })
    }

    fn record_error(&self, source: ProviderKind, error: &ProviderError) {
        warn!(source = %source, error = %error, "non-fatal sync error");
        lock(&self.state).record_error(source, error);
    }

    async fn fetch_local(&self, calendar_ids: &[String], window: TimeWindow) -> Vec<EventRecord> {
        let fetch = self.local.list_events(calendar_ids, window);
        match with_timeout(self.config.fetch_timeout, "local fetch", fetch).await {
            Ok(raws) => normalize_events(&raws, ProviderKind::Local),
            Err(e) => {
                self.record_error(ProviderKind::Local, &e);
                Vec::new()
            }
        }
    }

    async fn fetch_remote(&self, window: TimeWindow) -> Vec<EventRecord> {
        let Some(remote) = self.remote.as_deref() else {
            return Vec::new();
        };
        let Some(session) = self.session.read().await.clone() else {
            debug!("no remote session, skipping remote fetch");
            return Vec::new();
        };

        let fetch = async {
            let session = if session.is_expired() {
                let refreshed = remote.refresh_session(&session).await?;
                info!(provider = remote.name(), "remote session refreshed");
                *self.session.write().await = Some(refreshed.clone());
                refreshed
            } else {
                session
            };
            remote.list_events(&session, window).await
        };

        match with_timeout(self.config.fetch_timeout, "remote fetch", fetch).await {
            Ok(raws) => normalize_events(&raws, ProviderKind::Remote),
            Err(e) => {
                self.record_error(ProviderKind::Remote, &e);
                Vec::new()
            }
        }
    }

    /// Creates an event in a local calendar, stamped with the managed
    /// marker. Returns the new event id.
    pub async fn create_managed_event(
        &self,
        calendar_id: &str,
        mut event: RawEvent,
    ) -> ProviderResult<String> {
        if event.summary.as_deref().is_none_or(|s| s.trim().is_empty()) {
            return Err(ProviderError::bad_request("event title must not be empty"));
        }
        if !event.is_all_day() && event.end.to_utc() <= event.start.to_utc() {
            return Err(ProviderError::bad_request("event must end after it starts"));
        }
        if event.end.to_utc() < event.start.to_utc() {
            return Err(ProviderError::bad_request("event must not end before it starts"));
        }

        self.gate.ensure_access().await?;

        event.description = Some(stamp_managed(
            event.description.as_deref(),
            &self.config.app_name,
        ));
        event.calendar_id = calendar_id.to_string();

        match self.local.create_event(calendar_id, event).await {
            Ok(id) => {
                info!(calendar_id, event_id = %id, "managed event created");
                Ok(id)
            }
            Err(e) => {
                warn!(calendar_id, error = %e, "failed to create managed event");
                Err(e)
            }
        }
    }

    /// Applies `patch` to a local event. A description in the patch is
    /// stamped with the managed marker.
    pub async fn update_managed_event(&self, id: &str, mut patch: EventPatch) -> ProviderResult<()> {
        if patch.is_empty() {
            return Err(ProviderError::bad_request("patch changes nothing"));
        }
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ProviderError::bad_request("event title must not be empty"));
        }
        if let (Some(start), Some(end)) = (patch.start, patch.end)
            && end <= start
        {
            return Err(ProviderError::bad_request("event must end after it starts"));
        }

        self.gate.ensure_access().await?;

        if let Some(description) = patch.description.take() {
            patch.description = Some(stamp_managed(Some(&description), &self.config.app_name));
        }

        self.local.update_event(id, patch).await.inspect_err(|e| {
            warn!(event_id = id, error = %e, "failed to update managed event");
        })?;
        info!(event_id = id, "managed event updated");
        Ok(())
    }

    /// Deletes a local event.
    pub async fn delete_managed_event(&self, id: &str) -> ProviderResult<()> {
        self.gate.ensure_access().await?;
        self.local.delete_event(id).await.inspect_err(|e| {
            warn!(event_id = id, error = %e, "failed to delete managed event");
        })?;
        info!(event_id = id, "managed event deleted");
        Ok(())
    }

    /// Starts the remote authorization flow.
    ///
    /// The pending request (including the PKCE verifier) stays in the
    /// engine; only the consent URL and the `state` nonce are returned.
    /// Starting again replaces any earlier pending request.
    pub fn begin_authorization(&self) -> ProviderResult<PendingAuthorization> {
        let remote = self.remote_provider()?;
        let request = remote.begin_authorization()?;
        let pending = PendingAuthorization {
            url: request.url().clone(),
            state: request.state().to_string(),
        };
        *lock(&self.pending_auth) = Some(request);
        info!(provider = remote.name(), "authorization started");
        Ok(pending)
    }

    /// Finishes the remote authorization flow with the `code` and `state`
    /// returned on the redirect.
    ///
    /// The pending request is consumed whether or not this succeeds, so a
    /// redirect can only be redeemed once.
    pub async fn complete_authorization(&self, code: &str, state: &str) -> ProviderResult<()> {
        let remote = self.remote_provider()?;
        let request = lock(&self.pending_auth)
            .take()
            .ok_or_else(|| ProviderError::authorization("no authorization in progress"))?;

        if let Err(e) = request.verify_state(state) {
            error!(provider = remote.name(), "authorization state mismatch");
            return Err(e.with_provider(remote.name()));
        }

        let exchange = remote.exchange_code(&request, code);
        let session = with_timeout(self.config.fetch_timeout, "token exchange", exchange).await?;
        *self.session.write().await = Some(session);
        info!(provider = remote.name(), "authorization complete");
        Ok(())
    }

    /// Returns true if remote sync is active for this process.
    pub async fn has_remote_session(&self) -> bool {
        self.session.read().await.is_some()
    }

    fn remote_provider(&self) -> ProviderResult<&dyn RemoteCalendarProvider> {
        self.remote
            .as_deref()
            .ok_or_else(|| ProviderError::configuration("no remote calendar provider configured"))
    }
}

async fn with_timeout<T>(
    limit: Duration,
    what: &str,
    fut: impl Future<Output = ProviderResult<T>>,
) -> ProviderResult<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::timeout(format!(
            "{} did not finish within {}s",
            what,
            limit.as_secs()
        ))),
    }
}
