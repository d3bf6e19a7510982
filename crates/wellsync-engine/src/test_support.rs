//! In-memory provider doubles for engine tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use url::Url;
use wellsync_core::TimeWindow;
use wellsync_providers::{
    AuthorizationRequest, BoxFuture, CalendarDescriptor, EventPatch, LocalCalendarProvider,
    OAuthSession, ProviderError, ProviderResult, RawEvent, RemoteCalendarProvider,
};

pub(crate) fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

/// Local provider backed by a vector.
pub(crate) struct FakeLocal {
    calendars: Mutex<Vec<CalendarDescriptor>>,
    events: Mutex<Vec<RawEvent>>,
    grant: bool,
    fail_access: bool,
    fail_calendars: bool,
    fail_events: bool,
    access_delay: Option<Duration>,
    fetch_delay: Option<Duration>,
    access_requests: AtomicUsize,
    list_calls: AtomicUsize,
    next_id: AtomicUsize,
    updates: Mutex<Vec<(String, EventPatch)>>,
}

impl FakeLocal {
    pub(crate) fn new() -> Self {
        Self {
            calendars: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            grant: true,
            fail_access: false,
            fail_calendars: false,
            fail_events: false,
            access_delay: None,
            fetch_delay: None,
            access_requests: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            next_id: AtomicUsize::new(1),
            updates: Mutex::new(Vec::new()),
        }
    }

    /// A store with one writable "personal" calendar.
    pub(crate) fn with_personal_calendar() -> Self {
        Self::new().with_calendar(CalendarDescriptor::new("personal", "Personal", "Local", true))
    }

    pub(crate) fn with_calendar(self, calendar: CalendarDescriptor) -> Self {
        self.calendars.lock().unwrap().push(calendar);
        self
    }

    pub(crate) fn clear_calendars(&self) {
        self.calendars.lock().unwrap().clear();
    }

    pub(crate) fn with_event(self, event: RawEvent) -> Self {
        self.events.lock().unwrap().push(event);
        self
    }

    pub(crate) fn denying(mut self) -> Self {
        self.grant = false;
        self
    }

    pub(crate) fn failing_access(mut self) -> Self {
        self.fail_access = true;
        self
    }

    pub(crate) fn failing_calendars(mut self) -> Self {
        self.fail_calendars = true;
        self
    }

    pub(crate) fn failing_events(mut self) -> Self {
        self.fail_events = true;
        self
    }

    pub(crate) fn with_access_delay(mut self, delay: Duration) -> Self {
        self.access_delay = Some(delay);
        self
    }

    pub(crate) fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub(crate) fn access_requests(&self) -> usize {
        self.access_requests.load(Ordering::SeqCst)
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn stored_events(&self) -> Vec<RawEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn updates(&self) -> Vec<(String, EventPatch)> {
        self.updates.lock().unwrap().clone()
    }
}

impl LocalCalendarProvider for FakeLocal {
    fn name(&self) -> &str {
        "fake-local"
    }

    fn request_access(&self) -> BoxFuture<'_, ProviderResult<bool>> {
        Box::pin(async move {
            self.access_requests.fetch_add(1, Ordering::SeqCst);
            pause(self.access_delay).await;
            if self.fail_access {
                return Err(ProviderError::internal("permission service unavailable"));
            }
            Ok(self.grant)
        })
    }

    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarDescriptor>>> {
        Box::pin(async move {
            if self.fail_calendars {
                return Err(ProviderError::storage("calendar database locked"));
            }
            Ok(self.calendars.lock().unwrap().clone())
        })
    }

    fn list_events<'a>(
        &'a self,
        calendar_ids: &'a [String],
        window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
        Box::pin(async move {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            pause(self.fetch_delay).await;
            if self.fail_events {
                return Err(ProviderError::storage("disk unavailable"));
            }
            Ok(self
                .stored_events()
                .into_iter()
                .filter(|e| calendar_ids.contains(&e.calendar_id))
                .filter(|e| window.overlaps(e.start.to_utc(), e.end.to_utc()))
                .collect())
        })
    }

    fn create_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: RawEvent,
    ) -> BoxFuture<'a, ProviderResult<String>> {
        Box::pin(async move {
            let id = format!("evt-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            let mut event = event.with_id(&id);
            event.calendar_id = calendar_id.to_string();
            self.events.lock().unwrap().push(event);
            Ok(id)
        })
    }

    fn update_event<'a>(
        &'a self,
        id: &'a str,
        patch: EventPatch,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            let mut events = self.events.lock().unwrap();
            let event = events
                .iter_mut()
                .find(|e| e.id.as_deref() == Some(id))
                .ok_or_else(|| ProviderError::not_found(format!("event '{}'", id)))?;
            if let Some(ref description) = patch.description {
                event.description = Some(description.clone());
            }
            if let Some(ref title) = patch.title {
                event.summary = Some(title.clone());
            }
            drop(events);
            self.updates.lock().unwrap().push((id.to_string(), patch));
            Ok(())
        })
    }

    fn delete_event<'a>(&'a self, id: &'a str) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            let mut events = self.events.lock().unwrap();
            let before = events.len();
            events.retain(|e| e.id.as_deref() != Some(id));
            if events.len() == before {
                return Err(ProviderError::not_found(format!("event '{}'", id)));
            }
            Ok(())
        })
    }
}

/// Remote provider returning canned events.
pub(crate) struct FakeRemote {
    events: Vec<RawEvent>,
    fail_list: AtomicBool,
    fail_refresh: bool,
    issue_expired: bool,
    fetch_delay: Option<Duration>,
    issued: AtomicUsize,
    exchanges: AtomicUsize,
    refreshes: AtomicUsize,
    seen_tokens: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub(crate) fn new() -> Self {
        Self {
            events: Vec::new(),
            fail_list: AtomicBool::new(false),
            fail_refresh: false,
            issue_expired: false,
            fetch_delay: None,
            issued: AtomicUsize::new(0),
            exchanges: AtomicUsize::new(0),
            refreshes: AtomicUsize::new(0),
            seen_tokens: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_event(mut self, event: RawEvent) -> Self {
        self.events.push(event);
        self
    }

    pub(crate) fn failing(self) -> Self {
        self.fail_list.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn recover(&self) {
        self.fail_list.store(false, Ordering::SeqCst);
    }

    pub(crate) fn failing_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    /// Exchanged sessions are already expired and carry a refresh token.
    pub(crate) fn issuing_expired_sessions(mut self) -> Self {
        self.issue_expired = true;
        self
    }

    pub(crate) fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub(crate) fn exchanges(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }

    pub(crate) fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub(crate) fn seen_tokens(&self) -> Vec<String> {
        self.seen_tokens.lock().unwrap().clone()
    }
}

impl RemoteCalendarProvider for FakeRemote {
    fn name(&self) -> &str {
        "fake-remote"
    }

    fn begin_authorization(&self) -> ProviderResult<AuthorizationRequest> {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let state = format!("state-{}", n);
        let url = Url::parse(&format!(
            "https://auth.example.com/authorize?response_type=code&state={}",
            state
        ))
        .map_err(|e| ProviderError::internal(e.to_string()))?;
        Ok(AuthorizationRequest::new(url, state, "http://127.0.0.1:8765/callback")
            .with_pkce_verifier(format!("verifier-{}", n)))
    }

    fn exchange_code<'a>(
        &'a self,
        request: &'a AuthorizationRequest,
        code: &'a str,
    ) -> BoxFuture<'a, ProviderResult<OAuthSession>> {
        Box::pin(async move {
            self.exchanges.fetch_add(1, Ordering::SeqCst);
            if request.pkce_verifier().is_none() {
                return Err(ProviderError::authentication("missing PKCE verifier"));
            }
            let session = OAuthSession::new(format!("token-{}", code));
            if self.issue_expired {
                return Ok(session
                    .with_refresh_token("refresh-1")
                    .with_expires_at(at("2020-01-01T00:00:00Z")));
            }
            Ok(session)
        })
    }

    fn refresh_session<'a>(
        &'a self,
        _session: &'a OAuthSession,
    ) -> BoxFuture<'a, ProviderResult<OAuthSession>> {
        Box::pin(async move {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            if self.fail_refresh {
                return Err(ProviderError::authentication("refresh token revoked"));
            }
            Ok(OAuthSession::new("refreshed").with_refresh_token("refresh-1"))
        })
    }

    fn list_events<'a>(
        &'a self,
        session: &'a OAuthSession,
        window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
        Box::pin(async move {
            self.seen_tokens
                .lock()
                .unwrap()
                .push(session.access_token().to_string());
            pause(self.fetch_delay).await;
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(ProviderError::network("connection reset"));
            }
            Ok(self
                .events
                .iter()
                .filter(|e| window.overlaps(e.start.to_utc(), e.end.to_utc()))
                .cloned()
                .collect())
        })
    }
}
