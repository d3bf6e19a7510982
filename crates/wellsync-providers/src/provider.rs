//! Calendar provider traits.
//!
//! Two backends feed the sync engine:
//!
//! - [`LocalCalendarProvider`]: the user's device calendar store. Enumerable
//!   calendars, full CRUD, and an access grant that must be obtained first.
//! - [`RemoteCalendarProvider`]: a cloud calendar behind OAuth2. Read-only
//!   listing over a time window, authenticated with an explicit
//!   [`OAuthSession`] passed into every call.
//!
//! Both traits return [`BoxFuture`]s so they stay object-safe and can be held
//! as `Arc<dyn ...>` by the engine and swapped for test doubles.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wellsync_core::TimeWindow;

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::RawEvent;
use crate::session::{AuthorizationRequest, OAuthSession};

/// A boxed future for async trait methods.
///
/// Boxing keeps the provider traits usable through `dyn`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A calendar exposed by the local provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDescriptor {
    pub id: String,
    pub display_name: String,
    /// The account or source the calendar belongs to, e.g. "iCloud" or
    /// "Birthdays".
    pub source_name: String,
    pub is_writable: bool,
}

impl CalendarDescriptor {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        source_name: impl Into<String>,
        is_writable: bool,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            source_name: source_name.into(),
            is_writable,
        }
    }
}

/// A partial update to an existing event. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub location: Option<String>,
}

impl EventPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.location.is_none()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_times(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// The device calendar store.
///
/// Every read and write assumes [`request_access`](Self::request_access) has
/// returned `true`; callers go through the engine's permission gate rather
/// than calling it directly.
pub trait LocalCalendarProvider: Send + Sync {
    /// Returns the name of this provider (e.g. "ics").
    fn name(&self) -> &str;

    /// Asks the store for access. May prompt the user; returns whether
    /// access was granted.
    fn request_access(&self) -> BoxFuture<'_, ProviderResult<bool>>;

    /// Lists every calendar in the store, writable or not.
    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarDescriptor>>>;

    /// Lists events in the given calendars that overlap `window`.
    fn list_events<'a>(
        &'a self,
        calendar_ids: &'a [String],
        window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>>;

    /// Creates an event and returns its new id. The `id` of `event` is
    /// ignored.
    fn create_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: RawEvent,
    ) -> BoxFuture<'a, ProviderResult<String>>;

    fn update_event<'a>(
        &'a self,
        id: &'a str,
        patch: EventPatch,
    ) -> BoxFuture<'a, ProviderResult<()>>;

    fn delete_event<'a>(&'a self, id: &'a str) -> BoxFuture<'a, ProviderResult<()>>;
}

/// A cloud calendar reached through an OAuth2 authorization-code grant.
pub trait RemoteCalendarProvider: Send + Sync {
    /// Returns the name of this provider (e.g. "google").
    fn name(&self) -> &str;

    /// Starts an authorization flow: builds the consent URL with a fresh
    /// random `state` nonce (and PKCE challenge where supported).
    fn begin_authorization(&self) -> ProviderResult<AuthorizationRequest>;

    /// Exchanges the authorization code returned on the redirect for a
    /// session. The caller verifies `state` before calling this.
    fn exchange_code<'a>(
        &'a self,
        request: &'a AuthorizationRequest,
        code: &'a str,
    ) -> BoxFuture<'a, ProviderResult<OAuthSession>>;

    /// Obtains a fresh session from an expired one.
    ///
    /// The default implementation reports that refresh is unsupported, so
    /// the user must authorize again.
    fn refresh_session<'a>(
        &'a self,
        _session: &'a OAuthSession,
    ) -> BoxFuture<'a, ProviderResult<OAuthSession>> {
        let name = self.name().to_string();
        Box::pin(async move {
            Err(ProviderError::authentication("session expired, re-authorization required")
                .with_provider(name))
        })
    }

    /// Lists events overlapping `window`, following pagination internally.
    fn list_events<'a>(
        &'a self,
        session: &'a OAuthSession,
        window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;

    struct StaticRemote;

    impl RemoteCalendarProvider for StaticRemote {
        fn name(&self) -> &str {
            "static"
        }

        fn begin_authorization(&self) -> ProviderResult<AuthorizationRequest> {
            let url = url::Url::parse("https://auth.example.com/authorize")
                .map_err(|e| ProviderError::configuration(e.to_string()))?;
            Ok(AuthorizationRequest::new(url, "state", "http://127.0.0.1/cb"))
        }

        fn exchange_code<'a>(
            &'a self,
            _request: &'a AuthorizationRequest,
            code: &'a str,
        ) -> BoxFuture<'a, ProviderResult<OAuthSession>> {
            Box::pin(async move { Ok(OAuthSession::new(format!("token-for-{code}"))) })
        }

        fn list_events<'a>(
            &'a self,
            _session: &'a OAuthSession,
            _window: TimeWindow,
        ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
            Box::pin(async { Ok(Vec::new()) })
        }
    }

    #[tokio::test]
    async fn default_refresh_is_unsupported() {
        let remote = StaticRemote;
        let session = remote
            .exchange_code(&remote.begin_authorization().unwrap(), "abc")
            .await
            .unwrap();
        assert_eq!(session.access_token(), "token-for-abc");

        let err = remote.refresh_session(&session).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert_eq!(err.provider(), Some("static"));
    }

    #[test]
    fn patch_emptiness() {
        assert!(EventPatch::new().is_empty());
        assert!(!EventPatch::new().with_location("Park").is_empty());
    }
}
