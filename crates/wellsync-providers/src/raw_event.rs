//! Raw event type exchanged with calendar providers.
//!
//! [`RawEvent`] is what a provider reads from (or writes to) its backing
//! store before classification. The engine turns it into an
//! [`EventRecord`](wellsync_core::EventRecord) through
//! [`normalize_event`](crate::normalize_event).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The time specification for a raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum RawEventTime {
    /// A specific instant.
    DateTime(DateTime<Utc>),
    /// An all-day date with no time component.
    Date(NaiveDate),
}

impl RawEventTime {
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Returns the instant this time refers to; dates map to midnight UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::Date(date) => date.and_time(chrono::NaiveTime::MIN).and_utc(),
        }
    }
}

impl From<DateTime<Utc>> for RawEventTime {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }
}

impl From<NaiveDate> for RawEventTime {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

/// A calendar event as a provider sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Provider-assigned identifier; `None` for events not yet created.
    pub id: Option<String>,

    pub start: RawEventTime,

    pub end: RawEventTime,

    pub summary: Option<String>,

    pub description: Option<String>,

    pub location: Option<String>,

    /// The calendar this event belongs to.
    pub calendar_id: String,

    /// IANA timezone the event was authored in, when the provider reports one.
    pub timezone: Option<String>,

    /// Provider status, e.g. "confirmed" or "cancelled".
    pub status: Option<String>,

    /// Last modification time reported by the provider.
    pub updated: Option<DateTime<Utc>>,
}

impl RawEvent {
    pub fn new(
        start: impl Into<RawEventTime>,
        end: impl Into<RawEventTime>,
        calendar_id: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            start: start.into(),
            end: end.into(),
            summary: None,
            description: None,
            location: None,
            calendar_id: calendar_id.into(),
            timezone: None,
            status: None,
            updated: None,
        }
    }

    /// Returns the effective title, falling back to "(No title)" if blank.
    pub fn effective_title(&self) -> &str {
        self.summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("(No title)")
    }

    pub fn is_cancelled(&self) -> bool {
        self.status
            .as_ref()
            .is_some_and(|s| s.eq_ignore_ascii_case("cancelled"))
    }

    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_updated(mut self, updated: DateTime<Utc>) -> Self {
        self.updated = Some(updated);
        self
    }
}
