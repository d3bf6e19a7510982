//! Event types shared by every provider.
//!
//! - [`EventRecord`]: the canonical, provider-independent calendar entry
//! - [`Category`]: the fixed wellness taxonomy an event is classified into
//! - [`EventOrigin`]: which provider and calendar a record was read from
//!
//! An `EventRecord` can only be built through [`EventRecord::classify`], which
//! derives the category and managed flag from the text fields. Records have no
//! setters; reclassification happens by fetching again.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify;

/// The category taxonomy used for wellness scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Fitness,
    Mental,
    Nutrition,
    Medical,
    Personal,
    Work,
}

impl Category {
    /// Returns the lowercase wire name of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fitness => "fitness",
            Self::Mental => "mental",
            Self::Nutrition => "nutrition",
            Self::Medical => "medical",
            Self::Personal => "personal",
            Self::Work => "work",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of provider a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// The user's device calendar store.
    Local,
    /// The OAuth-authenticated cloud calendar.
    Remote,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The calendar (within a provider) a record was read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventOrigin {
    pub provider: ProviderKind,
    pub calendar_id: String,
}

impl EventOrigin {
    pub fn local(calendar_id: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::Local,
            calendar_id: calendar_id.into(),
        }
    }

    pub fn remote(calendar_id: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::Remote,
            calendar_id: calendar_id.into(),
        }
    }
}

impl fmt::Display for EventOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.calendar_id)
    }
}

/// Unclassified field values used to build an [`EventRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFields {
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: Option<String>,
    pub all_day: bool,
    pub origin: EventOrigin,
    pub last_modified: Option<DateTime<Utc>>,
}

/// A classified calendar entry.
///
/// Start and end are stored in UTC; all-day entries start at midnight UTC of
/// their date and carry `all_day = true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    id: Option<String>,
    title: String,
    description: Option<String>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    location: Option<String>,
    all_day: bool,
    category: Category,
    is_managed: bool,
    origin: EventOrigin,
    last_modified: Option<DateTime<Utc>>,
}

impl EventRecord {
    /// Builds a record from raw field values, deriving `category` and
    /// `is_managed` from the title and description.
    pub fn classify(fields: EventFields) -> Self {
        let category = classify::classify(&fields.title, fields.description.as_deref());
        let is_managed = classify::is_managed(fields.description.as_deref());

        Self {
            id: fields.id,
            title: fields.title,
            description: fields.description,
            start: fields.start,
            end: fields.end,
            location: fields.location,
            all_day: fields.all_day,
            category,
            is_managed,
            origin: fields.origin,
            last_modified: fields.last_modified,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn is_all_day(&self) -> bool {
        self.all_day
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// True if the description carried the managed marker when fetched.
    pub fn is_managed(&self) -> bool {
        self.is_managed
    }

    pub fn origin(&self) -> &EventOrigin {
        &self.origin
    }

    /// Display-only modification time; never used to resolve conflicts.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    /// Returns true if `other` is a duplicate of this record.
    ///
    /// Two records are duplicates when their titles are byte-equal and their
    /// start times are equal to the second. No other field is compared.
    pub fn is_duplicate_of(&self, other: &EventRecord) -> bool {
        self.dedup_key() == other.dedup_key()
    }

    /// Title and start second; two records with equal keys are duplicates.
    pub fn dedup_key(&self) -> (&str, i64) {
        (&self.title, self.start.timestamp())
    }

    /// Returns true if the end time respects the ordering invariant.
    pub fn has_valid_span(&self) -> bool {
        self.all_day || self.end > self.start
    }
}
