//! RawEvent to EventRecord conversion.
//!
//! Normalization is the only place an [`EventRecord`] is built from provider
//! data:
//! 1. Times are converted to UTC; all-day dates become midnight UTC and set
//!    `all_day`
//! 2. Blank titles are replaced with "(No title)"
//! 3. The record is classified (category and managed flag)

use wellsync_core::{EventFields, EventOrigin, EventRecord, ProviderKind};

use crate::raw_event::RawEvent;

/// Converts a [`RawEvent`] read from a provider of the given kind.
pub fn normalize_event(raw: &RawEvent, provider: ProviderKind) -> EventRecord {
    EventRecord::classify(EventFields {
        id: raw.id.clone(),
        title: raw.effective_title().to_string(),
        description: raw.description.clone(),
        start: raw.start.to_utc(),
        end: raw.end.to_utc(),
        location: raw.location.clone(),
        all_day: raw.is_all_day(),
        origin: EventOrigin {
            provider,
            calendar_id: raw.calendar_id.clone(),
        },
        last_modified: raw.updated,
    })
}

/// Normalizes a batch, dropping cancelled events. Input order is preserved.
pub fn normalize_events(raws: &[RawEvent], provider: ProviderKind) -> Vec<EventRecord> {
    raws.iter()
        .filter(|raw| !raw.is_cancelled())
        .map(|raw| normalize_event(raw, provider))
        .collect()
}
