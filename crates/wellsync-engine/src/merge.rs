//! Calendar scope filtering and event deduplication.

use std::collections::HashSet;

use wellsync_core::EventRecord;
use wellsync_providers::CalendarDescriptor;

const BIRTHDAYS_SOURCE: &str = "Birthdays";

/// Returns true if the calendar should take part in sync.
///
/// A calendar is in scope when it is writable, does not come from the
/// "Birthdays" source, and its display name does not contain "birthday"
/// in any case.
pub fn is_in_scope(calendar: &CalendarDescriptor) -> bool {
    calendar.is_writable
        && calendar.source_name != BIRTHDAYS_SOURCE
        && !calendar.display_name.to_lowercase().contains("birthday")
}

/// Keeps only the in-scope calendars, preserving order.
pub fn in_scope(calendars: Vec<CalendarDescriptor>) -> Vec<CalendarDescriptor> {
    calendars.into_iter().filter(is_in_scope).collect()
}

/// Merges local and remote events, dropping duplicates.
///
/// Events are visited as `local ++ remote`; an event is dropped if an
/// already kept event has the same title and the same start second.
/// The first occurrence wins, so local events take precedence.
pub fn deduplicate(local: Vec<EventRecord>, remote: Vec<EventRecord>) -> Vec<EventRecord> {
    let capacity = local.len() + remote.len();
    let mut seen: HashSet<(String, i64)> = HashSet::with_capacity(capacity);
    let mut kept = Vec::with_capacity(capacity);
    for event in local.into_iter().chain(remote) {
        let (title, start) = event.dedup_key();
        if seen.insert((title.to_string(), start)) {
            kept.push(event);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use wellsync_core::{EventFields, EventOrigin, ProviderKind};

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn record(title: &str, start: DateTime<Utc>, origin: EventOrigin) -> EventRecord {
        EventRecord::classify(EventFields {
            id: None,
            title: title.to_string(),
            description: None,
            start,
            end: start + Duration::hours(1),
            location: None,
            all_day: false,
            origin,
            last_modified: None,
        })
    }

    #[test]
    fn scope_filter() {
        let personal = CalendarDescriptor::new("p", "Personal", "iCloud", true);
        let read_only = CalendarDescriptor::new("h", "Holidays", "iCloud", false);
        let birthdays_source = CalendarDescriptor::new("b", "Contacts", "Birthdays", true);
        let birthday_name = CalendarDescriptor::new("f", "Family BIRTHDAYS", "Local", true);

        assert!(is_in_scope(&personal));
        assert!(!is_in_scope(&read_only));
        assert!(!is_in_scope(&birthdays_source));
        assert!(!is_in_scope(&birthday_name));

        let kept = in_scope(vec![personal.clone(), read_only, birthdays_source, birthday_name]);
        assert_eq!(kept, vec![personal]);
    }

    #[test]
    fn source_match_is_exact() {
        // Only the display name check is case-insensitive.
        let calendar = CalendarDescriptor::new("x", "Work", "birthdays-archive", true);
        assert!(is_in_scope(&calendar));
    }

    #[test]
    fn first_occurrence_wins() {
        let start = at("2024-01-01T07:00:00Z");
        let local = vec![record("Morning Run", start, EventOrigin::local("personal"))];
        let remote = vec![
            record("Morning Run", start, EventOrigin::remote("primary")),
            record("Dentist", at("2024-01-02T09:00:00Z"), EventOrigin::remote("primary")),
        ];

        let merged = deduplicate(local, remote);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].title(), "Morning Run");
        assert_eq!(merged[0].origin().provider, ProviderKind::Local);
        assert_eq!(merged[1].title(), "Dentist");
        assert_eq!(merged[1].origin().provider, ProviderKind::Remote);
    }

    #[test]
    fn duplicates_within_one_source_collapse() {
        let start = at("2024-03-01T12:00:00Z");
        let local = vec![
            record("Lunch", start, EventOrigin::local("a")),
            record("Lunch", start, EventOrigin::local("b")),
        ];
        let merged = deduplicate(local, Vec::new());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].origin().calendar_id, "a");
    }

    #[test]
    fn near_matches_are_kept() {
        let start = at("2024-03-01T12:00:00Z");
        let local = vec![record("Lunch", start, EventOrigin::local("a"))];
        let remote = vec![
            record("lunch", start, EventOrigin::remote("r")),
            record("Lunch", start + Duration::seconds(1), EventOrigin::remote("r")),
        ];
        assert_eq!(deduplicate(local, remote).len(), 3);
    }

    #[test]
    fn sub_second_difference_is_a_duplicate() {
        let start = at("2024-03-01T12:00:00Z");
        let local = vec![record("Lunch", start, EventOrigin::local("a"))];
        let remote = vec![record(
            "Lunch",
            start + Duration::milliseconds(400),
            EventOrigin::remote("r"),
        )];
        assert_eq!(deduplicate(local, remote).len(), 1);
    }

    #[test]
    fn large_merge_keeps_first_seen_order() {
        let base = at("2024-01-01T00:00:00Z");
        let local: Vec<_> = (0..2_000)
            .map(|i| record("Walk", base + Duration::minutes(i), EventOrigin::local("personal")))
            .collect();
        let remote: Vec<_> = (1_000..3_000)
            .map(|i| record("Walk", base + Duration::minutes(i), EventOrigin::remote("primary")))
            .collect();

        let merged = deduplicate(local, remote);
        assert_eq!(merged.len(), 3_000);
        assert!(merged[..2_000].iter().all(|e| e.origin().provider == ProviderKind::Local));
        assert!(merged[2_000..].iter().all(|e| e.origin().provider == ProviderKind::Remote));
        assert!(merged.windows(2).all(|pair| pair[0].start() < pair[1].start()));
        for pair in merged.windows(2) {
            assert!(!pair[0].is_duplicate_of(&pair[1]));
        }
    }
}
