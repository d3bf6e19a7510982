//! Reading and writing single-event iCalendar files.

use chrono::{TimeZone, Utc};
use icalendar::{
    Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, Event, EventLike,
    Property,
};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::{RawEvent, RawEventTime};

const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Parses the first VEVENT of `content`.
///
/// The event id is the file stem, not the UID, so that ids stay valid file
/// names.
pub fn parse_event_file(content: &str, calendar_id: &str, event_id: &str) -> ProviderResult<RawEvent> {
    let calendar = content
        .parse::<Calendar>()
        .map_err(|e| ProviderError::invalid_response(format!("malformed iCalendar data: {}", e)))?;

    let event = calendar
        .iter()
        .find_map(|component| match component {
            CalendarComponent::Event(event) => Some(event),
            _ => None,
        })
        .ok_or_else(|| ProviderError::invalid_response("file contains no VEVENT"))?;

    let start = event
        .get_start()
        .map(convert_time)
        .ok_or_else(|| ProviderError::invalid_response("event has no DTSTART"))?;
    let end = event.get_end().map(convert_time).unwrap_or(start);

    let mut raw = RawEvent::new(start, end, calendar_id).with_id(event_id);
    raw.summary = text_property(content, "SUMMARY");
    raw.description = text_property(content, "DESCRIPTION");
    raw.location = text_property(content, "LOCATION");
    raw.updated = event.get_last_modified();
    if event.property_value("STATUS") == Some("CANCELLED") {
        raw.status = Some("cancelled".to_string());
    }

    debug!(event_id, calendar_id, "parsed event file");
    Ok(raw)
}

/// Renders `event` as a VCALENDAR with a single VEVENT.
pub fn render_event(event: &RawEvent, uid: &str) -> String {
    let mut ics_event = Event::new();
    ics_event.uid(uid);
    ics_event.summary(&normalize_newlines(event.effective_title()));

    if let Some(ref description) = event.description {
        ics_event.description(&normalize_newlines(description));
    }
    if let Some(ref location) = event.location {
        ics_event.location(&normalize_newlines(location));
    }

    add_time_property(&mut ics_event, "DTSTART", &event.start);
    add_time_property(&mut ics_event, "DTEND", &event.end);

    let modified = event.updated.unwrap_or_else(Utc::now);
    ics_event.add_property("LAST-MODIFIED", modified.format(UTC_FORMAT).to_string());

    let mut calendar = Calendar::new();
    calendar.push(ics_event.done());
    calendar.done().to_string()
}

fn add_time_property(ics_event: &mut Event, name: &str, time: &RawEventTime) {
    match time {
        RawEventTime::DateTime(dt) => {
            ics_event.add_property(name, dt.format(UTC_FORMAT).to_string());
        }
        RawEventTime::Date(date) => {
            let mut prop = Property::new(name, date.format("%Y%m%d").to_string());
            prop.add_parameter("VALUE", "DATE");
            ics_event.append_property(prop);
        }
    }
}

fn convert_time(time: DatePerhapsTime) -> RawEventTime {
    match time {
        DatePerhapsTime::Date(date) => RawEventTime::Date(date),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => RawEventTime::DateTime(dt),
        // Floating and zoned times are read as UTC; the store itself only
        // ever writes UTC.
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => {
            RawEventTime::DateTime(Utc.from_utc_datetime(&naive))
        }
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, .. }) => {
            RawEventTime::DateTime(Utc.from_utc_datetime(&date_time))
        }
    }
}

/// icalendar escapes TEXT values on output; it only needs LF line breaks.
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Reads a TEXT property of the first VEVENT straight from the unfolded
/// content lines.
///
/// icalendar's own unescaping replaces sequences one after another, which
/// turns an escaped backslash followed by `n` into a line break.
fn text_property(content: &str, name: &str) -> Option<String> {
    let unfolded = content
        .replace("\r\n ", "")
        .replace("\r\n\t", "")
        .replace("\n ", "")
        .replace("\n\t", "");

    let mut in_event = false;
    for line in unfolded.lines() {
        let line = line.trim_end_matches('\r');
        if line.eq_ignore_ascii_case("BEGIN:VEVENT") {
            in_event = true;
            continue;
        }
        if line.eq_ignore_ascii_case("END:VEVENT") {
            break;
        }
        if !in_event {
            continue;
        }

        let key_end = line.find([':', ';']).unwrap_or(line.len());
        if !line[..key_end].eq_ignore_ascii_case(name) {
            continue;
        }
        return value_start(line).map(|start| unescape_text(&line[start..]));
    }
    None
}

/// Byte offset of the value: just past the first `:` outside quoted
/// parameter values.
fn value_start(line: &str) -> Option<usize> {
    let mut quoted = false;
    for (idx, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ':' if !quoted => return Some(idx + 1),
            _ => {}
        }
    }
    None
}

/// Reverses RFC 5545 TEXT escaping (`\n`, `\N`, `\,`, `\;`, `\\`).
fn unescape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
