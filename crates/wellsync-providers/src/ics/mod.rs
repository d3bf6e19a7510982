//! Local calendar store kept as plain iCalendar files.
//!
//! Stands in for the device calendar database on platforms without one:
//! each calendar is a directory, each event a `.ics` file. See
//! [`IcsDirectoryProvider`] for the layout.

mod codec;
mod store;

pub use codec::{parse_event_file, render_event};
pub use store::{CalendarMetadata, IcsDirectoryProvider};
