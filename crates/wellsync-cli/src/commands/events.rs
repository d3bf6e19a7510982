//! Managed event commands.

use chrono::{DateTime, Utc};
use tracing::debug;
use wellsync_providers::{EventPatch, RawEvent};

use crate::config::CliConfig;
use crate::error::CliResult;

/// Arguments for `event create`.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub calendar: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub all_day: bool,
}

impl NewEvent {
    fn into_raw(self) -> RawEvent {
        let event = if self.all_day {
            RawEvent::new(self.start.date_naive(), self.end.date_naive(), self.calendar)
        } else {
            RawEvent::new(self.start, self.end, self.calendar)
        };
        let mut event = event.with_summary(self.title);
        if let Some(description) = self.description {
            event = event.with_description(description);
        }
        if let Some(location) = self.location {
            event = event.with_location(location);
        }
        event
    }
}

/// Creates a managed event and prints its id.
pub async fn create(config: &CliConfig, event: NewEvent) -> CliResult<()> {
    let engine = super::build_engine(config, false)?;
    let calendar = event.calendar.clone();
    let id = engine.create_managed_event(&calendar, event.into_raw()).await?;
    println!("{}", id);
    Ok(())
}

/// Builds the patch for `event update`.
pub fn build_patch(
    title: Option<String>,
    description: Option<String>,
    times: Option<(DateTime<Utc>, DateTime<Utc>)>,
    location: Option<String>,
) -> EventPatch {
    let mut patch = EventPatch::new();
    if let Some(title) = title {
        patch = patch.with_title(title);
    }
    if let Some(description) = description {
        patch = patch.with_description(description);
    }
    if let Some((start, end)) = times {
        patch = patch.with_times(start, end);
    }
    if let Some(location) = location {
        patch = patch.with_location(location);
    }
    patch
}

/// Applies a patch to a managed event.
pub async fn update(config: &CliConfig, id: &str, patch: EventPatch) -> CliResult<()> {
    let engine = super::build_engine(config, false)?;
    debug!(id, ?patch, "updating event");
    engine.update_managed_event(id, patch).await?;
    println!("Updated {}", id);
    Ok(())
}

/// Deletes an event.
pub async fn delete(config: &CliConfig, id: &str) -> CliResult<()> {
    let engine = super::build_engine(config, false)?;
    engine.delete_managed_event(id).await?;
    println!("Deleted {}", id);
    Ok(())
}
