//! [`LocalCalendarProvider`] backed by a directory of iCalendar files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wellsync_core::TimeWindow;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, CalendarDescriptor, EventPatch, LocalCalendarProvider};
use crate::raw_event::{RawEvent, RawEventTime};

use super::codec;

const PROVIDER_NAME: &str = "ics";
const METADATA_FILE: &str = "calendar.toml";
const EVENT_EXTENSION: &str = "ics";

/// Per-calendar settings stored in `calendar.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarMetadata {
    pub display_name: Option<String>,
    pub source_name: String,
    pub writable: bool,
}

impl Default for CalendarMetadata {
    fn default() -> Self {
        Self {
            display_name: None,
            source_name: "Local".to_string(),
            writable: true,
        }
    }
}

/// Local calendar store on disk.
///
/// ```text
/// <root>/
///   personal/
///     calendar.toml        display_name, source_name, writable
///     3f2a...c9.ics        one VEVENT per file, stem = event id
///   birthdays/
///     calendar.toml
/// ```
///
/// Every subdirectory of the root is a calendar; its directory name is the
/// calendar id. Access is granted when the root exists and is writable.
#[derive(Debug, Clone)]
pub struct IcsDirectoryProvider {
    root: PathBuf,
}

impl IcsDirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates a calendar directory with the given metadata.
    pub fn create_calendar(&self, id: &str, metadata: &CalendarMetadata) -> ProviderResult<()> {
        validate_id(id)?;
        let dir = self.root.join(id);
        fs::create_dir_all(&dir)?;
        let content = toml::to_string_pretty(metadata).map_err(|e| {
            ProviderError::internal(format!("failed to serialize calendar metadata: {}", e))
        })?;
        write_atomic(&dir.join(METADATA_FILE), &content)?;
        info!(calendar_id = id, "created calendar");
        Ok(())
    }

    async fn blocking<T, F>(&self, f: F) -> ProviderResult<T>
    where
        F: FnOnce(Store) -> ProviderResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Store {
            root: self.root.clone(),
        };
        tokio::task::spawn_blocking(move || f(store))
            .await
            .map_err(|e| ProviderError::internal("storage task failed").with_source(e))?
            .map_err(|e| e.with_provider(PROVIDER_NAME))
    }
}

impl LocalCalendarProvider for IcsDirectoryProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn request_access(&self) -> BoxFuture<'_, ProviderResult<bool>> {
        Box::pin(async move {
            self.blocking(|store| {
                let granted = match fs::metadata(&store.root) {
                    Ok(meta) => meta.is_dir() && !meta.permissions().readonly(),
                    Err(_) => false,
                };
                debug!(root = %store.root.display(), granted, "checked calendar store access");
                Ok(granted)
            })
            .await
        })
    }

    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarDescriptor>>> {
        Box::pin(async move { self.blocking(|store| store.list_calendars()).await })
    }

    fn list_events<'a>(
        &'a self,
        calendar_ids: &'a [String],
        window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
        let calendar_ids = calendar_ids.to_vec();
        Box::pin(async move {
            self.blocking(move |store| {
                let mut events = Vec::new();
                for calendar_id in &calendar_ids {
                    events.extend(store.list_events(calendar_id, &window)?);
                }
                Ok(events)
            })
            .await
        })
    }

    fn create_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: RawEvent,
    ) -> BoxFuture<'a, ProviderResult<String>> {
        let calendar_id = calendar_id.to_string();
        Box::pin(async move {
            self.blocking(move |store| store.create_event(&calendar_id, event))
                .await
        })
    }

    fn update_event<'a>(
        &'a self,
        id: &'a str,
        patch: EventPatch,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        let id = id.to_string();
        Box::pin(async move { self.blocking(move |store| store.update_event(&id, patch)).await })
    }

    fn delete_event<'a>(&'a self, id: &'a str) -> BoxFuture<'a, ProviderResult<()>> {
        let id = id.to_string();
        Box::pin(async move { self.blocking(move |store| store.delete_event(&id)).await })
    }
}

/// Synchronous filesystem operations, run on the blocking pool.
struct Store {
    root: PathBuf,
}

impl Store {
    fn list_calendars(&self) -> ProviderResult<Vec<CalendarDescriptor>> {
        let mut calendars = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(id) = entry.file_name().to_str().map(String::from) else {
                warn!(path = %entry.path().display(), "skipping calendar with non UTF-8 name");
                continue;
            };
            let metadata = match self.metadata(&id) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(calendar_id = %id, error = %e, "skipping calendar with unreadable metadata");
                    continue;
                }
            };
            calendars.push(CalendarDescriptor::new(
                id.clone(),
                metadata.display_name.unwrap_or(id),
                metadata.source_name,
                metadata.writable,
            ));
        }
        calendars.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(calendars)
    }

    fn metadata(&self, calendar_id: &str) -> ProviderResult<CalendarMetadata> {
        let path = self.root.join(calendar_id).join(METADATA_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ProviderError::invalid_response(format!(
                    "invalid {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CalendarMetadata::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn calendar_dir(&self, calendar_id: &str) -> ProviderResult<PathBuf> {
        validate_id(calendar_id)?;
        let dir = self.root.join(calendar_id);
        if !dir.is_dir() {
            return Err(ProviderError::not_found(format!(
                "calendar '{}' does not exist",
                calendar_id
            )));
        }
        Ok(dir)
    }

    fn ensure_writable(&self, calendar_id: &str) -> ProviderResult<()> {
        if self.metadata(calendar_id)?.writable {
            Ok(())
        } else {
            Err(ProviderError::permission_denied(format!(
                "calendar '{}' is read-only",
                calendar_id
            )))
        }
    }

    fn list_events(&self, calendar_id: &str, window: &TimeWindow) -> ProviderResult<Vec<RawEvent>> {
        let dir = self.calendar_dir(calendar_id)?;
        let mut events = Vec::new();

        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EVENT_EXTENSION) {
                continue;
            }
            let Some(event_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable event file");
                    continue;
                }
            };
            match codec::parse_event_file(&content, calendar_id, event_id) {
                Ok(raw) => {
                    if window.overlaps(raw.start.to_utc(), raw.end.to_utc()) {
                        events.push(raw);
                    }
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable event file"),
            }
        }

        events.sort_by_key(|e| e.start.to_utc());
        debug!(calendar_id, count = events.len(), "listed local events");
        Ok(events)
    }

    /// Finds the calendar holding event `id`.
    fn locate(&self, id: &str) -> ProviderResult<(String, PathBuf)> {
        validate_id(id)?;
        let file_name = format!("{}.{}", id, EVENT_EXTENSION);
        for calendar in self.list_calendars()? {
            let path = self.root.join(&calendar.id).join(&file_name);
            if path.is_file() {
                return Ok((calendar.id, path));
            }
        }
        Err(ProviderError::not_found(format!("event '{}' not found", id)))
    }

    fn create_event(&self, calendar_id: &str, mut event: RawEvent) -> ProviderResult<String> {
        let dir = self.calendar_dir(calendar_id)?;
        self.ensure_writable(calendar_id)?;

        let id = uuid::Uuid::new_v4().to_string();
        event.id = Some(id.clone());
        event.calendar_id = calendar_id.to_string();
        event.updated = Some(chrono::Utc::now());

        let path = dir.join(format!("{}.{}", id, EVENT_EXTENSION));
        write_atomic(&path, &codec::render_event(&event, &id))?;
        info!(calendar_id, event_id = %id, "created event");
        Ok(id)
    }

    fn update_event(&self, id: &str, patch: EventPatch) -> ProviderResult<()> {
        let (calendar_id, path) = self.locate(id)?;
        self.ensure_writable(&calendar_id)?;

        let content = fs::read_to_string(&path)?;
        let mut event = codec::parse_event_file(&content, &calendar_id, id)?;

        if let Some(title) = patch.title {
            event.summary = Some(title);
        }
        if let Some(description) = patch.description {
            event.description = Some(description);
        }
        if let Some(location) = patch.location {
            event.location = Some(location);
        }
        if let Some(start) = patch.start {
            event.start = RawEventTime::DateTime(start);
        }
        if let Some(end) = patch.end {
            event.end = RawEventTime::DateTime(end);
        }
        if !event.is_all_day() && event.end.to_utc() <= event.start.to_utc() {
            return Err(ProviderError::bad_request(
                "event end must be after its start",
            ));
        }
        event.updated = Some(chrono::Utc::now());

        write_atomic(&path, &codec::render_event(&event, id))?;
        info!(calendar_id = %calendar_id, event_id = id, "updated event");
        Ok(())
    }

    fn delete_event(&self, id: &str) -> ProviderResult<()> {
        let (calendar_id, path) = self.locate(id)?;
        self.ensure_writable(&calendar_id)?;
        fs::remove_file(&path)?;
        info!(calendar_id = %calendar_id, event_id = id, "deleted event");
        Ok(())
    }
}

/// Rejects ids that could escape the store root.
fn validate_id(id: &str) -> ProviderResult<()> {
    if id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\'])
        || id.starts_with('.')
    {
        return Err(ProviderError::bad_request(format!("invalid identifier '{}'", id)));
    }
    Ok(())
}

/// Writes through a temporary sibling file and renames it into place.
fn write_atomic(path: &Path, content: &str) -> ProviderResult<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
