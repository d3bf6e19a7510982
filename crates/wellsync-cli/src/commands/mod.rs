//! Command implementations.

pub mod config;
pub mod events;
pub mod sync;

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use wellsync_engine::{SyncEngine, SyncReport, SyncResult};
use wellsync_providers::ics::{CalendarMetadata, IcsDirectoryProvider};

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::settings::{JsonFileStore, KeyValueStore, load_enabled};

/// Calendar created in a fresh store.
const DEFAULT_CALENDAR_ID: &str = "personal";

/// Builds the engine over the local store, optionally with Google Calendar
/// attached.
pub fn build_engine(config: &CliConfig, google: bool) -> CliResult<SyncEngine> {
    let engine_config = config.engine_config().map_err(CliError::Config)?;
    let local = open_local_store(&config.local_root())?;
    let engine = SyncEngine::new(Arc::new(local), engine_config);

    if google {
        attach_google(engine, config)
    } else {
        Ok(engine)
    }
}

/// Opens the calendar directory, creating it with one calendar on first
/// use.
fn open_local_store(root: &Path) -> CliResult<IcsDirectoryProvider> {
    let provider = IcsDirectoryProvider::new(root);
    if !root.exists() {
        std::fs::create_dir_all(root)?;
        let metadata = CalendarMetadata {
            display_name: Some("Personal".to_string()),
            ..Default::default()
        };
        provider.create_calendar(DEFAULT_CALENDAR_ID, &metadata)?;
        info!(root = %root.display(), "initialized local calendar store");
    }
    Ok(provider)
}

#[cfg(feature = "google")]
fn attach_google(engine: SyncEngine, config: &CliConfig) -> CliResult<SyncEngine> {
    use wellsync_providers::google::GoogleProvider;

    let settings = config.google.as_ref().ok_or_else(|| {
        CliError::Config(format!(
            "no [google] section in {}",
            CliConfig::default_path().display()
        ))
    })?;
    let provider_config = settings.to_provider_config().map_err(CliError::Config)?;
    let provider = GoogleProvider::new(provider_config)?;
    Ok(engine.with_remote(Arc::new(provider)))
}

#[cfg(not(feature = "google"))]
fn attach_google(_engine: SyncEngine, _config: &CliConfig) -> CliResult<SyncEngine> {
    Err(CliError::Config(
        "this build has no Google Calendar support".to_string(),
    ))
}

/// Opens the persisted settings store.
pub fn settings_store(config: &CliConfig) -> JsonFileStore {
    JsonFileStore::new(config.settings_path())
}

/// Restores the persisted `enabled` flag. Returns the result of the pass
/// this triggers, if any.
pub async fn restore(
    engine: &SyncEngine,
    store: &dyn KeyValueStore,
) -> CliResult<Option<SyncResult<SyncReport>>> {
    if load_enabled(store)? {
        info!("sync was enabled, restoring");
        Ok(engine.enable(true).await)
    } else {
        Ok(None)
    }
}
