//! Persisted user settings.
//!
//! The engine keeps its state in memory only. The CLI remembers whether the
//! user turned sync on through a small key-value store and restores it on
//! startup by calling `enable(true)`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CliError, CliResult};

/// Key under which the `enabled` flag is stored.
pub const SYNC_ENABLED_KEY: &str = "sync.enabled";

/// Generic key-value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> CliResult<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> CliResult<()>;
}

/// A [`KeyValueStore`] backed by a JSON object on disk.
///
/// Values are stored as UTF-8 strings; non-UTF-8 values are rejected.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> CliResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            CliError::Settings(format!("failed to parse {}: {}", self.path.display(), e))
        })
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> CliResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(values)
            .map_err(|e| CliError::Settings(format!("failed to serialize settings: {}", e)))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> CliResult<Option<Vec<u8>>> {
        Ok(self.read_all()?.remove(key).map(String::into_bytes))
    }

    fn set(&self, key: &str, value: &[u8]) -> CliResult<()> {
        let value = String::from_utf8(value.to_vec())
            .map_err(|_| CliError::Settings(format!("value for '{}' is not UTF-8", key)))?;
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value);
        self.write_all(&values)?;
        debug!(key, path = %self.path.display(), "saved setting");
        Ok(())
    }
}

/// Reads the persisted `enabled` flag. Missing means off.
pub fn load_enabled(store: &dyn KeyValueStore) -> CliResult<bool> {
    Ok(store
        .get(SYNC_ENABLED_KEY)?
        .is_some_and(|value| value == b"true"))
}

/// Persists the `enabled` flag.
pub fn save_enabled(store: &dyn KeyValueStore, enabled: bool) -> CliResult<()> {
    let value: &[u8] = if enabled { b"true" } else { b"false" };
    store.set(SYNC_ENABLED_KEY, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("settings.json"));
        assert_eq!(store.get("anything").unwrap(), None);
        assert!(!load_enabled(&store).unwrap());
    }

    #[test]
    fn set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("settings.json"));
        store.set("profile.name", b"Ada").unwrap();
        store.set("other", b"1").unwrap();

        assert_eq!(store.get("profile.name").unwrap(), Some(b"Ada".to_vec()));
        assert_eq!(store.get("other").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn enabled_flag_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        save_enabled(&JsonFileStore::new(&path), true).unwrap();
        assert!(load_enabled(&JsonFileStore::new(&path)).unwrap());

        save_enabled(&JsonFileStore::new(&path), false).unwrap();
        assert!(!load_enabled(&JsonFileStore::new(&path)).unwrap());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonFileStore::new(&path).get("x"),
            Err(CliError::Settings(_))
        ));
    }

    #[test]
    fn non_utf8_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("settings.json"));
        assert!(store.set("bin", &[0xff, 0xfe]).is_err());
    }
}
