//! CLI configuration.
//!
//! All settings live in `~/.config/wellsync/config.toml` by default:
//!
//! ```toml
//! app_name = "WellSync"
//! debug = false
//!
//! [local]
//! root = "/home/me/.local/share/wellsync/calendars"
//! platform = "ios"
//!
//! [google]
//! client_id = "env::WELLSYNC_GOOGLE_CLIENT_ID"
//! client_secret = "pass::google/wellsync"
//! calendar_id = "primary"
//! redirect_port = 8765
//!
//! [sync]
//! lookback_days = 30
//! lookahead_days = 90
//! fetch_timeout_secs = 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wellsync_core::SyncWindow;
use wellsync_engine::{EngineConfig, Platform};

/// Configuration for the wellsync CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Name stamped into managed events and shown in remediation text.
    pub app_name: String,

    /// Debug logging.
    pub debug: bool,

    /// Local calendar store.
    pub local: LocalSettings,

    /// Google Calendar settings.
    pub google: Option<GoogleSettings>,

    /// Sync window and timeouts.
    pub sync: SyncSettings,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            app_name: "WellSync".to_string(),
            debug: false,
            local: LocalSettings::default(),
            google: None,
            sync: SyncSettings::default(),
        }
    }
}

/// Local calendar store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSettings {
    /// Root of the calendar directory. Defaults to
    /// `<data dir>/wellsync/calendars`.
    pub root: Option<PathBuf>,

    /// Platform whose settings app the remediation text refers to.
    pub platform: Platform,
}

/// Sync window and timeout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub lookback_days: u32,
    pub lookahead_days: u32,
    pub fetch_timeout_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        let window = SyncWindow::default();
        Self {
            lookback_days: window.lookback_days,
            lookahead_days: window.lookahead_days,
            fetch_timeout_secs: 30,
        }
    }
}

/// Google Calendar settings.
///
/// `client_id` and `client_secret` accept `pass::` and `env::` references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub calendar_id: String,
    /// Port of the loopback redirect receiver. Must match the redirect URI
    /// registered for the OAuth client.
    pub redirect_port: u16,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            calendar_id: "primary".to_string(),
            redirect_port: 8765,
        }
    }
}

impl CliConfig {
    /// Loads configuration from the default path, or defaults if the file
    /// does not exist.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wellsync")
            .join("config.toml")
    }

    /// Returns the default data directory.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wellsync")
    }

    /// Root of the local calendar store.
    pub fn local_root(&self) -> PathBuf {
        self.local
            .root
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("calendars"))
    }

    /// Path of the persisted settings (the `enabled` flag).
    pub fn settings_path(&self) -> PathBuf {
        Self::default_data_dir().join("settings.json")
    }

    /// Builds the engine configuration.
    pub fn engine_config(&self) -> Result<EngineConfig, String> {
        let config = EngineConfig::new(&self.app_name)
            .with_window(SyncWindow::new(
                self.sync.lookback_days,
                self.sync.lookahead_days,
            ))
            .with_fetch_timeout(Duration::from_secs(self.sync.fetch_timeout_secs))
            .with_platform(self.local.platform);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "google")]
impl GoogleSettings {
    /// Resolves credentials and builds the provider configuration.
    pub fn to_provider_config(&self) -> Result<wellsync_providers::google::GoogleConfig, String> {
        use wellsync_providers::google::GoogleConfig;

        let credentials = self.resolve_credentials()?;
        credentials.validate().map_err(|e| e.to_string())?;

        Ok(GoogleConfig::new(credentials)
            .with_calendar_id(&self.calendar_id)
            .with_loopback_port(self.redirect_port))
    }

    pub(crate) fn resolve_credentials(
        &self,
    ) -> Result<wellsync_providers::google::OAuthCredentials, String> {
        use wellsync_providers::google::OAuthCredentials;

        let raw_id = self.client_id.as_deref().ok_or_else(|| {
            format!(
                "Google credentials not found. Add to {}:\n  \
                 [google]\n  \
                 client_id = \"YOUR_ID.apps.googleusercontent.com\"\n  \
                 client_secret = \"YOUR_SECRET\"",
                CliConfig::default_path().display()
            )
        })?;
        let raw_secret = self
            .client_secret
            .as_deref()
            .ok_or_else(|| "client_secret is missing from the [google] section".to_string())?;

        let client_id = crate::secret::resolve(raw_id)
            .map_err(|e| format!("failed to resolve client_id: {}", e))?;
        let client_secret = crate::secret::resolve(raw_secret)
            .map_err(|e| format!("failed to resolve client_secret: {}", e))?;

        Ok(OAuthCredentials::new(client_id, client_secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert_eq!(config.app_name, "WellSync");
        assert!(config.google.is_none());
        assert_eq!(config.local.platform, Platform::Ios);

        let engine = config.engine_config().unwrap();
        assert_eq!(engine.window, SyncWindow::new(30, 90));
        assert_eq!(engine.fetch_timeout, Duration::from_secs(30));
    }

    #[test]
    fn full_file() {
        let content = r#"
app_name = "Coach"
debug = true

[local]
root = "/tmp/cals"
platform = "android"

[google]
client_id = "id.apps.googleusercontent.com"
client_secret = "secret"
calendar_id = "work@example.com"
redirect_port = 9000

[sync]
lookback_days = 7
lookahead_days = 14
fetch_timeout_secs = 5
"#;
        let config: CliConfig = toml::from_str(content).unwrap();
        assert!(config.debug);
        assert_eq!(config.local_root(), PathBuf::from("/tmp/cals"));

        let engine = config.engine_config().unwrap();
        assert_eq!(engine.app_name, "Coach");
        assert_eq!(engine.platform, Platform::Android);
        assert_eq!(engine.window, SyncWindow::new(7, 14));
        assert_eq!(engine.fetch_timeout, Duration::from_secs(5));

        let google = config.google.unwrap();
        assert_eq!(google.calendar_id, "work@example.com");
        assert_eq!(google.redirect_port, 9000);
    }

    #[test]
    fn invalid_engine_values_are_rejected() {
        let config: CliConfig = toml::from_str("[sync]\nfetch_timeout_secs = 0\n").unwrap();
        assert!(config.engine_config().is_err());
    }

    #[test]
    fn unknown_platform_fails_to_parse() {
        assert!(toml::from_str::<CliConfig>("[local]\nplatform = \"symbian\"\n").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "app_name = \"FromFile\"\n").unwrap();
        assert_eq!(CliConfig::load_from(&path).unwrap().app_name, "FromFile");
        assert!(CliConfig::load_from(&dir.path().join("missing.toml")).is_err());
    }

    #[cfg(feature = "google")]
    #[test]
    fn google_settings_to_provider_config() {
        unsafe {
            std::env::set_var("_WELLSYNC_TEST_CLIENT_SECRET", "env-secret");
        }
        let settings = GoogleSettings {
            client_id: Some("id.apps.googleusercontent.com".to_string()),
            client_secret: Some("env::_WELLSYNC_TEST_CLIENT_SECRET".to_string()),
            calendar_id: "primary".to_string(),
            redirect_port: 9123,
        };
        let config = settings.to_provider_config().unwrap();
        assert_eq!(config.credentials.client_secret, "env-secret");
        assert_eq!(config.redirect_uri, "http://127.0.0.1:9123/callback");
        unsafe {
            std::env::remove_var("_WELLSYNC_TEST_CLIENT_SECRET");
        }
    }

    #[cfg(feature = "google")]
    #[test]
    fn google_settings_without_credentials_error() {
        let err = GoogleSettings::default().to_provider_config().unwrap_err();
        assert!(err.contains("credentials not found"));
    }
}
