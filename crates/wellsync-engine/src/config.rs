//! Engine configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wellsync_core::SyncWindow;

/// Mobile platform the engine runs on. Selects the remediation text shown
/// when calendar access is denied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Ios,
    Android,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            other => Err(format!("unknown platform '{}', expected ios or android", other)),
        }
    }
}

/// Sync engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Application name used in the managed-marker suffix and remediation
    /// text.
    pub app_name: String,
    /// Window fetched around "now" on every sync.
    pub window: SyncWindow,
    /// Upper bound for each provider fetch and for token exchange/refresh.
    pub fetch_timeout: Duration,
    /// Upper bound for a permission prompt.
    pub permission_timeout: Duration,
    pub platform: Platform,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_name: "WellSync".to_string(),
            window: SyncWindow::default(),
            fetch_timeout: Duration::from_secs(30),
            permission_timeout: Duration::from_secs(60),
            platform: Platform::default(),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with the given application name.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            ..Default::default()
        }
    }

    /// Builder: set the sync window.
    pub fn with_window(mut self, window: SyncWindow) -> Self {
        self.window = window;
        self
    }

    /// Builder: set the per-provider fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Builder: set the permission prompt timeout.
    pub fn with_permission_timeout(mut self, timeout: Duration) -> Self {
        self.permission_timeout = timeout;
        self
    }

    /// Builder: set the platform.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Validates the configuration.
    ///
    /// Each side of the sync window is limited to [`MAX_WINDOW_DAYS`].
    pub fn validate(&self) -> Result<(), String> {
        if self.app_name.trim().is_empty() {
            return Err("app_name must not be empty".to_string());
        }
        if self.fetch_timeout.is_zero() {
            return Err("fetch_timeout must be greater than zero".to_string());
        }
        if self.permission_timeout.is_zero() {
            return Err("permission_timeout must be greater than zero".to_string());
        }
        if self.window.lookback_days == 0 && self.window.lookahead_days == 0 {
            return Err("sync window must not be empty".to_string());
        }
        if self.window.lookback_days > MAX_WINDOW_DAYS
            || self.window.lookahead_days > MAX_WINDOW_DAYS
        {
            return Err(format!(
                "sync window days must be at most {}",
                MAX_WINDOW_DAYS
            ));
        }
        Ok(())
    }
}

/// Upper bound for either side of the sync window (about 100 years).
pub const MAX_WINDOW_DAYS: u32 = 36_500;
