//! Access gate in front of the local calendar provider.
//!
//! The gate fails closed: a denial, a provider error, or a prompt that does
//! not finish within the configured timeout all count as "not granted".
//! Only a grant is remembered, so a later call after the user fixes their
//! settings prompts again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};
use wellsync_providers::{LocalCalendarProvider, ProviderError, ProviderResult};

use crate::config::{EngineConfig, Platform};

/// Requests and caches the local provider's access grant.
pub struct PermissionGate {
    provider: Arc<dyn LocalCalendarProvider>,
    granted: AtomicBool,
    timeout: Duration,
    platform: Platform,
    app_name: String,
}

impl PermissionGate {
    pub fn new(provider: Arc<dyn LocalCalendarProvider>, config: &EngineConfig) -> Self {
        Self {
            provider,
            granted: AtomicBool::new(false),
            timeout: config.permission_timeout,
            platform: config.platform,
            app_name: config.app_name.clone(),
        }
    }

    /// Returns true once access has been granted in this process.
    pub fn is_granted(&self) -> bool {
        self.granted.load(Ordering::Acquire)
    }

    /// Asks for access, prompting through the provider if no grant is
    /// cached. Returns immediately once a grant has been seen.
    pub async fn request_access(&self) -> bool {
        if self.is_granted() {
            return true;
        }

        debug!(provider = self.provider.name(), "requesting calendar access");
        match tokio::time::timeout(self.timeout, self.provider.request_access()).await {
            Ok(Ok(true)) => {
                self.granted.store(true, Ordering::Release);
                info!(provider = self.provider.name(), "calendar access granted");
                true
            }
            Ok(Ok(false)) => {
                warn!(provider = self.provider.name(), "calendar access denied");
                false
            }
            Ok(Err(e)) => {
                warn!(provider = self.provider.name(), error = %e, "calendar access request failed");
                false
            }
            Err(_) => {
                warn!(
                    provider = self.provider.name(),
                    timeout_secs = self.timeout.as_secs(),
                    "calendar access request timed out"
                );
                false
            }
        }
    }

    /// Like [`request_access`](Self::request_access), but returns a
    /// permission error carrying the remediation text on denial.
    pub async fn ensure_access(&self) -> ProviderResult<()> {
        if self.request_access().await {
            Ok(())
        } else {
            Err(ProviderError::permission_denied(self.remediation())
                .with_provider(self.provider.name()))
        }
    }

    /// Text telling the user how to grant access on their platform.
    pub fn remediation(&self) -> String {
        remediation_text(self.platform, &self.app_name)
    }
}

/// Builds the platform-specific remediation message.
pub fn remediation_text(platform: Platform, app_name: &str) -> String {
    match platform {
        Platform::Ios => format!(
            "Calendar access is disabled. Open Settings > Privacy & Security > Calendars and allow access for {}.",
            app_name
        ),
        Platform::Android => format!(
            "Calendar permission was denied. Open Settings > Apps > {} > Permissions and allow Calendar.",
            app_name
        ),
    }
}
