//! Google Calendar provider configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ProviderError, ProviderResult};

/// OAuth 2.0 client credentials from the Google Cloud Console.
#[derive(Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Shape of the credentials JSON downloaded from the console: either an
/// `installed`/`web` section or flat `client_id`/`client_secret` keys.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Loads credentials from a Google Cloud Console JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ProviderError::configuration(format!("failed to read credentials file: {}", e))
        })?;
        Self::from_json(&content)
    }

    /// Parses credentials from the console JSON format.
    pub fn from_json(json: &str) -> ProviderResult<Self> {
        let file: CredentialsFile = serde_json::from_str(json).map_err(|e| {
            ProviderError::configuration(format!("failed to parse credentials JSON: {}", e))
        })?;

        if let Some(creds) = file.installed.or(file.web) {
            return Ok(Self::new(creds.client_id, creds.client_secret));
        }

        match (file.client_id, file.client_secret) {
            (Some(id), Some(secret)) => Ok(Self::new(id, secret)),
            _ => Err(ProviderError::configuration(
                "credentials must contain an 'installed'/'web' section or 'client_id'/'client_secret'",
            )),
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Configuration for [`GoogleProvider`](super::GoogleProvider).
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub credentials: OAuthCredentials,

    /// Calendar to list events from. Defaults to `"primary"`.
    pub calendar_id: String,

    /// Where Google redirects after consent; must be registered for the
    /// client. Defaults to a loopback URI.
    pub redirect_uri: String,

    pub scopes: Vec<String>,

    pub auth_url: String,
    pub token_url: String,
    /// Base URL of the Calendar v3 REST API.
    pub api_base: String,

    /// Per-request HTTP timeout.
    pub timeout: Duration,

    /// `maxResults` sent with each page request.
    pub page_size: u32,

    pub user_agent: String,
}

impl GoogleConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_PAGE_SIZE: u32 = 250;
    pub const DEFAULT_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar.readonly";
    pub const DEFAULT_REDIRECT_URI: &'static str = "http://127.0.0.1:8765/callback";
    pub const AUTH_URL: &'static str = "https://accounts.google.com/o/oauth2/v2/auth";
    pub const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";
    pub const API_BASE: &'static str = "https://www.googleapis.com/calendar/v3";

    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            calendar_id: "primary".to_string(),
            redirect_uri: Self::DEFAULT_REDIRECT_URI.to_string(),
            scopes: vec![Self::DEFAULT_SCOPE.to_string()],
            auth_url: Self::AUTH_URL.to_string(),
            token_url: Self::TOKEN_URL.to_string(),
            api_base: Self::API_BASE.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            page_size: Self::DEFAULT_PAGE_SIZE,
            user_agent: format!("wellsync/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_calendar_id(mut self, id: impl Into<String>) -> Self {
        self.calendar_id = id.into();
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    /// Uses `http://127.0.0.1:<port>/callback` as redirect URI.
    pub fn with_loopback_port(self, port: u16) -> Self {
        self.with_redirect_uri(format!("http://127.0.0.1:{}/callback", port))
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Overrides the OAuth and API endpoints, e.g. to point at a mock server.
    pub fn with_endpoints(
        mut self,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        self.auth_url = auth_url.into();
        self.token_url = token_url.into();
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.credentials
            .validate()
            .map_err(|e| format!("invalid credentials: {}", e))?;

        if self.scopes.is_empty() {
            return Err("at least one OAuth scope is required".to_string());
        }
        if self.calendar_id.is_empty() {
            return Err("calendar_id must not be empty".to_string());
        }
        if !(1..=2500).contains(&self.page_size) {
            return Err("page_size must be between 1 and 2500".to_string());
        }
        url::Url::parse(&self.redirect_uri)
            .map_err(|e| format!("invalid redirect URI: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credentials() -> OAuthCredentials {
        OAuthCredentials::new("test-client.apps.googleusercontent.com", "test-secret")
    }

    #[test]
    fn defaults() {
        let config = GoogleConfig::new(test_credentials());
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.scopes, vec![GoogleConfig::DEFAULT_SCOPE.to_string()]);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_methods() {
        let config = GoogleConfig::new(test_credentials())
            .with_calendar_id("family@group.calendar.google.com")
            .with_loopback_port(9100)
            .with_page_size(50)
            .with_endpoints("http://mock/auth", "http://mock/token", "http://mock/api");

        assert_eq!(config.calendar_id, "family@group.calendar.google.com");
        assert_eq!(config.redirect_uri, "http://127.0.0.1:9100/callback");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.token_url, "http://mock/token");
    }

    #[test]
    fn validation_failures() {
        assert!(
            GoogleConfig::new(test_credentials())
                .with_scopes(vec![])
                .validate()
                .is_err()
        );
        assert!(
            GoogleConfig::new(test_credentials())
                .with_page_size(0)
                .validate()
                .is_err()
        );
        assert!(
            GoogleConfig::new(test_credentials())
                .with_redirect_uri("not a url")
                .validate()
                .is_err()
        );
        assert!(
            GoogleConfig::new(OAuthCredentials::new("id", ""))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn credentials_from_json_formats() {
        let installed = r#"{"installed": {"client_id": "a.apps.googleusercontent.com", "client_secret": "s1", "project_id": "p"}}"#;
        let creds = OAuthCredentials::from_json(installed).unwrap();
        assert_eq!(creds.client_secret, "s1");

        let web = r#"{"web": {"client_id": "b", "client_secret": "s2"}}"#;
        assert_eq!(OAuthCredentials::from_json(web).unwrap().client_id, "b");

        let flat = r#"{"client_id": "c", "client_secret": "s3", "refresh_token": "x"}"#;
        assert_eq!(OAuthCredentials::from_json(flat).unwrap().client_id, "c");

        assert!(OAuthCredentials::from_json(r#"{"other": {}}"#).is_err());
        assert!(OAuthCredentials::from_json("not json").is_err());
    }

    #[test]
    fn debug_hides_secret() {
        let debug = format!("{:?}", test_credentials());
        assert!(!debug.contains("test-secret"));
    }
}
