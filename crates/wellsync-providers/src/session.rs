//! OAuth session and pending-authorization types.
//!
//! Both hold secrets and are kept in memory only: neither type implements
//! `Serialize`, and their `Debug` output redacts every token.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// Tokens are treated as expired this long before their reported expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// An authenticated session with a remote calendar.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthSession {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    scopes: Vec<String>,
}

impl OAuthSession {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            scopes: Vec::new(),
        }
    }

    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Returns true if the access token has expired, or expires within a
    /// minute. Sessions without a known expiry never expire.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|exp| now + Duration::seconds(EXPIRY_SKEW_SECS) >= exp)
    }
}

impl fmt::Debug for OAuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthSession")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// A started authorization-code flow.
///
/// Holds the URL the user must open, the anti-replay `state` nonce that the
/// callback must echo back, and the PKCE verifier needed for the exchange.
#[derive(Clone)]
pub struct AuthorizationRequest {
    url: Url,
    state: String,
    redirect_uri: String,
    pkce_verifier: Option<String>,
}

impl AuthorizationRequest {
    pub fn new(url: Url, state: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            url,
            state: state.into(),
            redirect_uri: redirect_uri.into(),
            pkce_verifier: None,
        }
    }

    pub fn with_pkce_verifier(mut self, verifier: impl Into<String>) -> Self {
        self.pkce_verifier = Some(verifier.into());
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn pkce_verifier(&self) -> Option<&str> {
        self.pkce_verifier.as_deref()
    }

    /// Checks the `state` value returned on the redirect.
    ///
    /// # Errors
    ///
    /// Returns an authorization error if the value does not match.
    pub fn verify_state(&self, returned: &str) -> ProviderResult<()> {
        if constant_time_eq(self.state.as_bytes(), returned.as_bytes()) {
            Ok(())
        } else {
            Err(ProviderError::authorization(
                "OAuth state mismatch, possible CSRF attack",
            ))
        }
    }
}

impl fmt::Debug for AuthorizationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationRequest")
            .field("url", &self.url.as_str())
            .field("state", &self.state)
            .field("redirect_uri", &self.redirect_uri)
            .field(
                "pkce_verifier",
                &self.pkce_verifier.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_expiry_uses_skew() {
        let now: DateTime<Utc> = "2024-06-01T12:00:00Z".parse().unwrap();

        let fresh = OAuthSession::new("at").with_expires_at(now + Duration::hours(1));
        assert!(!fresh.is_expired_at(now));

        let nearly = OAuthSession::new("at").with_expires_at(now + Duration::seconds(30));
        assert!(nearly.is_expired_at(now));

        let unknown = OAuthSession::new("at");
        assert!(!unknown.is_expired_at(now));
    }

    #[test]
    fn debug_redacts_tokens() {
        let session = OAuthSession::new("secret-access").with_refresh_token("secret-refresh");
        let debug = format!("{:?}", session);
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
        assert!(debug.contains("[REDACTED]"));

        let url = Url::parse("https://accounts.example.com/auth?state=abc").unwrap();
        let request = AuthorizationRequest::new(url, "abc", "http://127.0.0.1:8765/callback")
            .with_pkce_verifier("secret-verifier");
        let debug = format!("{:?}", request);
        assert!(!debug.contains("secret-verifier"));
        assert!(debug.contains("abc"));
    }

    #[test]
    fn state_verification() {
        let url = Url::parse("https://accounts.example.com/auth").unwrap();
        let request = AuthorizationRequest::new(url, "nonce-123", "http://127.0.0.1/cb");

        assert!(request.verify_state("nonce-123").is_ok());

        let err = request.verify_state("nonce-124").unwrap_err();
        assert_eq!(
            err.code(),
            crate::error::ProviderErrorCode::AuthorizationFailed
        );
        assert!(request.verify_state("").is_err());
    }
}
