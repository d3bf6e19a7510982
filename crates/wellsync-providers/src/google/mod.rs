//! Google Calendar remote provider.
//!
//! - OAuth 2.0 authorization-code flow with PKCE and a random `state`
//!   (via the `oauth2` crate), requesting offline access so sessions can be
//!   refreshed
//! - `events.list` on a single calendar with server-side recurring event
//!   expansion and pagination
//!
//! Sessions are never persisted by this module. The embedding application
//! receives the redirect (see the CLI's loopback receiver), hands the code
//! back through the engine, and keeps the resulting [`OAuthSession`] in
//! memory.
//!
//! # Example
//!
//! ```ignore
//! use wellsync_providers::google::{GoogleConfig, GoogleProvider, OAuthCredentials};
//!
//! let credentials = OAuthCredentials::from_file("client_secret.json")?;
//! let provider = GoogleProvider::new(GoogleConfig::new(credentials).with_loopback_port(8765))?;
//! let request = provider.begin_authorization()?;
//! open::that(request.url().as_str())?;
//! ```
//!
//! [`OAuthSession`]: crate::OAuthSession

mod client;
mod config;
mod oauth;
mod provider;

pub use client::GoogleCalendarClient;
pub use config::{GoogleConfig, OAuthCredentials};
pub use oauth::OAuthClient;
pub use provider::GoogleProvider;
