//! [`RemoteCalendarProvider`] implementation for Google Calendar.

use tracing::debug;
use wellsync_core::TimeWindow;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, RemoteCalendarProvider};
use crate::raw_event::RawEvent;
use crate::session::{AuthorizationRequest, OAuthSession};

use super::client::GoogleCalendarClient;
use super::config::GoogleConfig;
use super::oauth::OAuthClient;

const PROVIDER_NAME: &str = "google";

/// Google Calendar provider.
///
/// Stateless with respect to credentials: the session is supplied by the
/// caller on every call and never stored here.
#[derive(Debug)]
pub struct GoogleProvider {
    config: GoogleConfig,
    oauth_client: OAuthClient,
    api_client: GoogleCalendarClient,
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config
            .validate()
            .map_err(|e| ProviderError::configuration(e).with_provider(PROVIDER_NAME))?;

        let oauth_client = OAuthClient::new(&config)?;
        let api_client = GoogleCalendarClient::new(&config)?;

        Ok(Self {
            config,
            oauth_client,
            api_client,
        })
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }
}

impl RemoteCalendarProvider for GoogleProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn begin_authorization(&self) -> ProviderResult<AuthorizationRequest> {
        Ok(self.oauth_client.authorization_request())
    }

    fn exchange_code<'a>(
        &'a self,
        request: &'a AuthorizationRequest,
        code: &'a str,
    ) -> BoxFuture<'a, ProviderResult<OAuthSession>> {
        Box::pin(async move {
            self.oauth_client
                .exchange_code(code, request.pkce_verifier())
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))
        })
    }

    fn refresh_session<'a>(
        &'a self,
        session: &'a OAuthSession,
    ) -> BoxFuture<'a, ProviderResult<OAuthSession>> {
        Box::pin(async move {
            let refresh_token = session.refresh_token().ok_or_else(|| {
                ProviderError::authentication("no refresh token, re-authorization required")
                    .with_provider(PROVIDER_NAME)
            })?;

            debug!("refreshing expired access token");
            self.oauth_client
                .refresh(refresh_token)
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))
        })
    }

    fn list_events<'a>(
        &'a self,
        session: &'a OAuthSession,
        window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
        Box::pin(async move {
            self.api_client
                .list_events(
                    session.access_token(),
                    &self.config.calendar_id,
                    window.start,
                    window.end,
                )
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))
        })
    }
}
