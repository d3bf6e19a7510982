//! OAuth 2.0 authorization-code flow with PKCE for Google APIs.
//!
//! The protocol details (random `state`, S256 challenge, token requests) are
//! handled by the `oauth2` crate. This module adapts its types to
//! [`AuthorizationRequest`] and [`OAuthSession`].

use chrono::Utc;
use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RefreshToken, RequestTokenError, Scope,
    TokenResponse, TokenUrl,
};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::session::{AuthorizationRequest, OAuthSession};

use super::config::GoogleConfig;

type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Builds consent URLs and talks to the token endpoint.
#[derive(Debug)]
pub struct OAuthClient {
    client: ConfiguredClient,
    http_client: reqwest::Client,
    redirect_uri: String,
    scopes: Vec<String>,
}

impl OAuthClient {
    pub fn new(config: &GoogleConfig) -> ProviderResult<Self> {
        let client = BasicClient::new(ClientId::new(config.credentials.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.credentials.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(config.auth_url.clone()).map_err(|e| {
                ProviderError::configuration(format!("invalid authorization URL: {}", e))
            })?)
            .set_token_uri(TokenUrl::new(config.token_url.clone()).map_err(|e| {
                ProviderError::configuration(format!("invalid token URL: {}", e))
            })?)
            .set_redirect_uri(RedirectUrl::new(config.redirect_uri.clone()).map_err(|e| {
                ProviderError::configuration(format!("invalid redirect URI: {}", e))
            })?);

        // The token endpoint must not be allowed to redirect us elsewhere.
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            client,
            http_client,
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
        })
    }

    /// Generates a consent URL with a fresh `state` and PKCE challenge.
    ///
    /// `access_type=offline` and `prompt=consent` make Google return a
    /// refresh token.
    pub fn authorization_request(&self) -> AuthorizationRequest {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();

        let mut request = self.client.authorize_url(CsrfToken::new_random);
        for scope in &self.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }
        let (url, state) = request
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(challenge)
            .url();

        debug!("built authorization URL for {} scope(s)", self.scopes.len());

        AuthorizationRequest::new(url, state.secret().clone(), &self.redirect_uri)
            .with_pkce_verifier(verifier.secret().clone())
    }

    /// Exchanges an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: Option<&str>,
    ) -> ProviderResult<OAuthSession> {
        let mut request = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()));
        if let Some(verifier) = pkce_verifier {
            request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier.to_string()));
        }

        let token = request
            .request_async(&self.http_client)
            .await
            .map_err(map_token_error)?;

        info!("authorization code exchanged for tokens");
        Ok(self.session_from(&token, None))
    }

    /// Uses a refresh token to obtain a new access token.
    ///
    /// Google usually omits the refresh token from refresh responses; the
    /// one passed in is carried over in that case.
    pub async fn refresh(&self, refresh_token: &str) -> ProviderResult<OAuthSession> {
        let token = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(map_token_error)?;

        info!("refreshed access token");
        Ok(self.session_from(&token, Some(refresh_token)))
    }

    fn session_from(
        &self,
        token: &BasicTokenResponse,
        previous_refresh: Option<&str>,
    ) -> OAuthSession {
        let mut session = OAuthSession::new(token.access_token().secret().clone());

        let refresh = token
            .refresh_token()
            .map(|t| t.secret().clone())
            .or_else(|| previous_refresh.map(String::from));
        if let Some(refresh) = refresh {
            session = session.with_refresh_token(refresh);
        }

        if let Some(expires_in) = token.expires_in()
            && let Ok(expires_in) = chrono::Duration::from_std(expires_in)
        {
            session = session.with_expires_at(Utc::now() + expires_in);
        }

        let scopes = token
            .scopes()
            .map(|granted| granted.iter().map(|s| (**s).clone()).collect())
            .unwrap_or_else(|| self.scopes.clone());
        session.with_scopes(scopes)
    }
}

fn map_token_error<RE>(err: RequestTokenError<RE, BasicErrorResponse>) -> ProviderError
where
    RE: std::error::Error + 'static,
{
    match err {
        RequestTokenError::ServerResponse(response) => {
            ProviderError::authentication(format!("token endpoint rejected request: {}", response))
        }
        RequestTokenError::Request(e) => {
            ProviderError::network(format!("token request failed: {}", e))
        }
        RequestTokenError::Parse(e, _body) => {
            ProviderError::invalid_response(format!("invalid token response: {}", e))
        }
        RequestTokenError::Other(msg) => ProviderError::internal(msg),
    }
}
