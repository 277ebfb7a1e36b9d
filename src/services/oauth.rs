//! OAuth authorization-code flow against GitLab.
//!
//! ```text
//! Unauthenticated -> Redirecting -> AwaitingCallback -> Exchanging -> Authenticated
//! Authenticated -> Unauthenticated   (logout, or any 401 from the API)
//! ```
//!
//! The visitor leaves the page for GitLab's authorize screen carrying the
//! current location in `state`. GitLab sends them back to the redirect URI
//! with `code` (and `state`); the code is exchanged for an access token which
//! is persisted in the [`TokenStore`].

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Config;
use crate::services::gitlab_client::DEFAULT_TIMEOUT_SECS;
use crate::services::page::Page;
use crate::services::token_store::TokenStore;
use crate::services::urls::{
    append_query_param, build_authorize_url, build_token_url, query_param, strip_query_params,
    AuthorizeParams, CALLBACK_PARAMS,
};

/// Where the visitor is in the login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthState {
    Unauthenticated,
    Redirecting,
    AwaitingCallback,
    Exchanging,
    Authenticated,
}

/// Result of handling an OAuth callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CallbackOutcome {
    /// A new token is stored and the page is navigating back to where the
    /// login started.
    Restored,
    /// A new token is stored; the visitor stays on this page.
    Stored,
    /// The code was not exchanged. Any previously stored token is kept.
    Rejected,
}

/// `code` and `state` found in the page URL after GitLab redirected back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: String,
    pub state: Option<String>,
}

impl CallbackParams {
    /// Read the callback parameters from a page location, if a code is present.
    pub fn from_location(location: &str) -> Option<Self> {
        let code = query_param(location, "code").filter(|c| !c.is_empty())?;
        Some(Self {
            code,
            state: query_param(location, "state").filter(|s| !s.is_empty()),
        })
    }
}

/// Body of `POST /oauth/token`.
#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    code: &'a str,
    grant_type: &'a str,
    redirect_uri: &'a str,
}

/// Response of `POST /oauth/token`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// Login state machine for one page load.
#[derive(Debug)]
pub struct OAuthFlow {
    state: AuthState,
    timeout_secs: u64,
}

impl OAuthFlow {
    /// Start in `Authenticated` when a token is already stored.
    pub fn new(tokens: &TokenStore) -> Self {
        let state = if tokens.has_token() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        };

        Self {
            state,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Override the token exchange timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Inspect the page for an OAuth callback.
    ///
    /// Moves to `AwaitingCallback` when the location carries a `code`.
    pub fn detect(&mut self, page: &dyn Page) -> Option<CallbackParams> {
        let params = CallbackParams::from_location(&page.location())?;
        self.state = AuthState::AwaitingCallback;
        Some(params)
    }

    /// Send the visitor to GitLab's authorize screen.
    ///
    /// The current location travels in `state` so the visitor can be brought
    /// back to the page they started from.
    pub fn start_login(&mut self, config: &Config, page: &mut dyn Page) {
        let state = urlencoding::encode(&page.location()).into_owned();
        let url = build_authorize_url(
            &config.instance_url,
            AuthorizeParams {
                client_id: &config.client_id,
                redirect_uri: &config.redirect_uri,
                state: &state,
            },
        );

        log::info!("Redirecting to {}/oauth/authorize", config.instance_url);
        self.state = AuthState::Redirecting;
        page.navigate(&url);
    }

    /// Exchange the callback code for an access token.
    ///
    /// Never fails: an unsuccessful exchange is logged and leaves any
    /// previously stored token untouched. The flow then falls back to
    /// `Authenticated` if such a token exists, `Unauthenticated` otherwise.
    /// After a successful exchange with a `state`, the visitor is sent back to
    /// the original page with the code re-appended.
    pub async fn handle_callback(
        &mut self,
        config: &Config,
        tokens: &TokenStore,
        page: &mut dyn Page,
        params: &CallbackParams,
    ) -> CallbackOutcome {
        self.state = AuthState::Exchanging;

        let token = match self.exchange_code(config, &params.code).await {
            Ok(token) => token,
            Err(e) => {
                log::error!("Error requesting access token: {}", e);
                return self.reject(tokens);
            }
        };

        if let Err(e) = tokens.set(&token) {
            log::error!("Failed to persist access token: {}", e);
            return self.reject(tokens);
        }
        self.state = AuthState::Authenticated;

        let Some(state) = &params.state else {
            return CallbackOutcome::Stored;
        };
        match restore_url(state, &params.code) {
            Ok(url) => {
                page.navigate(&url);
                CallbackOutcome::Restored
            }
            Err(e) => {
                log::warn!("Ignoring unusable OAuth state: {}", e);
                CallbackOutcome::Stored
            }
        }
    }

    fn reject(&mut self, tokens: &TokenStore) -> CallbackOutcome {
        self.state = if tokens.has_token() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        };
        CallbackOutcome::Rejected
    }

    /// `POST {instance}/oauth/token` with the authorization code.
    async fn exchange_code(&self, config: &Config, code: &str) -> Result<String, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        let url = build_token_url(&config.instance_url);
        let response = client
            .post(&url)
            .json(&TokenRequest {
                client_id: &config.client_id,
                code,
                grant_type: "authorization_code",
                redirect_uri: &config.redirect_uri,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::gitlab_api_full(
                format!("Failed to get access token: {}", body),
                status.as_u16(),
                "/oauth/token",
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::internal(format!("Failed to parse token response: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(AppError::unauthorized("Token response carried no access token"));
        }
        if let Some(expires_in) = token.expires_in {
            log::debug!("Access token expires in {}s", expires_in);
        }

        Ok(token.access_token)
    }

    /// Drop the token and reset the page.
    ///
    /// `code`/`state` are removed from the address bar first so the reload
    /// does not replay the callback.
    pub fn logout(&mut self, tokens: &TokenStore, page: &mut dyn Page) {
        if let Err(e) = tokens.clear() {
            log::error!("Failed to clear access token: {}", e);
        }
        self.state = AuthState::Unauthenticated;

        match strip_query_params(&page.location(), &CALLBACK_PARAMS) {
            Ok(clean) => page.replace_location(&clean),
            Err(e) => log::warn!("Could not clean page URL: {}", e),
        }
        page.reload();
    }

    /// The API rejected the token.
    pub fn on_unauthorized(&mut self) {
        self.state = AuthState::Unauthenticated;
    }
}

/// Decode the original page URL from `state` and re-append the code.
fn restore_url(state: &str, code: &str) -> Result<String, AppError> {
    let original = urlencoding::decode(state)
        .map_err(|e| AppError::internal(format!("State is not valid UTF-8: {}", e)))?;
    append_query_param(&original, "code", code)
}
