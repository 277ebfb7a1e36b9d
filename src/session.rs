//! Per-page-load session context.
//!
//! Everything the widget learns while running (project id, resolved issue,
//! current user, login state) lives here. A session is created once per page
//! load and handed `&mut` to each command, so no two flows can mutate it at
//! the same time.

use crate::error::AppError;
use crate::models::{Config, CurrentUser, Issue, ProjectRef};
use crate::services::gitlab_client::{GitLabClient, GitLabClientConfig, DEFAULT_TIMEOUT_SECS};
use crate::services::oauth::{AuthState, OAuthFlow};
use crate::services::token_store::TokenStore;

/// Widget state for one page load.
#[derive(Debug)]
pub struct Session {
    pub(crate) config: Config,
    pub(crate) tokens: TokenStore,
    pub(crate) auth: OAuthFlow,
    pub(crate) project: Option<ProjectRef>,
    pub(crate) issue: Option<Issue>,
    pub(crate) current_user: Option<CurrentUser>,
    timeout_secs: u64,
}

impl Session {
    pub fn new(config: Config, tokens: TokenStore) -> Self {
        let auth = OAuthFlow::new(&tokens);
        Self {
            config,
            tokens,
            auth,
            project: None,
            issue: None,
            current_user: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Override the request timeout of every client this session builds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self.auth = self.auth.with_timeout(timeout_secs);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth.state()
    }

    pub fn project(&self) -> Option<ProjectRef> {
        self.project
    }

    pub fn issue(&self) -> Option<&Issue> {
        self.issue.as_ref()
    }

    pub fn current_user(&self) -> Option<&CurrentUser> {
        self.current_user.as_ref()
    }

    /// API client authenticated with the stored token.
    ///
    /// # Errors
    /// `Unauthorized` when no token is stored.
    pub fn client(&self) -> Result<GitLabClient, AppError> {
        let token = self
            .tokens
            .get()?
            .ok_or_else(|| AppError::unauthorized("Not logged in"))?;

        GitLabClient::new(GitLabClientConfig {
            base_url: self.config.instance_url.clone(),
            token,
            timeout_secs: self.timeout_secs,
        })
    }

    /// Forget everything learned with the previous token.
    pub(crate) fn reset(&mut self) {
        self.project = None;
        self.issue = None;
        self.current_user = None;
    }

    /// Apply the propagation policy to a failed step.
    ///
    /// The error is logged; a rejected token is cleared and the session
    /// falls back to `Unauthenticated`.
    pub(crate) fn absorb(&mut self, context: &str, err: AppError) -> AppError {
        let err = self.tokens.invalidate_on(err);
        if err.is_unauthorized() {
            self.auth.on_unauthorized();
            self.reset();
        }
        log::error!("{}: {}", context, err);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IssueMappingStrategy;
    use crate::services::token_store::MemoryStore;

    fn config() -> Config {
        Config {
            instance_url: "https://gitlab.com".to_string(),
            client_id: "c".to_string(),
            redirect_uri: "https://site/".to_string(),
            project_name: "p".to_string(),
            issue_mapping_strategy: IssueMappingStrategy::ByUrl,
            dev_mode: false,
            theme: "light".to_string(),
            version: None,
        }
    }

    #[test]
    fn test_client_requires_token() {
        let session = Session::new(config(), TokenStore::new(MemoryStore::new()));
        assert!(session.client().unwrap_err().is_unauthorized());
        assert_eq!(session.auth_state(), AuthState::Unauthenticated);
    }

    #[test]
    fn test_absorb_unauthorized_resets_state() {
        let tokens = TokenStore::new(MemoryStore::new());
        tokens.set("token").unwrap();
        let mut session = Session::new(config(), tokens);
        session.project = Some(ProjectRef { id: 5 });
        assert_eq!(session.auth_state(), AuthState::Authenticated);

        session.absorb("Loading issue", AppError::network("offline"));
        assert_eq!(session.project(), Some(ProjectRef { id: 5 }));

        session.absorb("Loading issue", AppError::unauthorized("expired"));
        assert_eq!(session.project(), None);
        assert!(!session.tokens().has_token());
        assert_eq!(session.auth_state(), AuthState::Unauthenticated);
    }
}
