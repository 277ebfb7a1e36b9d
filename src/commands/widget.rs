//! Widget entry point.

use crate::error::AppError;
use crate::services::config_resolver::{resolve_config, AttributeSource};
use crate::services::oauth::CallbackOutcome;
use crate::services::page::Page;
use crate::services::token_store::{KeyValueStore, TokenStore};
use crate::session::Session;

use super::auth::complete_login;
use super::issue::{load_issue, IssueView};

/// A mounted widget: its session and the first view to render.
#[derive(Debug)]
pub struct Mounted {
    pub session: Session,
    pub view: IssueView,
}

/// Mount the widget on a freshly loaded page.
///
/// This command:
/// 1. Resolves the configuration from the host attributes
/// 2. Completes an OAuth callback when the page carries a `code`
/// 3. Loads the page's issue if a token is available
///
/// # Errors
/// Only configuration errors abort mounting; every later failure is
/// reported through the returned [`IssueView`].
pub async fn mount(
    attributes: &impl AttributeSource,
    store: impl KeyValueStore + 'static,
    page: &mut dyn Page,
) -> Result<Mounted, AppError> {
    let config = resolve_config(attributes)?;
    log::info!(
        "Mounting BeBlob{} for project {} on {}",
        config
            .version
            .as_deref()
            .map(|v| format!(" {}", v))
            .unwrap_or_default(),
        config.project_name,
        config.instance_url
    );

    let mut session = Session::new(config, TokenStore::new(store));

    if let Some(params) = session.auth.detect(page) {
        if complete_login(&mut session, page, &params).await == CallbackOutcome::Restored {
            return Ok(Mounted {
                session,
                view: IssueView::Redirecting,
            });
        }
    }

    let view = if session.tokens.has_token() {
        load_issue(&mut session, page).await
    } else {
        IssueView::LoginRequired
    };

    Ok(Mounted { session, view })
}
