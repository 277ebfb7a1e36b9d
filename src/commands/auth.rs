//! Login and logout commands.

use crate::services::oauth::{CallbackOutcome, CallbackParams};
use crate::services::page::Page;
use crate::session::Session;

/// Send the visitor to GitLab to log in.
///
/// The page navigates away; nothing after this call is observed.
pub fn login(session: &mut Session, page: &mut dyn Page) {
    session.auth.start_login(&session.config, page);
}

/// Finish a login after GitLab redirected back with a code.
///
/// This command:
/// 1. Exchanges the code for an access token
/// 2. Stores the token and drops state learned under the previous one
/// 3. Navigates back to the page the login started from, when known
///
/// A failed exchange is logged and reported as `Rejected`.
pub async fn complete_login(
    session: &mut Session,
    page: &mut dyn Page,
    params: &CallbackParams,
) -> CallbackOutcome {
    let outcome = session
        .auth
        .handle_callback(&session.config, &session.tokens, page, params)
        .await;

    if outcome != CallbackOutcome::Rejected {
        session.reset();
    }
    outcome
}

/// Log out and reload the page.
pub fn logout(session: &mut Session, page: &mut dyn Page) {
    log::info!("Logging out");
    session.auth.logout(&session.tokens, page);
    session.reset();
}
