//! Reaction commands.

use crate::models::reaction::summarize;
use crate::models::{ReactionCount, ReactionName};
use crate::services::reactions::ReactionEngine;
use crate::session::Session;

use super::issue::fetch_reactions;

/// Reload the reaction tally of the resolved issue.
pub async fn load_reactions(session: &mut Session) -> Option<Vec<ReactionCount>> {
    let (project, issue_iid) = match (session.project, session.issue.as_ref()) {
        (Some(project), Some(issue)) => (project, issue.iid),
        _ => return None,
    };
    let client = match session.client() {
        Ok(client) => client,
        Err(e) => {
            session.absorb("Error fetching reactions", e);
            return None;
        }
    };

    match fetch_reactions(session, &client, project, issue_iid).await {
        Ok(reactions) => Some(reactions),
        Err(e) => {
            session.absorb("Error fetching reactions", e);
            None
        }
    }
}

/// Toggle the visitor's `name` reaction on the resolved issue.
///
/// Returns the refreshed tally, or `None` if the toggle failed (logged).
pub async fn toggle_reaction(
    session: &mut Session,
    name: ReactionName,
) -> Option<Vec<ReactionCount>> {
    let (project, issue_iid) = match (session.project, session.issue.as_ref()) {
        (Some(project), Some(issue)) => (project, issue.iid),
        _ => {
            log::warn!("Cannot react before the issue is resolved");
            return None;
        }
    };
    let client = match session.client() {
        Ok(client) => client,
        Err(e) => {
            session.absorb("Error toggling reaction", e);
            return None;
        }
    };

    let toggled = ReactionEngine::new(&client, project, issue_iid)
        .toggle(name, &mut session.current_user)
        .await;

    match toggled {
        Ok(awards) => {
            let me = session.current_user.as_ref().map(|u| u.id);
            Some(summarize(&awards, me))
        }
        Err(e) => {
            session.absorb("Error toggling reaction", e);
            None
        }
    }
}
