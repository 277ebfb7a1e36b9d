//! Comment commands for reading and posting issue notes.

use crate::models::{Discussion, ProjectRef};
use crate::session::Session;

use super::issue::fetch_discussions;

/// Reload the discussions of the resolved issue.
///
/// Returns `None` when no issue is resolved or the fetch failed.
pub async fn load_discussions(session: &mut Session) -> Option<Vec<Discussion>> {
    let (project, issue_iid) = resolved_issue(session)?;
    let client = match session.client() {
        Ok(client) => client,
        Err(e) => {
            session.absorb("Error fetching discussions for issue", e);
            return None;
        }
    };

    match fetch_discussions(&client, project, issue_iid).await {
        Ok(discussions) => Some(discussions),
        Err(e) => {
            session.absorb("Error fetching discussions for issue", e);
            None
        }
    }
}

/// Post a top-level comment on the resolved issue.
///
/// This command:
/// 1. Creates the note on GitLab
/// 2. Re-fetches the issue so its note count is current
/// 3. Returns the refreshed discussion list for rendering
///
/// Failures are logged and yield `None`; the widget keeps its current view.
pub async fn add_comment(session: &mut Session, body: &str) -> Option<Vec<Discussion>> {
    let body = body.trim();
    if body.is_empty() {
        log::warn!("Ignoring empty comment");
        return None;
    }

    let (project, issue_iid) = resolved_issue(session)?;
    let client = match session.client() {
        Ok(client) => client,
        Err(e) => {
            session.absorb("Error posting comment", e);
            return None;
        }
    };

    match client.add_note(project.id, issue_iid, body).await {
        Ok(note) => log::info!("Posted note {} on issue #{}", note.id, issue_iid),
        Err(e) => {
            session.absorb("Error posting comment", e);
            return None;
        }
    }

    match client.get_issue(project.id, issue_iid).await {
        Ok(issue) => session.issue = Some(issue),
        Err(e) => {
            session.absorb("Error refreshing issue", e);
        }
    }

    load_discussions(session).await
}

fn resolved_issue(session: &Session) -> Option<(ProjectRef, i64)> {
    match (session.project, session.issue.as_ref()) {
        (Some(project), Some(issue)) => Some((project, issue.iid)),
        _ => {
            log::warn!("No issue resolved for this page yet");
            None
        }
    }
}
