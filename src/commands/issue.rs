//! Issue loading command.
//!
//! Resolving the page's issue is a strict sequence: project, issue,
//! discussions, reactions. Each later step needs the result of the previous
//! one.

use serde::Serialize;

use crate::error::AppError;
use crate::models::discussion::visible_discussions;
use crate::models::reaction::summarize;
use crate::models::{Discussion, Issue, ProjectRef, ReactionCount};
use crate::services::gitlab_client::GitLabClient;
use crate::services::issue_resolver::IssueResolver;
use crate::services::page::Page;
use crate::services::reactions::{ensure_current_user, ReactionEngine};
use crate::session::Session;

/// What the host should render in place of the widget.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum IssueView {
    /// No usable token; show the login button.
    LoginRequired,

    /// The page is navigating away (OAuth state restore).
    Redirecting,

    /// The issue thread is ready to render.
    Loaded {
        issue: Issue,
        discussions: Vec<Discussion>,
        reactions: Vec<ReactionCount>,
    },

    /// Resolution failed; show `message` instead of the thread.
    Failed { message: String },
}

/// Resolve and load the issue backing `page`.
///
/// Discussion and reaction failures degrade to empty lists; only failing to
/// resolve the issue itself yields [`IssueView::Failed`]. A rejected token
/// clears it and yields [`IssueView::LoginRequired`].
pub async fn load_issue(session: &mut Session, page: &dyn Page) -> IssueView {
    let client = match session.client() {
        Ok(client) => client,
        Err(e) if e.is_unauthorized() => return IssueView::LoginRequired,
        Err(e) => return failed(session, e),
    };

    let project = match ensure_project(session, &client).await {
        Ok(project) => project,
        Err(e) => return failed(session, e),
    };

    let resolved = IssueResolver::new(&client, &session.tokens)
        .resolve(project, &session.config.issue_mapping_strategy, page)
        .await;
    let issue = match resolved {
        Ok(issue) => issue,
        Err(e) => return failed(session, e),
    };
    log::info!("Page resolved to issue #{}", issue.iid);
    session.issue = Some(issue.clone());

    let discussions = match fetch_discussions(&client, project, issue.iid).await {
        Ok(discussions) => discussions,
        Err(e) => {
            let e = session.absorb("Error fetching discussions for issue", e);
            if e.is_unauthorized() {
                return IssueView::LoginRequired;
            }
            Vec::new()
        }
    };

    let reactions = match fetch_reactions(session, &client, project, issue.iid).await {
        Ok(reactions) => reactions,
        Err(e) => {
            let e = session.absorb("Error fetching reactions", e);
            if e.is_unauthorized() {
                return IssueView::LoginRequired;
            }
            summarize(&[], None)
        }
    };

    IssueView::Loaded {
        issue,
        discussions,
        reactions,
    }
}

/// Cached project, resolved on first use.
pub(crate) async fn ensure_project(
    session: &mut Session,
    client: &GitLabClient,
) -> Result<ProjectRef, AppError> {
    if let Some(project) = session.project {
        return Ok(project);
    }

    let project = IssueResolver::new(client, &session.tokens)
        .resolve_project(&session.config.project_name)
        .await?;
    log::debug!("Project {} has id {}", session.config.project_name, project.id);
    session.project = Some(project);
    Ok(project)
}

pub(crate) async fn fetch_discussions(
    client: &GitLabClient,
    project: ProjectRef,
    issue_iid: i64,
) -> Result<Vec<Discussion>, AppError> {
    let discussions = client.list_discussions(project.id, issue_iid).await?;
    Ok(visible_discussions(discussions))
}

pub(crate) async fn fetch_reactions(
    session: &mut Session,
    client: &GitLabClient,
    project: ProjectRef,
    issue_iid: i64,
) -> Result<Vec<ReactionCount>, AppError> {
    let me = ensure_current_user(client, &mut session.current_user).await?;
    let awards = ReactionEngine::new(client, project, issue_iid).fetch().await?;
    Ok(summarize(&awards, Some(me.id)))
}

fn failed(session: &mut Session, err: AppError) -> IssueView {
    let err = session.absorb("Error loading issue", err);
    if err.is_unauthorized() {
        IssueView::LoginRequired
    } else {
        IssueView::Failed {
            message: format!("Failed to fetch issue: {}", err),
        }
    }
}
