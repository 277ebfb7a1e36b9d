//! Page to issue resolution.
//!
//! Each page's comments live in one GitLab issue of the configured project.
//! The issue is found by the configured [`IssueMappingStrategy`]; content
//! based strategies create the issue when no match exists yet.

use crate::error::AppError;
use crate::models::{Issue, IssueMappingStrategy, NewIssue, ProjectRef};
use crate::services::gitlab_client::GitLabClient;
use crate::services::page::Page;
use crate::services::token_store::TokenStore;
use crate::services::urls::{query_param, strip_query_params, CALLBACK_PARAMS};

/// Description of issues created for pages that had none.
pub const PLACEHOLDER_DESCRIPTION: &str =
    "This issue was created automatically by BeBlob to hold the comments of a page.";

/// Search term used by the `pageTitle` strategy: the text after the last `/`.
///
/// A title without `/` is used whole; a title ending in `/` yields an empty
/// term.
pub fn page_title_query(title: &str) -> &str {
    title.rsplit('/').next().unwrap_or(title)
}

/// Search term used by the `url` strategy: the page location without the
/// OAuth callback parameters.
///
/// Locations without `code`/`state` are used verbatim.
pub fn page_url_query(location: &str) -> String {
    let has_callback = CALLBACK_PARAMS
        .iter()
        .any(|key| query_param(location, key).is_some());
    if !has_callback {
        return location.to_string();
    }

    strip_query_params(location, &CALLBACK_PARAMS).unwrap_or_else(|e| {
        log::warn!("Searching with the raw page URL: {}", e);
        location.to_string()
    })
}

/// Resolves the configured project and the issue backing the current page.
pub struct IssueResolver<'a> {
    client: &'a GitLabClient,
    tokens: &'a TokenStore,
}

impl<'a> IssueResolver<'a> {
    pub fn new(client: &'a GitLabClient, tokens: &'a TokenStore) -> Self {
        Self { client, tokens }
    }

    /// Find the project named `project_name`.
    ///
    /// # Errors
    /// - `Unauthorized` (token cleared) if GitLab rejects the token
    /// - `NotFound` if no search result matches the name exactly
    pub async fn resolve_project(&self, project_name: &str) -> Result<ProjectRef, AppError> {
        let projects = self
            .client
            .search_projects(project_name)
            .await
            .map_err(|e| self.tokens.invalidate_on(e))?;

        projects
            .iter()
            .find(|p| p.matches_name(project_name))
            .map(ProjectRef::from)
            .ok_or_else(|| AppError::not_found_with_id("project", project_name))
    }

    /// Resolve the issue for `page` under `strategy`.
    ///
    /// # Errors
    /// - `MissingConfig` if the `issueId` strategy has no id configured
    /// - `InvalidConfig` if the configured id is not a number
    /// - `Unauthorized` (token cleared) if GitLab rejects the token
    /// - `NotFound` if an explicit issue id does not exist
    pub async fn resolve(
        &self,
        project: ProjectRef,
        strategy: &IssueMappingStrategy,
        page: &dyn Page,
    ) -> Result<Issue, AppError> {
        self.resolve_inner(project, strategy, page)
            .await
            .map_err(|e| self.tokens.invalidate_on(e))
    }

    async fn resolve_inner(
        &self,
        project: ProjectRef,
        strategy: &IssueMappingStrategy,
        page: &dyn Page,
    ) -> Result<Issue, AppError> {
        let query = match strategy {
            IssueMappingStrategy::ByIssueId(id) => {
                let iid = parse_issue_id(id.as_deref())?;
                return self.client.get_issue(project.id, iid).await;
            }
            IssueMappingStrategy::ByUrl => page_url_query(&page.location()),
            IssueMappingStrategy::ByPageTitle => page_title_query(&page.title()).to_string(),
        };

        log::debug!(
            "Searching issues of project {} ({}): {:?}",
            project.id,
            strategy.as_str(),
            query
        );
        if let Some(issue) = self.client.search_issues(project.id, &query).await? {
            return Ok(issue);
        }

        let title = page.title();
        log::info!("No issue matches this page yet; creating \"{}\"", title);
        self.client
            .create_issue(
                project.id,
                &NewIssue {
                    title: &title,
                    description: PLACEHOLDER_DESCRIPTION,
                },
            )
            .await
    }
}

fn parse_issue_id(id: Option<&str>) -> Result<i64, AppError> {
    let raw = id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::missing_config("issueId"))?;

    raw.parse::<i64>()
        .ok()
        .filter(|iid| *iid > 0)
        .ok_or_else(|| {
            AppError::invalid_config_field(
                format!("Invalid issueId: \"{}\" - must be a positive number", raw),
                "issueId",
            )
        })
}
