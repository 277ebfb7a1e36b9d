//! GitLab API client.
//!
//! Provides HTTP client for the subset of GitLab API v4 the widget needs,
//! with Bearer authentication and pagination.

use crate::error::AppError;
use crate::models::{
    AwardEmoji, CurrentUser, Discussion, GitLabProject, Issue, NewIssue, Note, OneOrMany,
    ReactionName,
};
use crate::services::urls::build_api_url;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// GitLab API client configuration.
#[derive(Debug, Clone)]
pub struct GitLabClientConfig {
    /// Normalized base URL of the GitLab instance (e.g., `https://gitlab.com`).
    pub base_url: String,

    /// OAuth access token for authentication.
    pub token: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GitLabClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// GitLab API client.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    client: Client,
    config: GitLabClientConfig,
}

/// Pagination information from GitLab API response headers.
#[derive(Debug, Clone, Default)]
pub struct PaginationInfo {
    /// Current page number.
    pub page: u32,

    /// Next page number (if any).
    pub next_page: Option<u32>,
}

impl GitLabClient {
    /// Create a new GitLab client.
    pub fn new(config: GitLabClientConfig) -> Result<Self, AppError> {
        let mut headers = header::HeaderMap::new();

        let mut auth_value = header::HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| AppError::unauthorized("Invalid token format"))?;
        auth_value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_value);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get the full URL for an API path.
    fn api_url(&self, path: &str) -> String {
        build_api_url(&self.config.base_url, path)
    }

    /// Parse pagination headers from response.
    fn parse_pagination(response: &Response) -> PaginationInfo {
        let headers = response.headers();

        let get_header = |name: &str| -> Option<u32> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
        };

        PaginationInfo {
            page: get_header("x-page").unwrap_or(1),
            next_page: get_header("x-next-page"),
        }
    }

    /// Map a non-success response to an error.
    async fn error_for_response(response: Response, endpoint: &str) -> AppError {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            // 401 Unauthorized - token is expired or revoked
            return AppError::unauthorized(
                "GitLab token expired or revoked. Please log in again.",
            );
        }

        let status_code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        let body_message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                // GitLab returns errors as {"message": "..."} or {"error": "..."}
                v.get("message").or_else(|| v.get("error")).map(|m| match m.as_str() {
                    Some(s) => s.to_string(),
                    // Sometimes "message" is an object like {"name":["has already been taken"]}
                    None => m.to_string(),
                })
            });

        // Award emoji uniqueness violations come back as 404 or 400 depending
        // on the GitLab version.
        let already_taken = endpoint.contains("/award_emoji")
            && body_message
                .as_deref()
                .is_some_and(|m| m.contains("already been taken"));

        match status {
            StatusCode::CONFLICT => {
                AppError::conflict(body_message.unwrap_or_else(|| "Already exists".to_string()))
            }
            _ if already_taken => AppError::conflict(body_message.unwrap_or_default()),
            StatusCode::NOT_FOUND => AppError::not_found(endpoint),
            StatusCode::FORBIDDEN => {
                AppError::gitlab_api_full("Access denied", status_code, endpoint)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                AppError::gitlab_api_full("Rate limit exceeded", status_code, endpoint)
            }
            _ => AppError::gitlab_api_full(
                body_message
                    .unwrap_or_else(|| format!("Request failed ({}): {}", status_code, body)),
                status_code,
                endpoint,
            ),
        }
    }

    /// Handle API response errors.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        endpoint: &str,
    ) -> Result<T, AppError> {
        if response.status().is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| AppError::internal(format!("Failed to parse response: {}", e)))
        } else {
            Err(Self::error_for_response(response, endpoint).await)
        }
    }

    /// Handle responses whose body is irrelevant (e.g. `204 No Content`).
    async fn handle_empty_response(
        &self,
        response: Response,
        endpoint: &str,
    ) -> Result<(), AppError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_for_response(response, endpoint).await)
        }
    }

    /// Fetch all pages of a paginated endpoint.
    pub async fn get_all_pages<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Option<&impl Serialize>,
    ) -> Result<Vec<T>, AppError> {
        let mut all_data = Vec::new();
        let mut page = 1u32;

        loop {
            let url = self.api_url(endpoint);
            let mut request = self.client.get(&url);

            // Add original query params
            if let Some(q) = query {
                request = request.query(q);
            }

            // Add pagination params
            request = request.query(&[("page", page.to_string()), ("per_page", "100".to_string())]);

            let response = request.send().await?;
            let pagination = Self::parse_pagination(&response);
            let data = self.handle_response::<Vec<T>>(response, endpoint).await?;

            all_data.extend(data);

            match pagination.next_page {
                Some(next) if next > pagination.page => page = next,
                _ => break,
            }
        }

        Ok(all_data)
    }

    /// Fetch the authenticated user.
    pub async fn get_current_user(&self) -> Result<CurrentUser, AppError> {
        let endpoint = "/user";
        let url = self.api_url(endpoint);
        let response = self.client.get(&url).send().await?;
        self.handle_response(response, endpoint).await
    }

    /// Search for projects by name.
    pub async fn search_projects(&self, query: &str) -> Result<Vec<GitLabProject>, AppError> {
        let endpoint = "/projects";
        let url = self.api_url(endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[("search", query)])
            .send()
            .await?;
        self.handle_response(response, endpoint).await
    }

    /// Search a project's issues, returning the first match.
    pub async fn search_issues(
        &self,
        project_id: i64,
        query: &str,
    ) -> Result<Option<Issue>, AppError> {
        let endpoint = format!("/projects/{}/issues", project_id);
        let url = self.api_url(&endpoint);
        let response = self
            .client
            .get(&url)
            .query(&[("search", query)])
            .send()
            .await?;
        let found: OneOrMany<Issue> = self.handle_response(response, &endpoint).await?;
        Ok(found.into_first())
    }

    /// Get a single issue by project and IID.
    pub async fn get_issue(&self, project_id: i64, issue_iid: i64) -> Result<Issue, AppError> {
        let endpoint = format!("/projects/{}/issues/{}", project_id, issue_iid);
        let url = self.api_url(&endpoint);
        let response = self.client.get(&url).send().await?;
        let found: OneOrMany<Issue> = self.handle_response(response, &endpoint).await?;
        found
            .into_first()
            .ok_or_else(|| AppError::not_found_with_id("issue", issue_iid.to_string()))
    }

    /// Create an issue.
    pub async fn create_issue(
        &self,
        project_id: i64,
        issue: &NewIssue<'_>,
    ) -> Result<Issue, AppError> {
        let endpoint = format!("/projects/{}/issues", project_id);
        let url = self.api_url(&endpoint);
        let response = self.client.post(&url).json(issue).send().await?;
        self.handle_response(response, &endpoint).await
    }

    /// List discussions on an issue.
    pub async fn list_discussions(
        &self,
        project_id: i64,
        issue_iid: i64,
    ) -> Result<Vec<Discussion>, AppError> {
        let endpoint = format!("/projects/{}/issues/{}/discussions", project_id, issue_iid);
        self.get_all_pages(&endpoint, None::<&()>).await
    }

    /// Add a top-level comment to an issue.
    pub async fn add_note(
        &self,
        project_id: i64,
        issue_iid: i64,
        body: &str,
    ) -> Result<Note, AppError> {
        let endpoint = format!("/projects/{}/issues/{}/notes", project_id, issue_iid);
        let url = self.api_url(&endpoint);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?;

        self.handle_response(response, &endpoint).await
    }

    /// List award emoji on an issue.
    pub async fn list_award_emoji(
        &self,
        project_id: i64,
        issue_iid: i64,
    ) -> Result<Vec<AwardEmoji>, AppError> {
        let endpoint = format!("/projects/{}/issues/{}/award_emoji", project_id, issue_iid);
        self.get_all_pages(&endpoint, None::<&()>).await
    }

    /// Award an emoji on an issue as the authenticated user.
    ///
    /// Fails with `Conflict` when the user already awarded `name`.
    pub async fn add_award_emoji(
        &self,
        project_id: i64,
        issue_iid: i64,
        name: ReactionName,
    ) -> Result<AwardEmoji, AppError> {
        let endpoint = format!("/projects/{}/issues/{}/award_emoji", project_id, issue_iid);
        let url = self.api_url(&endpoint);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "name": name.as_str() }))
            .send()
            .await?;

        self.handle_response(response, &endpoint).await
    }

    /// Remove an award emoji by ID.
    pub async fn delete_award_emoji(
        &self,
        project_id: i64,
        issue_iid: i64,
        award_id: i64,
    ) -> Result<(), AppError> {
        let endpoint = format!(
            "/projects/{}/issues/{}/award_emoji/{}",
            project_id, issue_iid, award_id
        );
        let url = self.api_url(&endpoint);
        let response = self.client.delete(&url).send().await?;
        self.handle_empty_response(response, &endpoint).await
    }
}
