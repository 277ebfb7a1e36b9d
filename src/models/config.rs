//! Widget configuration model.

use serde::Serialize;

/// Rule used to associate the hosting page with a GitLab issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", content = "issueId", rename_all = "camelCase")]
pub enum IssueMappingStrategy {
    /// Search issues whose title matches the full page URL.
    #[serde(rename = "url")]
    ByUrl,

    /// Search issues matching the last `/` segment of the page title.
    #[serde(rename = "pageTitle")]
    ByPageTitle,

    /// Use an explicitly configured issue IID.
    ///
    /// The id is validated when the issue is resolved, not when the
    /// configuration is parsed.
    #[serde(rename = "issueId")]
    ByIssueId(Option<String>),
}

impl IssueMappingStrategy {
    /// Attribute value naming this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ByUrl => "url",
            Self::ByPageTitle => "pageTitle",
            Self::ByIssueId(_) => "issueId",
        }
    }

    /// Whether a failed search may fall back to creating a new issue.
    pub fn creates_on_miss(&self) -> bool {
        matches!(self, Self::ByUrl | Self::ByPageTitle)
    }
}

/// Validated widget configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Normalized GitLab origin (e.g., `https://gitlab.com`).
    pub instance_url: String,

    /// OAuth application client ID.
    pub client_id: String,

    /// OAuth redirect URI registered for the application.
    pub redirect_uri: String,

    /// Name (or full path) of the project holding comment issues.
    pub project_name: String,

    /// Page-to-issue mapping rule.
    pub issue_mapping_strategy: IssueMappingStrategy,

    /// Allows `http://` instance URLs.
    pub dev_mode: bool,

    /// Theme name passed through to the renderer.
    pub theme: String,

    /// Widget version announced by the host, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}
