//! Project models.

use serde::{Deserialize, Serialize};

/// GitLab project from API (`GET /projects?search=`).
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabProject {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub path_with_namespace: String,
    pub web_url: Option<String>,
}

/// Numeric project reference cached for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProjectRef {
    pub id: i64,
}

impl GitLabProject {
    /// Whether this project is the one configured as `project_name`.
    ///
    /// Search is fuzzy on the server; the configured name must match the
    /// project name or its full namespaced path exactly.
    pub fn matches_name(&self, project_name: &str) -> bool {
        self.name == project_name || self.path_with_namespace == project_name
    }
}

impl From<&GitLabProject> for ProjectRef {
    fn from(project: &GitLabProject) -> Self {
        Self { id: project.id }
    }
}
