//! GitLab user models.

use serde::{Deserialize, Serialize};

/// Note or reaction author as embedded in GitLab responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitLabUser {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    pub avatar_url: Option<String>,
    pub web_url: Option<String>,
}

/// The authenticated visitor (`GET /user`).
///
/// Fetched once per authenticated session and used to decide which
/// reactions belong to the visitor.
pub type CurrentUser = GitLabUser;
