//! Data models for the widget.
//!
//! These models represent the GitLab entities the widget reads and writes,
//! plus the validated configuration it runs with.
//!
//! API models derive Deserialize for GitLab responses and Serialize so the
//! host can hand them to its rendering layer.

pub mod config;
pub mod discussion;
pub mod issue;
pub mod project;
pub mod reaction;
pub mod user;

// Re-exports for convenient access
pub use config::{Config, IssueMappingStrategy};
pub use discussion::{Discussion, Note, NoteType};
pub use issue::{Issue, NewIssue, OneOrMany};
pub use project::{GitLabProject, ProjectRef};
pub use reaction::{AwardEmoji, ReactionCount, ReactionName};
pub use user::{CurrentUser, GitLabUser};
