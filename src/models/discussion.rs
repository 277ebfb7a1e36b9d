//! Discussion thread models for issue comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::GitLabUser;

/// GitLab note type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteType {
    DiscussionNote,
    DiffNote,
    Note,
    /// Any tag this version does not know about.
    #[serde(other)]
    Unknown,
}

/// A single comment inside a discussion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,

    /// Comment content (Markdown, rendered by the host).
    pub body: String,

    pub author: GitLabUser,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub system: bool,

    /// `None` for plain notes that never grew into a thread.
    #[serde(rename = "type")]
    pub note_type: Option<NoteType>,
}

/// GitLab discussion from API (`GET …/issues/:iid/discussions`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discussion {
    pub id: String,

    #[serde(default)]
    pub individual_note: bool,

    pub notes: Vec<Note>,
}

impl Discussion {
    /// The note that started the thread.
    pub fn root(&self) -> Option<&Note> {
        self.notes.first()
    }

    /// Notes rendered indented under the root.
    pub fn replies(&self) -> &[Note] {
        self.notes.get(1..).unwrap_or(&[])
    }

    /// Whether this discussion has replies (a threaded discussion note).
    pub fn is_thread(&self) -> bool {
        !self.individual_note && self.notes.len() > 1
    }
}

/// Comments are rendered without GitLab system notes ("changed the description", ...).
pub fn visible_discussions(discussions: Vec<Discussion>) -> Vec<Discussion> {
    discussions
        .into_iter()
        .filter_map(|mut discussion| {
            discussion.notes.retain(|note| !note.system);
            (!discussion.notes.is_empty()).then_some(discussion)
        })
        .collect()
}
