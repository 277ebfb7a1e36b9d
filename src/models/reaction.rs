//! Award emoji (reaction) models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::user::GitLabUser;
use crate::error::AppError;

/// Reactions the widget offers, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionName {
    Thumbsup,
    Thumbsdown,
    Heart,
    Tada,
    Confused,
}

impl ReactionName {
    pub const ALL: [ReactionName; 5] = [
        Self::Thumbsup,
        Self::Thumbsdown,
        Self::Heart,
        Self::Tada,
        Self::Confused,
    ];

    /// GitLab award emoji name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thumbsup => "thumbsup",
            Self::Thumbsdown => "thumbsdown",
            Self::Heart => "heart",
            Self::Tada => "tada",
            Self::Confused => "confused",
        }
    }

    /// Thumbs are shown even when nobody reacted yet.
    pub fn always_visible(self) -> bool {
        matches!(self, Self::Thumbsup | Self::Thumbsdown)
    }
}

impl fmt::Display for ReactionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| AppError::not_found_with_id("reaction", s))
    }
}

/// GitLab award emoji from API.
///
/// `name` stays a plain string: other clients may award emoji outside the
/// widget vocabulary and those must still deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardEmoji {
    pub id: i64,
    pub name: String,
    pub user: GitLabUser,
}

impl AwardEmoji {
    /// Whether this award is `name` given by `user_id`.
    pub fn is(&self, name: ReactionName, user_id: i64) -> bool {
        self.name == name.as_str() && self.user.id == user_id
    }
}

/// Render-ready tally of one vocabulary reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionCount {
    pub name: ReactionName,
    pub count: usize,
    pub reacted_by_me: bool,
    pub visible: bool,
}

/// Tally `reactions` over the widget vocabulary, in display order.
pub fn summarize(reactions: &[AwardEmoji], current_user_id: Option<i64>) -> Vec<ReactionCount> {
    ReactionName::ALL
        .into_iter()
        .map(|name| {
            let matching = reactions.iter().filter(|r| r.name == name.as_str());
            let count = matching.clone().count();
            let reacted_by_me = current_user_id
                .map(|id| matching.into_iter().any(|r| r.user.id == id))
                .unwrap_or(false);

            ReactionCount {
                name,
                count,
                reacted_by_me,
                visible: name.always_visible() || count > 0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn award(id: i64, name: &str, user_id: i64) -> AwardEmoji {
        AwardEmoji {
            id,
            name: name.to_string(),
            user: GitLabUser {
                id: user_id,
                username: format!("user{}", user_id),
                name: format!("User {}", user_id),
                avatar_url: None,
                web_url: None,
            },
        }
    }

    #[test]
    fn test_parse_vocabulary() {
        assert_eq!("tada".parse::<ReactionName>().unwrap(), ReactionName::Tada);
        assert!("rocket".parse::<ReactionName>().is_err());
    }

    #[test]
    fn test_thumbs_visible_at_zero() {
        let summary = summarize(&[], Some(1));

        let visible: Vec<_> = summary.iter().filter(|c| c.visible).map(|c| c.name).collect();
        assert_eq!(visible, vec![ReactionName::Thumbsup, ReactionName::Thumbsdown]);
        assert!(summary.iter().all(|c| c.count == 0 && !c.reacted_by_me));
    }

    #[test]
    fn test_counts_and_ownership() {
        let reactions = vec![
            award(1, "heart", 1),
            award(2, "heart", 2),
            award(3, "thumbsup", 2),
            award(4, "rocket", 1),
        ];
        let summary = summarize(&reactions, Some(1));

        let heart = summary.iter().find(|c| c.name == ReactionName::Heart).unwrap();
        assert_eq!(heart.count, 2);
        assert!(heart.visible);
        assert!(heart.reacted_by_me);

        let thumbsup = summary.iter().find(|c| c.name == ReactionName::Thumbsup).unwrap();
        assert_eq!(thumbsup.count, 1);
        assert!(!thumbsup.reacted_by_me);

        let tada = summary.iter().find(|c| c.name == ReactionName::Tada).unwrap();
        assert!(!tada.visible);
    }

    #[test]
    fn test_anonymous_never_owns_reactions() {
        let summary = summarize(&[award(1, "thumbsup", 1)], None);
        assert!(!summary[0].reacted_by_me);
        assert_eq!(summary[0].count, 1);
    }
}
