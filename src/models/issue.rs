//! Issue model.

use serde::{Deserialize, Serialize};

/// GitLab issue holding the comments of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Project-scoped issue number.
    pub iid: i64,

    pub title: String,

    pub description: Option<String>,

    #[serde(default)]
    pub user_notes_count: i64,

    pub web_url: Option<String>,
}

/// Body of `POST /projects/:id/issues`.
#[derive(Debug, Clone, Serialize)]
pub struct NewIssue<'a> {
    pub title: &'a str,
    pub description: &'a str,
}

/// Search endpoints answer with a list, direct fetches with a single object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    /// First element of either shape.
    pub fn into_first(self) -> Option<T> {
        match self {
            Self::Many(items) => items.into_iter().next(),
            Self::One(item) => Some(item),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_or_many_accepts_both_shapes() {
        let many: OneOrMany<Issue> = serde_json::from_str(
            r#"[{"iid": 3, "title": "a", "description": null},
                {"iid": 4, "title": "b", "description": null}]"#,
        )
        .unwrap();
        assert_eq!(many.into_first().map(|i| i.iid), Some(3));

        let one: OneOrMany<Issue> =
            serde_json::from_str(r#"{"iid": 9, "title": "c", "user_notes_count": 2}"#).unwrap();
        let issue = one.into_first().unwrap();
        assert_eq!(issue.iid, 9);
        assert_eq!(issue.user_notes_count, 2);
    }

    #[test]
    fn test_empty_search_has_no_first() {
        let none: OneOrMany<Issue> = serde_json::from_str("[]").unwrap();
        assert!(none.into_first().is_none());
    }
}
