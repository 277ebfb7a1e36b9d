//! Award emoji toggling.
//!
//! GitLab enforces at most one award per (user, name). The engine reads the
//! current awards, removes the visitor's own award if present and adds it
//! otherwise. When the add loses a race against another tab (the server
//! answers "already taken") the award the other request created is removed
//! instead, so a toggle always converges without surfacing an error.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{AwardEmoji, CurrentUser, ProjectRef, ReactionName};
use crate::services::gitlab_client::GitLabClient;

/// Remote operations the reaction engine relies on.
#[async_trait]
pub trait ReactionApi: Send + Sync {
    async fn current_user(&self) -> Result<CurrentUser, AppError>;

    async fn list_awards(&self, project_id: i64, issue_iid: i64)
        -> Result<Vec<AwardEmoji>, AppError>;

    async fn add_award(
        &self,
        project_id: i64,
        issue_iid: i64,
        name: ReactionName,
    ) -> Result<AwardEmoji, AppError>;

    async fn remove_award(&self, project_id: i64, issue_iid: i64, award_id: i64)
        -> Result<(), AppError>;
}

#[async_trait]
impl ReactionApi for GitLabClient {
    async fn current_user(&self) -> Result<CurrentUser, AppError> {
        self.get_current_user().await
    }

    async fn list_awards(
        &self,
        project_id: i64,
        issue_iid: i64,
    ) -> Result<Vec<AwardEmoji>, AppError> {
        self.list_award_emoji(project_id, issue_iid).await
    }

    async fn add_award(
        &self,
        project_id: i64,
        issue_iid: i64,
        name: ReactionName,
    ) -> Result<AwardEmoji, AppError> {
        self.add_award_emoji(project_id, issue_iid, name).await
    }

    async fn remove_award(
        &self,
        project_id: i64,
        issue_iid: i64,
        award_id: i64,
    ) -> Result<(), AppError> {
        self.delete_award_emoji(project_id, issue_iid, award_id).await
    }
}

/// Fetch the current user unless already cached.
pub async fn ensure_current_user<A: ReactionApi + ?Sized>(
    api: &A,
    cache: &mut Option<CurrentUser>,
) -> Result<CurrentUser, AppError> {
    if let Some(user) = cache {
        return Ok(user.clone());
    }

    let user = api.current_user().await?;
    log::debug!("Authenticated as {} ({})", user.username, user.id);
    *cache = Some(user.clone());
    Ok(user)
}

/// Reaction operations on one issue.
pub struct ReactionEngine<'a, A: ReactionApi + ?Sized> {
    api: &'a A,
    project: ProjectRef,
    issue_iid: i64,
}

impl<'a, A: ReactionApi + ?Sized> ReactionEngine<'a, A> {
    pub fn new(api: &'a A, project: ProjectRef, issue_iid: i64) -> Self {
        Self {
            api,
            project,
            issue_iid,
        }
    }

    /// Current awards on the issue.
    pub async fn fetch(&self) -> Result<Vec<AwardEmoji>, AppError> {
        self.api.list_awards(self.project.id, self.issue_iid).await
    }

    /// Toggle the visitor's `name` award and return the resulting award set.
    pub async fn toggle(
        &self,
        name: ReactionName,
        current_user: &mut Option<CurrentUser>,
    ) -> Result<Vec<AwardEmoji>, AppError> {
        let me = ensure_current_user(self.api, current_user).await?;
        let awards = self.fetch().await?;

        match own_award(&awards, name, me.id) {
            Some(award_id) => {
                log::debug!("Removing {} award {}", name, award_id);
                self.remove(award_id).await?;
            }
            None => match self.api.add_award(self.project.id, self.issue_iid, name).await {
                Ok(award) => log::debug!("Added {} award {}", name, award.id),
                Err(e) if e.is_conflict() => {
                    log::info!("{} was awarded concurrently; removing it instead", name);
                    let awards = self.fetch().await?;
                    if let Some(award_id) = own_award(&awards, name, me.id) {
                        self.remove(award_id).await?;
                    }
                }
                Err(e) => return Err(e),
            },
        }

        self.fetch().await
    }

    /// Delete an award; one that is already gone counts as deleted.
    async fn remove(&self, award_id: i64) -> Result<(), AppError> {
        match self
            .api
            .remove_award(self.project.id, self.issue_iid, award_id)
            .await
        {
            Err(e) if e.is_not_found() => {
                log::debug!("Award {} was already removed", award_id);
                Ok(())
            }
            other => other,
        }
    }
}

fn own_award(awards: &[AwardEmoji], name: ReactionName, user_id: i64) -> Option<i64> {
    awards
        .iter()
        .find(|award| award.is(name, user_id))
        .map(|award| award.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GitLabUser;
    use crate::services::gitlab_client::GitLabClientConfig;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const PROJECT: ProjectRef = ProjectRef { id: 12345 };

    fn user(id: i64) -> GitLabUser {
        GitLabUser {
            id,
            username: format!("user{}", id),
            name: format!("User {}", id),
            avatar_url: None,
            web_url: None,
        }
    }

    fn award(id: i64, name: &str, user_id: i64) -> AwardEmoji {
        AwardEmoji {
            id,
            name: name.to_string(),
            user: user(user_id),
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    enum Call {
        User,
        List,
        Add(ReactionName),
        Remove(i64),
    }

    /// Scripted API: each `list_awards` pops the next snapshot.
    struct ScriptedApi {
        me: i64,
        snapshots: Mutex<VecDeque<Vec<AwardEmoji>>>,
        add_result: Mutex<Option<Result<AwardEmoji, AppError>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl ScriptedApi {
        fn new(me: i64, snapshots: Vec<Vec<AwardEmoji>>) -> Self {
            Self {
                me,
                snapshots: Mutex::new(snapshots.into()),
                add_result: Mutex::new(None),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_add(self, err: AppError) -> Self {
            *self.add_result.lock().unwrap() = Some(Err(err));
            self
        }

        fn calls(&self) -> Vec<Call> {
            std::mem::take(&mut *self.calls.lock().unwrap())
        }
    }

    #[async_trait]
    impl ReactionApi for ScriptedApi {
        async fn current_user(&self) -> Result<CurrentUser, AppError> {
            self.calls.lock().unwrap().push(Call::User);
            Ok(user(self.me))
        }

        async fn list_awards(&self, _: i64, _: i64) -> Result<Vec<AwardEmoji>, AppError> {
            self.calls.lock().unwrap().push(Call::List);
            let mut snapshots = self.snapshots.lock().unwrap();
            Ok(if snapshots.len() > 1 {
                snapshots.pop_front().unwrap()
            } else {
                snapshots.front().cloned().unwrap_or_default()
            })
        }

        async fn add_award(
            &self,
            _: i64,
            _: i64,
            name: ReactionName,
        ) -> Result<AwardEmoji, AppError> {
            self.calls.lock().unwrap().push(Call::Add(name));
            self.add_result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(award(500, name.as_str(), self.me)))
        }

        async fn remove_award(&self, _: i64, _: i64, award_id: i64) -> Result<(), AppError> {
            self.calls.lock().unwrap().push(Call::Remove(award_id));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_existing_own_award_is_removed() {
        let api = ScriptedApi::new(1, vec![vec![award(10, "thumbsup", 1)], vec![]]);
        let mut me = None;

        let result = ReactionEngine::new(&api, PROJECT, 42)
            .toggle(ReactionName::Thumbsup, &mut me)
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(
            api.calls(),
            vec![Call::User, Call::List, Call::Remove(10), Call::List]
        );
        assert_eq!(me.map(|u| u.id), Some(1));
    }

    #[tokio::test]
    async fn test_someone_elses_award_does_not_count() {
        let api = ScriptedApi::new(
            1,
            vec![
                vec![award(10, "thumbsup", 2)],
                vec![award(10, "thumbsup", 2), award(500, "thumbsup", 1)],
            ],
        );
        let mut me = Some(user(1));

        let result = ReactionEngine::new(&api, PROJECT, 42)
            .toggle(ReactionName::Thumbsup, &mut me)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(
            api.calls(),
            vec![Call::List, Call::Add(ReactionName::Thumbsup), Call::List]
        );
    }

    #[tokio::test]
    async fn test_conflict_converges_to_removed() {
        // Another tab awarded heart between our read and our add.
        let api = ScriptedApi::new(
            1,
            vec![vec![], vec![award(77, "heart", 1)], vec![]],
        )
        .failing_add(AppError::conflict("Award Emoji Name has already been taken"));
        let mut me = Some(user(1));

        let result = ReactionEngine::new(&api, PROJECT, 42)
            .toggle(ReactionName::Heart, &mut me)
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(
            api.calls(),
            vec![
                Call::List,
                Call::Add(ReactionName::Heart),
                Call::List,
                Call::Remove(77),
                Call::List
            ]
        );
    }

    #[tokio::test]
    async fn test_other_add_failures_surface() {
        let api = ScriptedApi::new(1, vec![vec![]])
            .failing_add(AppError::gitlab_api_full("Access denied", 403, "/award_emoji"));
        let mut me = Some(user(1));

        let err = ReactionEngine::new(&api, PROJECT, 42)
            .toggle(ReactionName::Tada, &mut me)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GitLabApi { .. }));
    }

    #[tokio::test]
    async fn test_current_user_fetched_once() {
        let api = ScriptedApi::new(3, vec![vec![]]);
        let mut cache = None;

        ensure_current_user(&api, &mut cache).await.unwrap();
        ensure_current_user(&api, &mut cache).await.unwrap();

        assert_eq!(api.calls(), vec![Call::User]);
    }

    #[tokio::test]
    async fn test_own_thumbsup_deletes_over_http() {
        let server = MockServer::start();
        let list = server.mock(|when, then| {
            when.method(GET).path("/api/v4/projects/12345/issues/42/award_emoji");
            then.status(200).json_body(json!([
                {"id": 99, "name": "thumbsup", "user": {"id": 1, "username": "me", "name": "Me"}}
            ]));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/api/v4/projects/12345/issues/42/award_emoji/99");
            then.status(204);
        });
        let add = server.mock(|when, then| {
            when.method(POST).path("/api/v4/projects/12345/issues/42/award_emoji");
            then.status(201).json_body(json!({"id": 100, "name": "thumbsup", "user": {"id": 1}}));
        });

        let client = GitLabClient::new(GitLabClientConfig {
            base_url: server.base_url(),
            token: "test-access-token".to_string(),
            ..Default::default()
        })
        .unwrap();
        let mut me = Some(user(1));

        ReactionEngine::new(&client, PROJECT, 42)
            .toggle(ReactionName::Thumbsup, &mut me)
            .await
            .unwrap();

        delete.assert_calls(1);
        add.assert_calls(0);
        list.assert_calls(2);
    }
}
