//! Reaction service.
//!
//! A user holds at most one reaction per content item. Sending the same
//! kind again removes it; sending the other kind flips it. The post's
//! denormalized like/dislike counters are adjusted incrementally, never
//! recounted.

use chrono::Utc;
use hearth_common::{AppError, AppResult, IdGenerator};
use hearth_db::{
    entities::{post, reaction, user},
    repositories::{PostRepository, ReactionRepository},
};
use sea_orm::Set;
use serde::Serialize;

/// What a toggle request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionOutcome {
    Added,
    Updated,
    Removed,
}

/// Result of a toggle, including the caller's state afterwards and the
/// adjusted counters.
#[derive(Debug, Clone, Serialize)]
pub struct ReactionResult {
    pub outcome: ReactionOutcome,
    /// The reaction the user now holds, if any.
    #[serde(rename = "type")]
    pub kind: Option<reaction::ReactionKind>,
    pub like_count: i32,
    pub dislike_count: i32,
}

/// Stored like/dislike counters for a content item.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReactionCounts {
    pub like_count: i32,
    pub dislike_count: i32,
}

/// Reaction service for business logic.
#[derive(Clone)]
pub struct ReactionService {
    reaction_repo: ReactionRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

impl ReactionService {
    /// Create a new reaction service.
    #[must_use]
    pub fn new(reaction_repo: ReactionRepository, post_repo: PostRepository) -> Self {
        Self {
            reaction_repo,
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Toggle a reaction on a piece of content.
    ///
    /// The target must be visible to the actor and not archived. The
    /// reaction row is the primary write; a failure there aborts the
    /// operation. Counter adjustments are secondary and only logged
    /// when they fail.
    pub async fn react(
        &self,
        actor: &user::Model,
        content_id: &str,
        kind: reaction::ReactionKind,
    ) -> AppResult<ReactionResult> {
        let target = self.post_repo.get_by_id(content_id).await?;
        if target.is_archived() || !super::visible_to(&target, Some(actor)) {
            return Err(AppError::PostNotFound(content_id.to_string()));
        }

        let existing = self
            .reaction_repo
            .find_by_user_and_content(&actor.id, content_id)
            .await?;

        let (outcome, held, like_delta, dislike_delta) = match existing {
            None => {
                let model = reaction::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(actor.id.clone()),
                    content_id: Set(content_id.to_string()),
                    content_type: Set(target.post_type),
                    kind: Set(kind),
                    created_at: Set(Utc::now().into()),
                };
                self.reaction_repo.create(model).await?;

                self.adjust(content_id, kind, 1).await;
                let (l, d) = delta(kind, 1);
                (ReactionOutcome::Added, Some(kind), l, d)
            }
            Some(r) if r.kind == kind => {
                self.reaction_repo.delete(r).await?;

                self.adjust(content_id, kind, -1).await;
                let (l, d) = delta(kind, -1);
                (ReactionOutcome::Removed, None, l, d)
            }
            Some(r) => {
                let old_kind = r.kind;
                let mut active: reaction::ActiveModel = r.into();
                active.kind = Set(kind);
                self.reaction_repo.update(active).await?;

                self.adjust(content_id, old_kind, -1).await;
                self.adjust(content_id, kind, 1).await;
                let (l1, d1) = delta(old_kind, -1);
                let (l2, d2) = delta(kind, 1);
                (ReactionOutcome::Updated, Some(kind), l1 + l2, d1 + d2)
            }
        };

        Ok(ReactionResult {
            outcome,
            kind: held,
            like_count: (target.like_count + like_delta).max(0),
            dislike_count: (target.dislike_count + dislike_delta).max(0),
        })
    }

    /// The stored counters for a content item, subject to the same
    /// visibility rule as the content itself.
    pub async fn counts(
        &self,
        content_id: &str,
        viewer: Option<&user::Model>,
    ) -> AppResult<ReactionCounts> {
        let target = self.post_repo.get_by_id(content_id).await?;
        if !super::visible_to(&target, viewer) {
            return Err(AppError::PostNotFound(content_id.to_string()));
        }

        Ok(ReactionCounts {
            like_count: target.like_count,
            dislike_count: target.dislike_count,
        })
    }

    /// The reaction a user currently holds on a content item, if any.
    pub async fn current(
        &self,
        user_id: &str,
        content_id: &str,
    ) -> AppResult<Option<reaction::ReactionKind>> {
        Ok(self
            .reaction_repo
            .find_by_user_and_content(user_id, content_id)
            .await?
            .map(|r| r.kind))
    }

    /// Apply a single counter adjustment, logging failures.
    async fn adjust(&self, content_id: &str, kind: reaction::ReactionKind, by: i32) {
        let result = match (kind, by) {
            (reaction::ReactionKind::Like, 1) => {
                self.post_repo.increment_like_count(content_id).await
            }
            (reaction::ReactionKind::Like, _) => {
                self.post_repo.decrement_like_count(content_id).await
            }
            (reaction::ReactionKind::Dislike, 1) => {
                self.post_repo.increment_dislike_count(content_id).await
            }
            (reaction::ReactionKind::Dislike, _) => {
                self.post_repo.decrement_dislike_count(content_id).await
            }
        };

        if let Err(e) = result {
            tracing::warn!(
                error = %e,
                content_id = %content_id,
                kind = ?kind,
                by,
                "Failed to adjust reaction counter"
            );
        }
    }
}

/// Counter deltas (like, dislike) for one adjustment.
const fn delta(kind: reaction::ReactionKind, by: i32) -> (i32, i32) {
    match kind {
        reaction::ReactionKind::Like => (by, 0),
        reaction::ReactionKind::Dislike => (0, by),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: &str, role: user::Role) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user_{id}"),
            email: format!("{id}@example.com"),
            password_hash: "$argon2id$test".to_string(),
            full_name: None,
            avatar_url: None,
            role,
            status: user::Status::Active,
            email_verified: false,
            last_login: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_post(id: &str, likes: i32, dislikes: i32) -> post::Model {
        post::Model {
            id: id.to_string(),
            author_id: "author1".to_string(),
            title: "Title".to_string(),
            content: "Body".to_string(),
            excerpt: None,
            featured_image: None,
            category: None,
            tags: serde_json::json!([]),
            post_type: post::PostType::Post,
            status: post::PostStatus::Published,
            start_date: None,
            end_date: None,
            location: None,
            capacity: None,
            requirements: None,
            activity_type: None,
            difficulty: None,
            duration: None,
            points: None,
            instructions: None,
            resources: None,
            view_count: 0,
            like_count: likes,
            dislike_count: dislikes,
            comment_count: 0,
            published_at: Some(Utc::now().into()),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_reaction(
        id: &str,
        user_id: &str,
        kind: reaction::ReactionKind,
    ) -> reaction::Model {
        reaction::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            content_id: "p1".to_string(),
            content_type: post::PostType::Post,
            kind,
            created_at: Utc::now().into(),
        }
    }

    fn exec_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    #[tokio::test]
    async fn test_react_from_none_adds() {
        let post = create_test_post("p1", 3, 0);
        let created = create_test_reaction("r1", "u1", reaction::ReactionKind::Like);

        let reaction_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // no existing reaction
                .append_query_results([Vec::<reaction::Model>::new()])
                // insert returns the new row
                .append_query_results([[created]])
                .append_exec_results([exec_ok()])
                .into_connection(),
        );
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post]])
                .append_exec_results([exec_ok()])
                .into_connection(),
        );

        let service = ReactionService::new(
            ReactionRepository::new(reaction_db),
            PostRepository::new(post_db),
        );

        let result = service
            .react(
                &create_test_user("u1", user::Role::User),
                "p1",
                reaction::ReactionKind::Like,
            )
            .await
            .unwrap();

        assert_eq!(result.outcome, ReactionOutcome::Added);
        assert_eq!(result.kind, Some(reaction::ReactionKind::Like));
        assert_eq!(result.like_count, 4);
        assert_eq!(result.dislike_count, 0);
    }

    #[tokio::test]
    async fn test_react_same_kind_removes() {
        let post = create_test_post("p1", 3, 0);
        let existing = create_test_reaction("r1", "u1", reaction::ReactionKind::Like);

        let reaction_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_exec_results([exec_ok()])
                .into_connection(),
        );
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post]])
                .append_exec_results([exec_ok()])
                .into_connection(),
        );

        let service = ReactionService::new(
            ReactionRepository::new(reaction_db),
            PostRepository::new(post_db),
        );

        let result = service
            .react(
                &create_test_user("u1", user::Role::User),
                "p1",
                reaction::ReactionKind::Like,
            )
            .await
            .unwrap();

        assert_eq!(result.outcome, ReactionOutcome::Removed);
        assert_eq!(result.kind, None);
        assert_eq!(result.like_count, 2);
    }

    #[tokio::test]
    async fn test_react_other_kind_flips() {
        let post = create_test_post("p1", 3, 1);
        let existing = create_test_reaction("r1", "u1", reaction::ReactionKind::Like);
        let mut flipped = existing.clone();
        flipped.kind = reaction::ReactionKind::Dislike;

        let reaction_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                // update returns the flipped row
                .append_query_results([[flipped]])
                .append_exec_results([exec_ok()])
                .into_connection(),
        );
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post]])
                .append_exec_results([exec_ok(), exec_ok()])
                .into_connection(),
        );

        let service = ReactionService::new(
            ReactionRepository::new(reaction_db),
            PostRepository::new(post_db),
        );

        let result = service
            .react(
                &create_test_user("u1", user::Role::User),
                "p1",
                reaction::ReactionKind::Dislike,
            )
            .await
            .unwrap();

        assert_eq!(result.outcome, ReactionOutcome::Updated);
        assert_eq!(result.kind, Some(reaction::ReactionKind::Dislike));
        assert_eq!(result.like_count, 2);
        assert_eq!(result.dislike_count, 2);
    }

    #[tokio::test]
    async fn test_react_to_archived_not_found() {
        let mut archived = create_test_post("p1", 0, 0);
        archived.status = post::PostStatus::Archived;

        let reaction_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[archived]])
                .into_connection(),
        );

        let service = ReactionService::new(
            ReactionRepository::new(reaction_db),
            PostRepository::new(post_db),
        );

        let result = service
            .react(
                &create_test_user("u1", user::Role::User),
                "p1",
                reaction::ReactionKind::Like,
            )
            .await;
        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_react_on_draft_by_stranger_not_found() {
        let mut draft = create_test_post("p1", 0, 0);
        draft.status = post::PostStatus::Draft;
        draft.published_at = None;

        let reaction_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[draft]])
                .into_connection(),
        );

        let service = ReactionService::new(
            ReactionRepository::new(reaction_db),
            PostRepository::new(post_db),
        );

        let result = service
            .react(
                &create_test_user("u2", user::Role::User),
                "p1",
                reaction::ReactionKind::Like,
            )
            .await;
        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_counts_reads_stored_counters() {
        let post = create_test_post("p1", 7, 2);

        let reaction_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post]])
                .into_connection(),
        );

        let service = ReactionService::new(
            ReactionRepository::new(reaction_db),
            PostRepository::new(post_db),
        );

        let counts = service.counts("p1", None).await.unwrap();
        assert_eq!(counts.like_count, 7);
        assert_eq!(counts.dislike_count, 2);
    }

    #[tokio::test]
    async fn test_counts_on_draft_hidden_from_strangers() {
        let mut draft = create_test_post("p1", 1, 0);
        draft.status = post::PostStatus::Draft;
        draft.published_at = None;

        let reaction_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[draft]])
                .into_connection(),
        );

        let service = ReactionService::new(
            ReactionRepository::new(reaction_db),
            PostRepository::new(post_db),
        );

        let result = service.counts("p1", None).await;
        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_counts_on_draft_visible_to_author() {
        let mut draft = create_test_post("p1", 1, 0);
        draft.status = post::PostStatus::Draft;
        draft.published_at = None;
        let author = create_test_user("author1", user::Role::User);

        let reaction_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[draft]])
                .into_connection(),
        );

        let service = ReactionService::new(
            ReactionRepository::new(reaction_db),
            PostRepository::new(post_db),
        );

        let counts = service.counts("p1", Some(&author)).await.unwrap();
        assert_eq!(counts.like_count, 1);
    }

    #[tokio::test]
    async fn test_react_missing_content_not_found() {
        let reaction_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let service = ReactionService::new(
            ReactionRepository::new(reaction_db),
            PostRepository::new(post_db),
        );

        let result = service
            .react(
                &create_test_user("u1", user::Role::User),
                "gone",
                reaction::ReactionKind::Like,
            )
            .await;
        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }
}
