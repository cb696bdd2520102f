//! Comment service.
//!
//! Threads are one level deep: replies attach to a top-level comment
//! and nothing attaches to a reply.

use std::collections::HashMap;

use chrono::Utc;
use hearth_common::{AppError, AppResult, IdGenerator};
use hearth_db::{
    entities::{comment, post, user},
    repositories::{CommentRepository, PostRepository, UserRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for creating a comment or reply.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentInput {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,

    /// Top-level comment being replied to, if any.
    pub parent_id: Option<String>,
}

/// Public author fields attached to each comment.
#[derive(Debug, Clone, Serialize)]
pub struct CommentAuthor {
    pub id: String,
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub email: String,
}

impl From<&user::Model> for CommentAuthor {
    fn from(u: &user::Model) -> Self {
        Self {
            id: u.id.clone(),
            username: u.username.clone(),
            full_name: u.full_name.clone(),
            avatar_url: u.avatar_url.clone(),
            email: u.email.clone(),
        }
    }
}

/// A comment hydrated with its author and replies.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: comment::Model,
    pub author: Option<CommentAuthor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<CommentView>,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Comment on a piece of content, or reply to an existing comment.
    ///
    /// The target must be visible to the actor and not archived.
    pub async fn create(
        &self,
        actor: &user::Model,
        content_id: &str,
        input: CreateCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        let text = input.content.trim();
        if text.is_empty() {
            return Err(AppError::BadRequest(
                "Comment content cannot be empty".to_string(),
            ));
        }

        let target = self.post_repo.get_by_id(content_id).await?;
        if target.is_archived() || !super::visible_to(&target, Some(actor)) {
            return Err(AppError::PostNotFound(content_id.to_string()));
        }

        if let Some(parent_id) = &input.parent_id {
            let parent = self.comment_repo.get_by_id(parent_id).await?;

            if parent.content_id != content_id {
                return Err(AppError::BadRequest(
                    "Parent comment belongs to different content".to_string(),
                ));
            }
            if parent.is_reply() {
                return Err(AppError::BadRequest(
                    "Replies can only target top-level comments".to_string(),
                ));
            }
        }

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            content_id: Set(content_id.to_string()),
            content_type: Set(target.post_type),
            user_id: Set(actor.id.clone()),
            parent_id: Set(input.parent_id),
            content: Set(text.to_string()),
            status: Set(comment::CommentStatus::Approved),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let created = self.comment_repo.create(model).await?;

        if let Err(e) = self.post_repo.increment_comment_count(content_id).await {
            tracing::warn!(error = %e, content_id = %content_id, "Failed to increment comment count");
        }

        Ok(created)
    }

    /// List a content item's comment thread: top-level comments newest
    /// first, replies nested oldest first, authors attached. The thread
    /// follows the content's own visibility.
    pub async fn list(
        &self,
        content_id: &str,
        viewer: Option<&user::Model>,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<CommentView>, u64)> {
        let target = self.post_repo.get_by_id(content_id).await?;
        if !super::visible_to(&target, viewer) {
            return Err(AppError::PostNotFound(content_id.to_string()));
        }

        let (limit, offset) = super::page_window(page, limit);
        let (top_level, total) = self
            .comment_repo
            .find_top_level_paged(content_id, target.post_type, limit, offset)
            .await?;

        let parent_ids: Vec<String> = top_level.iter().map(|c| c.id.clone()).collect();
        let replies = self.comment_repo.find_replies(&parent_ids).await?;

        let mut author_ids: Vec<String> = top_level
            .iter()
            .chain(replies.iter())
            .map(|c| c.user_id.clone())
            .collect();
        author_ids.sort();
        author_ids.dedup();

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let mut replies_by_parent: HashMap<String, Vec<CommentView>> = HashMap::new();
        for reply in replies {
            let author = authors.get(&reply.user_id).map(CommentAuthor::from);
            if let Some(parent_id) = reply.parent_id.clone() {
                replies_by_parent
                    .entry(parent_id)
                    .or_default()
                    .push(CommentView {
                        comment: reply,
                        author,
                        replies: vec![],
                    });
            }
        }

        let thread = top_level
            .into_iter()
            .map(|c| {
                let author = authors.get(&c.user_id).map(CommentAuthor::from);
                let replies = replies_by_parent.remove(&c.id).unwrap_or_default();
                CommentView {
                    comment: c,
                    author,
                    replies,
                }
            })
            .collect();

        Ok((thread, total))
    }

    /// Delete a comment and its replies. Only the comment's author may
    /// do this. The content's comment counter is reduced by the number
    /// of rows removed.
    pub async fn delete(&self, comment_id: &str, actor: &user::Model) -> AppResult<()> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;

        if comment.user_id != actor.id {
            return Err(AppError::Forbidden(
                "Only the comment author can delete it".to_string(),
            ));
        }

        let removed = self.comment_repo.delete_with_replies(comment_id).await?;

        if removed > 0 {
            if let Err(e) = self
                .post_repo
                .decrement_comment_count_by(&comment.content_id, removed)
                .await
            {
                tracing::warn!(
                    error = %e,
                    content_id = %comment.content_id,
                    removed,
                    "Failed to decrement comment count"
                );
            }
        }

        Ok(())
    }
}
