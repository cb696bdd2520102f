//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, post};
use chrono::{DateTime, Utc};
use hearth_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
    sea_query::{Expr, extension::postgres::PgExpr},
};

/// Optional narrowing of the public listing. All filters combine with
/// the implicit published-only condition.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub post_type: Option<post::PostType>,
    pub category: Option<String>,
    pub author_id: Option<String>,
    /// Case-insensitive substring match over title and body.
    pub search: Option<String>,
}

impl PostFilter {
    fn condition(&self) -> Condition {
        let mut condition =
            Condition::all().add(post::Column::Status.eq(post::PostStatus::Published));

        if let Some(t) = self.post_type {
            condition = condition.add(post::Column::PostType.eq(t));
        }
        if let Some(c) = &self.category {
            condition = condition.add(post::Column::Category.eq(c));
        }
        if let Some(a) = &self.author_id {
            condition = condition.add(post::Column::AuthorId.eq(a));
        }
        if let Some(term) = &self.search {
            let pattern = format!("%{}%", term.replace('%', "\\%").replace('_', "\\_"));
            condition = condition.add(
                Condition::any()
                    .add(Expr::col(post::Column::Title).ilike(pattern.clone()))
                    .add(Expr::col(post::Column::Content).ilike(pattern)),
            );
        }

        condition
    }
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Run a filtered listing as a count query plus a page fetch.
    async fn paged(
        &self,
        base: Select<Post>,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<post::Model>, u64)> {
        let total = base
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let posts = base
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((posts, total))
    }

    /// List published posts (newest publication first), narrowed by the
    /// given filter.
    pub async fn find_published_paged(
        &self,
        filter: &PostFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<post::Model>, u64)> {
        let query = Post::find()
            .filter(filter.condition())
            .order_by_desc(post::Column::PublishedAt);

        self.paged(query, limit, offset).await
    }

    /// List a user's own posts in any status (newest first).
    pub async fn find_by_author_paged(
        &self,
        author_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<post::Model>, u64)> {
        let query = Post::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .order_by_desc(post::Column::CreatedAt);

        self.paged(query, limit, offset).await
    }

    /// Most-viewed published posts.
    pub async fn find_popular(&self, limit: u64) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(post::Column::Status.eq(post::PostStatus::Published))
            .order_by_desc(post::Column::ViewCount)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recently published posts.
    pub async fn find_recent(&self, limit: u64) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(post::Column::Status.eq(post::PostStatus::Published))
            .order_by_desc(post::Column::PublishedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ==================== Denormalized Counters ====================

    /// Increment view count atomically (single UPDATE query, no fetch).
    pub async fn increment_view_count(&self, post_id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::ViewCount,
                Expr::col(post::Column::ViewCount).add(1),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment like count atomically (single UPDATE query, no fetch).
    pub async fn increment_like_count(&self, post_id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::LikeCount,
                Expr::col(post::Column::LikeCount).add(1),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement like count atomically, floored at zero.
    pub async fn decrement_like_count(&self, post_id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::LikeCount,
                Expr::cust("GREATEST(like_count - 1, 0)"),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment dislike count atomically (single UPDATE query, no fetch).
    pub async fn increment_dislike_count(&self, post_id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::DislikeCount,
                Expr::col(post::Column::DislikeCount).add(1),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement dislike count atomically, floored at zero.
    pub async fn decrement_dislike_count(&self, post_id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::DislikeCount,
                Expr::cust("GREATEST(dislike_count - 1, 0)"),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment comment count atomically (single UPDATE query, no fetch).
    pub async fn increment_comment_count(&self, post_id: &str) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::CommentCount,
                Expr::col(post::Column::CommentCount).add(1),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement comment count by `n` atomically, floored at zero.
    ///
    /// Used when a comment is removed together with its replies.
    pub async fn decrement_comment_count_by(&self, post_id: &str, n: u64) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::CommentCount,
                Expr::cust(format!("GREATEST(comment_count - {n}, 0)")),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ==================== Statistics ====================

    /// Count all posts in any status.
    pub async fn count_all(&self) -> AppResult<u64> {
        Post::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count posts in the given status.
    pub async fn count_by_status(&self, status: post::PostStatus) -> AppResult<u64> {
        Post::find()
            .filter(post::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count posts created since the given time.
    pub async fn count_created_since(&self, since: DateTime<Utc>) -> AppResult<u64> {
        Post::find()
            .filter(post::Column::CreatedAt.gte(since))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
