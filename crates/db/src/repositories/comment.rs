//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, comment, post};
use hearth_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a comment by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<comment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment not found: {id}")))
    }

    /// Create a new comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Top-level comments on a piece of content (newest first), with a
    /// total count for pagination. Replies are fetched separately.
    pub async fn find_top_level_paged(
        &self,
        content_id: &str,
        content_type: post::PostType,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<comment::Model>, u64)> {
        let condition = Condition::all()
            .add(comment::Column::ContentId.eq(content_id))
            .add(comment::Column::ContentType.eq(content_type))
            .add(comment::Column::ParentId.is_null());

        let total = Comment::find()
            .filter(condition.clone())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let comments = Comment::find()
            .filter(condition)
            .order_by_desc(comment::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((comments, total))
    }

    /// Replies to a set of top-level comments (oldest first).
    pub async fn find_replies(&self, parent_ids: &[String]) -> AppResult<Vec<comment::Model>> {
        if parent_ids.is_empty() {
            return Ok(vec![]);
        }

        Comment::find()
            .filter(comment::Column::ParentId.is_in(parent_ids.to_vec()))
            .order_by_asc(comment::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a comment together with its replies.
    ///
    /// Returns the number of rows removed so the content's comment
    /// counter can be adjusted by the same amount.
    pub async fn delete_with_replies(&self, id: &str) -> AppResult<u64> {
        let result = Comment::delete_many()
            .filter(
                Condition::any()
                    .add(comment::Column::Id.eq(id))
                    .add(comment::Column::ParentId.eq(id)),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    fn create_test_comment(id: &str, parent_id: Option<&str>) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            content_id: "p1".to_string(),
            content_type: post::PostType::Post,
            user_id: "u1".to_string(),
            parent_id: parent_id.map(ToString::to_string),
            content: "Nice post".to_string(),
            status: comment::CommentStatus::Approved,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_top_level_paged() {
        let c1 = create_test_comment("c1", None);
        let c2 = create_test_comment("c2", None);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    btreemap! { "num_items" => Value::BigInt(Some(2)) },
                ]])
                .append_query_results([[c1, c2]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let (comments, total) = repo
            .find_top_level_paged("p1", post::PostType::Post, 20, 0)
            .await
            .unwrap();

        assert_eq!(comments.len(), 2);
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_find_replies_empty_parents() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = CommentRepository::new(db);
        let replies = repo.find_replies(&[]).await.unwrap();

        assert!(replies.is_empty());
    }

    #[tokio::test]
    async fn test_delete_with_replies_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let removed = repo.delete_with_replies("c1").await.unwrap();

        assert_eq!(removed, 3);
    }
}
