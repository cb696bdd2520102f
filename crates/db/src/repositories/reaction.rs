//! Reaction repository.

use std::sync::Arc;

use crate::entities::{Reaction, reaction};
use hearth_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    QueryFilter, SqlErr,
};

/// Reaction repository for database operations.
#[derive(Clone)]
pub struct ReactionRepository {
    db: Arc<DatabaseConnection>,
}

impl ReactionRepository {
    /// Create a new reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the reaction a user holds on a piece of content, if any.
    ///
    /// At most one row exists per (user, content) pair.
    pub async fn find_by_user_and_content(
        &self,
        user_id: &str,
        content_id: &str,
    ) -> AppResult<Option<reaction::Model>> {
        Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::ContentId.eq(content_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new reaction.
    ///
    /// A racing duplicate insert trips the unique (user, content) index
    /// and is reported as a conflict.
    pub async fn create(&self, model: reaction::ActiveModel) -> AppResult<reaction::Model> {
        model.insert(self.db.as_ref()).await.map_err(insert_error)
    }

    /// Flip an existing reaction's kind.
    pub async fn update(&self, model: reaction::ActiveModel) -> AppResult<reaction::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a reaction.
    pub async fn delete(&self, model: reaction::Model) -> AppResult<()> {
        model
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

fn insert_error(e: DbErr) -> AppError {
    if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return AppError::Conflict("Reaction already exists".to_string());
    }
    AppError::Database(e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::post;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, Set};

    fn create_test_reaction(id: &str, user_id: &str, kind: reaction::ReactionKind) -> reaction::Model {
        reaction::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            content_id: "p1".to_string(),
            content_type: post::PostType::Post,
            kind,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_user_and_content_found() {
        let r = create_test_reaction("r1", "u1", reaction::ReactionKind::Like);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[r.clone()]])
                .into_connection(),
        );

        let repo = ReactionRepository::new(db);
        let result = repo.find_by_user_and_content("u1", "p1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().kind, reaction::ReactionKind::Like);
    }

    #[tokio::test]
    async fn test_find_by_user_and_content_none() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<reaction::Model>::new()])
                .into_connection(),
        );

        let repo = ReactionRepository::new(db);
        let result = repo.find_by_user_and_content("u1", "p2").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_create_failure_maps_to_database_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Custom("connection reset".to_string())])
                .into_connection(),
        );

        let repo = ReactionRepository::new(db);
        let model = reaction::ActiveModel {
            id: Set("r1".to_string()),
            user_id: Set("u1".to_string()),
            content_id: Set("p1".to_string()),
            content_type: Set(post::PostType::Post),
            kind: Set(reaction::ReactionKind::Like),
            created_at: Set(Utc::now().into()),
        };
        let result = repo.create(model).await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[test]
    fn test_insert_error_only_unique_violations_conflict() {
        // Driver errors other than a unique-index violation stay as
        // database errors.
        let err = insert_error(DbErr::Custom("boom".to_string()));
        assert!(matches!(err, AppError::Database(_)));
    }
}
