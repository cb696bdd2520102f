//! Interaction log repository.

use std::sync::Arc;

use crate::entities::{Interaction, interaction};
use chrono::{DateTime, Utc};
use hearth_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Serialize;

/// Optional narrowing applied to history listings.
#[derive(Debug, Clone, Default)]
pub struct InteractionFilter {
    /// Only meaningful for the admin-wide listing; per-user queries
    /// already scope by user.
    pub user_id: Option<String>,
    pub interaction_type: Option<String>,
    pub target_type: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl InteractionFilter {
    fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if let Some(u) = &self.user_id {
            condition = condition.add(interaction::Column::UserId.eq(u.clone()));
        }
        if let Some(t) = &self.interaction_type {
            condition = condition.add(interaction::Column::InteractionType.eq(t.clone()));
        }
        if let Some(t) = &self.target_type {
            condition = condition.add(interaction::Column::TargetType.eq(t.clone()));
        }
        if let Some(from) = self.date_from {
            condition = condition.add(interaction::Column::CreatedAt.gte(from));
        }
        if let Some(to) = self.date_to {
            condition = condition.add(interaction::Column::CreatedAt.lte(to));
        }

        condition
    }
}

/// One row of the interaction-type leaderboard.
#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct InteractionTypeCount {
    pub interaction_type: String,
    pub count: i64,
}

/// Interaction repository for database operations.
#[derive(Clone)]
pub struct InteractionRepository {
    db: Arc<DatabaseConnection>,
}

impl InteractionRepository {
    /// Create a new interaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a log entry.
    pub async fn create(&self, model: interaction::ActiveModel) -> AppResult<interaction::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A user's history (newest first), with a total count for pagination.
    pub async fn find_by_user_paged(
        &self,
        user_id: &str,
        filter: &InteractionFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<interaction::Model>, u64)> {
        let condition = filter
            .condition()
            .add(interaction::Column::UserId.eq(user_id));

        self.paged(condition, limit, offset).await
    }

    /// All users' history (newest first), with a total count.
    pub async fn find_all_paged(
        &self,
        filter: &InteractionFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<interaction::Model>, u64)> {
        self.paged(filter.condition(), limit, offset).await
    }

    async fn paged(
        &self,
        condition: Condition,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<interaction::Model>, u64)> {
        let total = Interaction::find()
            .filter(condition.clone())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let entries = Interaction::find()
            .filter(condition)
            .order_by_desc(interaction::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((entries, total))
    }

    /// Count all logged interactions.
    pub async fn count_all(&self) -> AppResult<u64> {
        Interaction::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count interactions logged since the given time.
    pub async fn count_since(&self, since: DateTime<Utc>) -> AppResult<u64> {
        Interaction::find()
            .filter(interaction::Column::CreatedAt.gte(since))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count one user's interactions logged since the given time.
    pub async fn count_by_user_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<u64> {
        Interaction::find()
            .filter(interaction::Column::UserId.eq(user_id))
            .filter(interaction::Column::CreatedAt.gte(since))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all of one user's interactions.
    pub async fn count_by_user(&self, user_id: &str) -> AppResult<u64> {
        Interaction::find()
            .filter(interaction::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most frequent interaction types, busiest first.
    ///
    /// Scoped to one user when `user_id` is given, global otherwise.
    pub async fn top_types(
        &self,
        user_id: Option<&str>,
        limit: u64,
    ) -> AppResult<Vec<InteractionTypeCount>> {
        let mut query = Interaction::find()
            .select_only()
            .column(interaction::Column::InteractionType)
            .column_as(interaction::Column::Id.count(), "count")
            .group_by(interaction::Column::InteractionType)
            .order_by_desc(interaction::Column::Id.count())
            .limit(limit);

        if let Some(id) = user_id {
            query = query.filter(interaction::Column::UserId.eq(id));
        }

        query
            .into_model::<InteractionTypeCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    fn create_test_interaction(id: &str, user_id: &str, kind: &str) -> interaction::Model {
        interaction::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            interaction_type: kind.to_string(),
            target_type: "post".to_string(),
            target_id: Some("p1".to_string()),
            metadata: None,
            ip_address: Some("127.0.0.1".to_string()),
            user_agent: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_user_paged() {
        let i1 = create_test_interaction("i1", "u1", "post_view");
        let i2 = create_test_interaction("i2", "u1", "reaction_added");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    btreemap! { "num_items" => Value::BigInt(Some(5)) },
                ]])
                .append_query_results([[i1, i2]])
                .into_connection(),
        );

        let repo = InteractionRepository::new(db);
        let (entries, total) = repo
            .find_by_user_paged("u1", &InteractionFilter::default(), 2, 0)
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_top_types() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    btreemap! {
                        "interaction_type" => Value::String(Some(Box::new("post_view".to_string()))),
                        "count" => Value::BigInt(Some(42)),
                    },
                    btreemap! {
                        "interaction_type" => Value::String(Some(Box::new("user_login".to_string()))),
                        "count" => Value::BigInt(Some(7)),
                    },
                ]])
                .into_connection(),
        );

        let repo = InteractionRepository::new(db);
        let top = repo.top_types(None, 5).await.unwrap();

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].interaction_type, "post_view");
        assert_eq!(top[0].count, 42);
    }

    #[tokio::test]
    async fn test_count_since() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    btreemap! { "num_items" => Value::BigInt(Some(9)) },
                ]])
                .into_connection(),
        );

        let repo = InteractionRepository::new(db);
        let count = repo.count_since(Utc::now()).await.unwrap();

        assert_eq!(count, 9);
    }
}
