//! Interaction log service.
//!
//! Records user actions and serves the history and stats endpoints.
//! Recording is best-effort: the log is an audit trail, and a failed
//! write must never fail the action being logged.

use chrono::{DateTime, Utc};
use hearth_common::{AppResult, IdGenerator};
use hearth_db::{
    entities::interaction,
    repositories::{InteractionFilter, InteractionRepository, InteractionTypeCount},
};
use sea_orm::Set;
use serde::Serialize;

/// One action to record.
#[derive(Debug, Clone)]
pub struct RecordInteraction {
    pub user_id: String,
    pub interaction_type: String,
    pub target_type: String,
    pub target_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Aggregate activity counts.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityStats {
    pub total: u64,
    pub today: u64,
    pub this_week: u64,
    pub top_types: Vec<InteractionTypeCount>,
}

/// Interaction service for business logic.
#[derive(Clone)]
pub struct InteractionService {
    interaction_repo: InteractionRepository,
    id_gen: IdGenerator,
}

impl InteractionService {
    /// Create a new interaction service.
    #[must_use]
    pub fn new(interaction_repo: InteractionRepository) -> Self {
        Self {
            interaction_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Record an action. Failures are logged and swallowed.
    pub async fn record(&self, entry: RecordInteraction) {
        let model = interaction::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(entry.user_id.clone()),
            interaction_type: Set(entry.interaction_type.clone()),
            target_type: Set(entry.target_type),
            target_id: Set(entry.target_id),
            metadata: Set(entry.metadata),
            ip_address: Set(entry.ip_address),
            user_agent: Set(entry.user_agent),
            created_at: Set(Utc::now().into()),
        };

        if let Err(e) = self.interaction_repo.create(model).await {
            tracing::warn!(
                error = %e,
                user_id = %entry.user_id,
                interaction_type = %entry.interaction_type,
                "Failed to record interaction"
            );
        }
    }

    /// One user's history (newest first).
    pub async fn history(
        &self,
        user_id: &str,
        filter: &InteractionFilter,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<interaction::Model>, u64)> {
        let (limit, offset) = super::page_window(page, limit);
        self.interaction_repo
            .find_by_user_paged(user_id, filter, limit, offset)
            .await
    }

    /// All users' history (admin, newest first).
    pub async fn all_history(
        &self,
        filter: &InteractionFilter,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<interaction::Model>, u64)> {
        let (limit, offset) = super::page_window(page, limit);
        self.interaction_repo
            .find_all_paged(filter, limit, offset)
            .await
    }

    /// One user's aggregate activity.
    pub async fn user_stats(&self, user_id: &str) -> AppResult<ActivityStats> {
        let total = self.interaction_repo.count_by_user(user_id).await?;
        let today = self
            .interaction_repo
            .count_by_user_since(user_id, start_of_today())
            .await?;
        let this_week = self
            .interaction_repo
            .count_by_user_since(user_id, Utc::now() - chrono::Duration::days(7))
            .await?;
        let top_types = self.interaction_repo.top_types(Some(user_id), 5).await?;

        Ok(ActivityStats {
            total,
            today,
            this_week,
            top_types,
        })
    }

    /// Platform-wide aggregate activity (admin).
    pub async fn global_stats(&self) -> AppResult<ActivityStats> {
        let total = self.interaction_repo.count_all().await?;
        let today = self.interaction_repo.count_since(start_of_today()).await?;
        let this_week = self
            .interaction_repo
            .count_since(Utc::now() - chrono::Duration::days(7))
            .await?;
        let top_types = self.interaction_repo.top_types(None, 5).await?;

        Ok(ActivityStats {
            total,
            today,
            this_week,
            top_types,
        })
    }
}

/// Midnight UTC of the current day.
pub(crate) fn start_of_today() -> DateTime<Utc> {
    Utc::now()
        .date_naive()
        .and_time(chrono::NaiveTime::MIN)
        .and_utc()
}
