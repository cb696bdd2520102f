//! Interaction history endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::{DateTime, Utc};
use hearth_common::{AppError, AppResult};
use hearth_core::services::ActivityStats;
use hearth_db::{
    entities::{interaction, user},
    repositories::InteractionFilter,
};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Paginated},
};

/// One interaction log entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionResponse {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub interaction_type: String,
    pub target_type: String,
    pub target_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
}

impl From<interaction::Model> for InteractionResponse {
    fn from(i: interaction::Model) -> Self {
        Self {
            id: i.id,
            user_id: i.user_id,
            interaction_type: i.interaction_type,
            target_type: i.target_type,
            target_id: i.target_id,
            metadata: i.metadata,
            ip_address: i.ip_address,
            user_agent: i.user_agent,
            created_at: i.created_at.to_rfc3339(),
        }
    }
}

/// Aggregate activity counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStatsResponse {
    pub total: u64,
    pub today: u64,
    pub this_week: u64,
    pub top_types: Vec<TypeCountResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCountResponse {
    #[serde(rename = "type")]
    pub interaction_type: String,
    pub count: i64,
}

impl From<ActivityStats> for ActivityStatsResponse {
    fn from(s: ActivityStats) -> Self {
        Self {
            total: s.total,
            today: s.today,
            this_week: s.this_week,
            top_types: s
                .top_types
                .into_iter()
                .map(|t| TypeCountResponse {
                    interaction_type: t.interaction_type,
                    count: t.count,
                })
                .collect(),
        }
    }
}

/// History listing query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    #[serde(default = "default_page")]
    pub page: u64,

    #[serde(default = "default_limit")]
    pub limit: u64,

    #[serde(rename = "type")]
    pub interaction_type: Option<String>,

    pub target_type: Option<String>,

    /// Only applied on the admin-wide listing.
    pub user_id: Option<String>,

    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    20
}

impl HistoryRequest {
    fn filter(&self, user_id: Option<String>) -> InteractionFilter {
        InteractionFilter {
            user_id,
            interaction_type: self.interaction_type.clone(),
            target_type: self.target_type.clone(),
            date_from: self.date_from,
            date_to: self.date_to,
        }
    }
}

fn require_admin(user: &user::Model) -> AppResult<()> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin privileges required".to_string()));
    }
    Ok(())
}

/// The caller's own history, newest first.
async fn my_history(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(req): Query<HistoryRequest>,
) -> AppResult<ApiResponse<Paginated<InteractionResponse>>> {
    let (entries, total) = state
        .interaction_service
        .history(&user.id, &req.filter(None), req.page, req.limit)
        .await?;

    Ok(ApiResponse::ok(Paginated::new(
        entries.into_iter().map(Into::into).collect(),
        req.page,
        req.limit,
        total,
    )))
}

/// The caller's own aggregate activity.
async fn my_stats(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ActivityStatsResponse>> {
    let stats = state.interaction_service.user_stats(&user.id).await?;
    Ok(ApiResponse::ok(stats.into()))
}

/// Every user's history (admin).
async fn all_history(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(req): Query<HistoryRequest>,
) -> AppResult<ApiResponse<Paginated<InteractionResponse>>> {
    require_admin(&user)?;

    let filter = req.filter(req.user_id.clone());
    let (entries, total) = state
        .interaction_service
        .all_history(&filter, req.page, req.limit)
        .await?;

    Ok(ApiResponse::ok(Paginated::new(
        entries.into_iter().map(Into::into).collect(),
        req.page,
        req.limit,
        total,
    )))
}

/// Platform-wide aggregate activity (admin).
async fn global_stats(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ActivityStatsResponse>> {
    require_admin(&user)?;

    let stats = state.interaction_service.global_stats().await?;
    Ok(ApiResponse::ok(stats.into()))
}

/// One user's history (admin).
async fn user_history(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(req): Query<HistoryRequest>,
) -> AppResult<ApiResponse<Paginated<InteractionResponse>>> {
    require_admin(&user)?;

    let (entries, total) = state
        .interaction_service
        .history(&user_id, &req.filter(None), req.page, req.limit)
        .await?;

    Ok(ApiResponse::ok(Paginated::new(
        entries.into_iter().map(Into::into).collect(),
        req.page,
        req.limit,
        total,
    )))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/my-history", get(my_history))
        .route("/my-stats", get(my_stats))
        .route("/all", get(all_history))
        .route("/stats", get(global_stats))
        .route("/user/{user_id}", get(user_history))
}
