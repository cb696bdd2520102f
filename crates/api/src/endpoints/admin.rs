//! Admin endpoints. Every handler checks the caller's role inline.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use hearth_common::{AppError, AppResult};
use hearth_core::services::{AdminUpdateUserInput, PostStats, RecordInteraction, UserStats};
use hearth_db::{entities::user, repositories::UserFilter};
use serde::{Deserialize, Serialize};

use super::{auth::UserResponse, history::ActivityStatsResponse};
use crate::{
    extractors::{AuthUser, ClientInfo},
    middleware::AppState,
    response::{ApiResponse, Paginated},
};

fn require_admin(user: &user::Model) -> AppResult<()> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin privileges required".to_string()));
    }
    Ok(())
}

/// User listing query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersRequest {
    #[serde(default = "default_page")]
    pub page: u64,

    #[serde(default = "default_limit")]
    pub limit: u64,

    pub role: Option<user::Role>,
    pub status: Option<user::Status>,
    pub search: Option<String>,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    20
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsResponse {
    pub total: u64,
    pub active: u64,
    pub admins: u64,
    pub new_today: u64,
}

impl From<UserStats> for UserStatsResponse {
    fn from(s: UserStats) -> Self {
        Self {
            total: s.total,
            active: s.active,
            admins: s.admins,
            new_today: s.new_today,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostStatsResponse {
    pub total: u64,
    pub published: u64,
    pub drafts: u64,
    pub new_today: u64,
}

impl From<PostStats> for PostStatsResponse {
    fn from(s: PostStats) -> Self {
        Self {
            total: s.total,
            published: s.published,
            drafts: s.drafts,
            new_today: s.new_today,
        }
    }
}

/// Dashboard aggregates: users, content and activity side by side.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatsResponse {
    pub users: UserStatsResponse,
    pub posts: PostStatsResponse,
    pub activity: ActivityStatsResponse,
}

/// List users, newest first.
async fn list_users(
    AuthUser(admin): AuthUser,
    State(state): State<AppState>,
    Query(req): Query<ListUsersRequest>,
) -> AppResult<ApiResponse<Paginated<UserResponse>>> {
    require_admin(&admin)?;

    let filter = UserFilter {
        role: req.role,
        status: req.status,
        search: req.search.clone(),
    };

    let (users, total) = state.user_service.list(&filter, req.page, req.limit).await?;

    Ok(ApiResponse::ok(Paginated::new(
        users.into_iter().map(Into::into).collect(),
        req.page,
        req.limit,
        total,
    )))
}

/// Fetch one user.
async fn get_user(
    AuthUser(admin): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    require_admin(&admin)?;

    let user = state.user_service.get(&user_id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Update any user's role, status or profile fields.
async fn update_user(
    AuthUser(admin): AuthUser,
    State(state): State<AppState>,
    client: ClientInfo,
    Path(user_id): Path<String>,
    Json(input): Json<AdminUpdateUserInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    require_admin(&admin)?;

    let updated = state.user_service.admin_update(&user_id, input).await?;

    state
        .interaction_service
        .record(RecordInteraction {
            user_id: admin.id,
            interaction_type: "admin_user_update".to_string(),
            target_type: "user".to_string(),
            target_id: Some(user_id),
            metadata: None,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        })
        .await;

    Ok(ApiResponse::ok(updated.into()).with_message("User updated"))
}

/// Deactivate a user account. Soft delete: the row stays, historical
/// content remains attributed.
async fn deactivate_user(
    AuthUser(admin): AuthUser,
    State(state): State<AppState>,
    client: ClientInfo,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    require_admin(&admin)?;

    state.user_service.admin_deactivate(&user_id, &admin.id).await?;

    state
        .interaction_service
        .record(RecordInteraction {
            user_id: admin.id,
            interaction_type: "admin_user_delete".to_string(),
            target_type: "user".to_string(),
            target_id: Some(user_id),
            metadata: None,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        })
        .await;

    Ok(ApiResponse::message("User deactivated"))
}

/// Dashboard aggregates.
async fn dashboard_stats(
    AuthUser(admin): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DashboardStatsResponse>> {
    require_admin(&admin)?;

    let users = state.user_service.stats().await?;
    let posts = state.post_service.stats().await?;
    let activity = state.interaction_service.global_stats().await?;

    Ok(ApiResponse::ok(DashboardStatsResponse {
        users: users.into(),
        posts: posts.into(),
        activity: activity.into(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/{user_id}",
            get(get_user).put(update_user).delete(deactivate_user),
        )
        .route("/dashboard/stats", get(dashboard_stats))
}
