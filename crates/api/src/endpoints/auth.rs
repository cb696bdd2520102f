//! Authentication and profile endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use hearth_common::AppResult;
use hearth_core::services::{
    ChangePasswordInput, LoginInput, RecordInteraction, RegisterInput, UpdateProfileInput,
};
use hearth_db::entities::user;
use serde::Serialize;

use crate::{
    extractors::{AuthUser, ClientInfo},
    middleware::AppState,
    response::ApiResponse,
};

/// Public view of a user account. Never carries the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: user::Role,
    pub status: user::Status,
    pub email_verified: bool,
    pub last_login: Option<String>,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            avatar_url: u.avatar_url,
            role: u.role,
            status: u.status,
            email_verified: u.email_verified,
            last_login: u.last_login.map(|d| d.to_rfc3339()),
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// A user together with a freshly issued bearer token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Create a new account.
async fn register(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(input): Json<RegisterInput>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let user = state.user_service.register(input).await?;
    let token = state.user_service.issue_token(&user.id)?;

    state
        .interaction_service
        .record(RecordInteraction {
            user_id: user.id.clone(),
            interaction_type: "user_register".to_string(),
            target_type: "user".to_string(),
            target_id: Some(user.id.clone()),
            metadata: None,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        })
        .await;

    Ok(ApiResponse::created(AuthResponse {
        user: user.into(),
        token,
    })
    .with_message("User registered successfully"))
}

/// Log in with username (or email) and password.
async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(input): Json<LoginInput>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let (user, token) = state.user_service.authenticate(input).await?;

    state
        .interaction_service
        .record(RecordInteraction {
            user_id: user.id.clone(),
            interaction_type: "user_login".to_string(),
            target_type: "user".to_string(),
            target_id: Some(user.id.clone()),
            metadata: None,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        })
        .await;

    Ok(ApiResponse::ok(AuthResponse {
        user: user.into(),
        token,
    }))
}

/// The caller's own profile.
async fn profile(AuthUser(user): AuthUser) -> AppResult<ApiResponse<UserResponse>> {
    Ok(ApiResponse::ok(user.into()))
}

/// Update the caller's own profile.
async fn update_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let updated = state.user_service.update_profile(&user.id, input).await?;
    Ok(ApiResponse::ok(updated.into()).with_message("Profile updated"))
}

/// Change the caller's password.
async fn change_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ChangePasswordInput>,
) -> AppResult<ApiResponse<()>> {
    state.user_service.change_password(&user.id, input).await?;
    Ok(ApiResponse::message("Password changed"))
}

/// Log out. Tokens are stateless, so this only records the event; the
/// client discards its copy.
async fn logout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    client: ClientInfo,
) -> AppResult<ApiResponse<()>> {
    state
        .interaction_service
        .record(RecordInteraction {
            user_id: user.id.clone(),
            interaction_type: "user_logout".to_string(),
            target_type: "user".to_string(),
            target_id: Some(user.id),
            metadata: None,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        })
        .await;

    Ok(ApiResponse::message("Logged out"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile).put(update_profile))
        .route("/change-password", put(change_password))
        .route("/logout", post(logout))
}
