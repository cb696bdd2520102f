//! Comment endpoints, nested under a content item.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, post},
};
use hearth_common::AppResult;
use hearth_core::services::{CommentView, CreateCommentInput, RecordInteraction};
use hearth_db::entities::{comment, post};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, ClientInfo, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, Paginated},
};

/// A comment with its author and nested replies.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub content_id: String,
    pub content_type: post::PostType,
    pub user_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub status: comment::CommentStatus,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub author: Option<CommentAuthorResponse>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<CommentResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAuthorResponse {
    pub id: String,
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub email: String,
}

impl From<CommentView> for CommentResponse {
    fn from(view: CommentView) -> Self {
        let c = view.comment;
        Self {
            id: c.id,
            content_id: c.content_id,
            content_type: c.content_type,
            user_id: c.user_id,
            parent_id: c.parent_id,
            content: c.content,
            status: c.status,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.map(|d| d.to_rfc3339()),
            author: view.author.map(|a| CommentAuthorResponse {
                id: a.id,
                username: a.username,
                full_name: a.full_name,
                avatar_url: a.avatar_url,
                email: a.email,
            }),
            replies: view.replies.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<comment::Model> for CommentResponse {
    fn from(c: comment::Model) -> Self {
        Self {
            id: c.id,
            content_id: c.content_id,
            content_type: c.content_type,
            user_id: c.user_id,
            parent_id: c.parent_id,
            content: c.content,
            status: c.status,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.map(|d| d.to_rfc3339()),
            author: None,
            replies: vec![],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListCommentsRequest {
    #[serde(default = "default_page")]
    pub page: u64,

    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    20
}

/// Comment on a content item, or reply to a top-level comment.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    client: ClientInfo,
    Path(id): Path<String>,
    Json(input): Json<CreateCommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.create(&user, &id, input).await?;

    state
        .interaction_service
        .record(RecordInteraction {
            user_id: user.id,
            interaction_type: "comment_create".to_string(),
            target_type: "comment".to_string(),
            target_id: Some(comment.id.clone()),
            metadata: Some(serde_json::json!({ "contentId": comment.content_id.clone() })),
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        })
        .await;

    Ok(ApiResponse::created(comment.into()).with_message("Comment added"))
}

/// A content item's comment thread: top-level comments newest first,
/// replies nested oldest first. Follows the content's own visibility.
async fn list(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(req): Query<ListCommentsRequest>,
) -> AppResult<ApiResponse<Paginated<CommentResponse>>> {
    let (thread, total) = state
        .comment_service
        .list(&id, viewer.as_ref(), req.page, req.limit)
        .await?;

    Ok(ApiResponse::ok(Paginated::new(
        thread.into_iter().map(Into::into).collect(),
        req.page,
        req.limit,
        total,
    )))
}

/// Delete a comment and its replies. Author only.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((_id, comment_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<()>> {
    state.comment_service.delete(&comment_id, &user).await?;
    Ok(ApiResponse::message("Comment deleted"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/comments", post(create).get(list))
        .route("/{id}/comments/{comment_id}", delete(remove))
}
