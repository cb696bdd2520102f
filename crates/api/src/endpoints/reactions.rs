//! Reaction endpoints, nested under a content item.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use hearth_common::AppResult;
use hearth_core::services::{ReactionCounts, ReactionOutcome, ReactionResult, RecordInteraction};
use hearth_db::entities::reaction;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, ClientInfo, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Toggle request body.
#[derive(Debug, Deserialize)]
pub struct ReactRequest {
    #[serde(rename = "type")]
    pub kind: reaction::ReactionKind,
}

/// Toggle result: what happened, the caller's state afterwards and the
/// adjusted counters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionResponse {
    pub outcome: ReactionOutcome,
    #[serde(rename = "type")]
    pub kind: Option<reaction::ReactionKind>,
    pub like_count: i32,
    pub dislike_count: i32,
}

impl From<ReactionResult> for ReactionResponse {
    fn from(r: ReactionResult) -> Self {
        Self {
            outcome: r.outcome,
            kind: r.kind,
            like_count: r.like_count,
            dislike_count: r.dislike_count,
        }
    }
}

/// Public counters, plus the caller's own reaction when authenticated.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionCountsResponse {
    pub like_count: i32,
    pub dislike_count: i32,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<reaction::ReactionKind>,
}

impl From<ReactionCounts> for ReactionCountsResponse {
    fn from(c: ReactionCounts) -> Self {
        Self {
            like_count: c.like_count,
            dislike_count: c.dislike_count,
            kind: None,
        }
    }
}

/// Toggle a like or dislike on a content item.
///
/// Same kind again removes the reaction; the other kind flips it.
async fn react(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    client: ClientInfo,
    Path(id): Path<String>,
    Json(req): Json<ReactRequest>,
) -> AppResult<ApiResponse<ReactionResponse>> {
    let result = state.reaction_service.react(&user, &id, req.kind).await?;

    state
        .interaction_service
        .record(RecordInteraction {
            user_id: user.id,
            interaction_type: "post_react".to_string(),
            target_type: "post".to_string(),
            target_id: Some(id),
            metadata: Some(serde_json::json!({
                "type": req.kind,
                "outcome": result.outcome,
            })),
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        })
        .await;

    Ok(ApiResponse::ok(result.into()))
}

/// Public like/dislike counters for a content item. Logged-in callers
/// also get the reaction they currently hold.
async fn counts(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ReactionCountsResponse>> {
    let mut response: ReactionCountsResponse = state
        .reaction_service
        .counts(&id, viewer.as_ref())
        .await?
        .into();

    if let Some(viewer) = viewer {
        response.kind = state.reaction_service.current(&viewer.id, &id).await?;
    }

    Ok(ApiResponse::ok(response))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/react", post(react))
        .route("/{id}/reactions", get(counts))
}
