//! Content endpoints: posts, events and activities.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use hearth_common::AppResult;
use hearth_core::services::{CreatePostInput, RecordInteraction, UpdatePostInput};
use hearth_db::{entities::post, repositories::PostFilter};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, ClientInfo, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, Paginated},
};

/// Public view of a content item.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub category: Option<String>,
    pub tags: serde_json::Value,
    pub post_type: post::PostType,
    pub status: post::PostStatus,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub requirements: Option<String>,
    pub activity_type: Option<String>,
    pub difficulty: Option<String>,
    pub duration: Option<i32>,
    pub points: Option<i32>,
    pub instructions: Option<String>,
    pub resources: Option<String>,
    pub view_count: i32,
    pub like_count: i32,
    pub dislike_count: i32,
    pub comment_count: i32,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<post::Model> for PostResponse {
    fn from(p: post::Model) -> Self {
        Self {
            id: p.id,
            author_id: p.author_id,
            title: p.title,
            content: p.content,
            excerpt: p.excerpt,
            featured_image: p.featured_image,
            category: p.category,
            tags: p.tags,
            post_type: p.post_type,
            status: p.status,
            start_date: p.start_date.map(|d| d.to_rfc3339()),
            end_date: p.end_date.map(|d| d.to_rfc3339()),
            location: p.location,
            capacity: p.capacity,
            requirements: p.requirements,
            activity_type: p.activity_type,
            difficulty: p.difficulty,
            duration: p.duration,
            points: p.points,
            instructions: p.instructions,
            resources: p.resources,
            view_count: p.view_count,
            like_count: p.like_count,
            dislike_count: p.dislike_count,
            comment_count: p.comment_count,
            published_at: p.published_at.map(|d| d.to_rfc3339()),
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.map(|d| d.to_rfc3339()),
        }
    }
}

fn to_page(items: Vec<post::Model>, page: u64, limit: u64, total: u64) -> Paginated<PostResponse> {
    Paginated::new(items.into_iter().map(Into::into).collect(), page, limit, total)
}

/// Listing query: pagination plus the published-content filters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsRequest {
    #[serde(default = "default_page")]
    pub page: u64,

    #[serde(default = "default_limit")]
    pub limit: u64,

    pub category: Option<String>,

    #[serde(rename = "type")]
    pub post_type: Option<post::PostType>,

    pub author_id: Option<String>,

    pub search: Option<String>,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: u64,

    #[serde(default = "default_limit")]
    pub limit: u64,
}

#[derive(Debug, Deserialize)]
pub struct LimitRequest {
    #[serde(default = "default_featured_limit")]
    pub limit: u64,
}

const fn default_featured_limit() -> u64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub q: String,

    #[serde(default = "default_page")]
    pub page: u64,

    #[serde(default = "default_limit")]
    pub limit: u64,
}

/// List published content, newest publication first.
async fn list(
    State(state): State<AppState>,
    Query(req): Query<ListPostsRequest>,
) -> AppResult<ApiResponse<Paginated<PostResponse>>> {
    let filter = PostFilter {
        post_type: req.post_type,
        category: req.category,
        author_id: req.author_id,
        search: req.search,
    };

    let (posts, total) = state
        .post_service
        .list_published(filter, req.page, req.limit)
        .await?;

    Ok(ApiResponse::ok(to_page(posts, req.page, req.limit, total)))
}

/// Most-viewed published content.
async fn popular(
    State(state): State<AppState>,
    Query(req): Query<LimitRequest>,
) -> AppResult<ApiResponse<Vec<PostResponse>>> {
    let posts = state.post_service.popular(req.limit).await?;
    Ok(ApiResponse::ok(posts.into_iter().map(Into::into).collect()))
}

/// Most recently published content.
async fn recent(
    State(state): State<AppState>,
    Query(req): Query<LimitRequest>,
) -> AppResult<ApiResponse<Vec<PostResponse>>> {
    let posts = state.post_service.recent(req.limit).await?;
    Ok(ApiResponse::ok(posts.into_iter().map(Into::into).collect()))
}

/// Full-text-ish search over title and body.
async fn search(
    State(state): State<AppState>,
    Query(req): Query<SearchRequest>,
) -> AppResult<ApiResponse<Paginated<PostResponse>>> {
    let (posts, total) = state
        .post_service
        .search(&req.q, req.page, req.limit)
        .await?;

    Ok(ApiResponse::ok(to_page(posts, req.page, req.limit, total)))
}

/// Published content in one category.
async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(req): Query<PageRequest>,
) -> AppResult<ApiResponse<Paginated<PostResponse>>> {
    let filter = PostFilter {
        category: Some(category),
        ..Default::default()
    };

    let (posts, total) = state
        .post_service
        .list_published(filter, req.page, req.limit)
        .await?;

    Ok(ApiResponse::ok(to_page(posts, req.page, req.limit, total)))
}

/// The caller's own content, drafts and archived included.
async fn mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(req): Query<PageRequest>,
) -> AppResult<ApiResponse<Paginated<PostResponse>>> {
    let (posts, total) = state
        .post_service
        .list_mine(&user.id, req.page, req.limit)
        .await?;

    Ok(ApiResponse::ok(to_page(posts, req.page, req.limit, total)))
}

/// Fetch one content item, counting the view.
async fn get_one(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    client: ClientInfo,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.get(&id, viewer.as_ref()).await?;

    if let Some(viewer) = viewer
        && viewer.id != post.author_id
    {
        state
            .interaction_service
            .record(RecordInteraction {
                user_id: viewer.id,
                interaction_type: "post_view".to_string(),
                target_type: "post".to_string(),
                target_id: Some(post.id.clone()),
                metadata: None,
                ip_address: client.ip_address,
                user_agent: client.user_agent,
            })
            .await;
    }

    Ok(ApiResponse::ok(post.into()))
}

/// Create a post, event or activity.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    client: ClientInfo,
    Json(input): Json<CreatePostInput>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.create(&user.id, input).await?;

    state
        .interaction_service
        .record(RecordInteraction {
            user_id: user.id,
            interaction_type: "post_create".to_string(),
            target_type: "post".to_string(),
            target_id: Some(post.id.clone()),
            metadata: Some(serde_json::json!({ "type": post.post_type })),
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        })
        .await;

    Ok(ApiResponse::created(post.into()).with_message("Content created"))
}

/// Update content (author or admin).
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdatePostInput>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.update(&id, &user, input).await?;
    Ok(ApiResponse::ok(post.into()).with_message("Content updated"))
}

/// Archive content (author or admin). Soft delete.
async fn archive(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.post_service.archive(&id, &user).await?;
    Ok(ApiResponse::message("Content archived"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/popular", get(popular))
        .route("/recent", get(recent))
        .route("/search", get(search))
        .route("/mine", get(mine))
        .route("/category/{category}", get(by_category))
        .route("/{id}", get(get_one).put(update).delete(archive))
}
