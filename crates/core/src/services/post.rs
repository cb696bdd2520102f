//! Post service.
//!
//! Covers the shared lifecycle of posts, events and activities:
//! creation, publication, listings and the view counter.

use chrono::Utc;
use hearth_common::{AppError, AppResult, IdGenerator};
use hearth_db::{
    entities::{post, user},
    repositories::{PostFilter, PostRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    id_gen: IdGenerator,
}

/// Input for creating content.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(min = 1))]
    pub content: String,

    #[validate(length(max = 512))]
    pub excerpt: Option<String>,

    #[validate(length(max = 512))]
    pub featured_image: Option<String>,

    #[validate(length(max = 64))]
    pub category: Option<String>,

    #[serde(default)]
    #[validate(length(max = 32))]
    pub tags: Vec<String>,

    #[serde(default = "default_post_type")]
    pub post_type: post::PostType,

    #[serde(default = "default_post_status")]
    pub status: post::PostStatus,

    // Event fields
    pub start_date: Option<chrono::DateTime<Utc>>,
    pub end_date: Option<chrono::DateTime<Utc>>,

    #[validate(length(max = 255))]
    pub location: Option<String>,

    #[validate(range(min = 1))]
    pub capacity: Option<i32>,

    pub requirements: Option<String>,

    // Activity fields
    #[validate(length(max = 64))]
    pub activity_type: Option<String>,

    #[validate(length(max = 32))]
    pub difficulty: Option<String>,

    /// Minutes
    #[validate(range(min = 1))]
    pub duration: Option<i32>,

    #[validate(range(min = 0))]
    pub points: Option<i32>,

    pub instructions: Option<String>,
    pub resources: Option<String>,
}

const fn default_post_type() -> post::PostType {
    post::PostType::Post
}

const fn default_post_status() -> post::PostStatus {
    post::PostStatus::Draft
}

/// Input for updating content. All fields optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostInput {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    #[validate(length(min = 1))]
    pub content: Option<String>,

    #[validate(length(max = 512))]
    pub excerpt: Option<String>,

    #[validate(length(max = 512))]
    pub featured_image: Option<String>,

    #[validate(length(max = 64))]
    pub category: Option<String>,

    #[validate(length(max = 32))]
    pub tags: Option<Vec<String>>,

    pub status: Option<post::PostStatus>,

    // Event fields
    pub start_date: Option<chrono::DateTime<Utc>>,
    pub end_date: Option<chrono::DateTime<Utc>>,

    #[validate(length(max = 255))]
    pub location: Option<String>,

    #[validate(range(min = 1))]
    pub capacity: Option<i32>,

    pub requirements: Option<String>,

    // Activity fields
    #[validate(length(max = 64))]
    pub activity_type: Option<String>,

    #[validate(length(max = 32))]
    pub difficulty: Option<String>,

    #[validate(range(min = 1))]
    pub duration: Option<i32>,

    #[validate(range(min = 0))]
    pub points: Option<i32>,

    pub instructions: Option<String>,
    pub resources: Option<String>,
}

/// Aggregate post counts for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct PostStats {
    pub total: u64,
    pub published: u64,
    pub drafts: u64,
    pub new_today: u64,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(post_repo: PostRepository) -> Self {
        Self {
            post_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a post, event or activity.
    pub async fn create(&self, author_id: &str, input: CreatePostInput) -> AppResult<post::Model> {
        input.validate()?;

        if input.post_type == post::PostType::Event && input.start_date.is_none() {
            return Err(AppError::BadRequest(
                "Events require a start_date".to_string(),
            ));
        }

        if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
            if end < start {
                return Err(AppError::BadRequest(
                    "end_date must not precede start_date".to_string(),
                ));
            }
        }

        let status = match input.status {
            post::PostStatus::Archived => {
                return Err(AppError::BadRequest(
                    "New content cannot be created as archived".to_string(),
                ));
            }
            s => s,
        };

        let now = Utc::now();
        let published_at: Option<sea_orm::prelude::DateTimeWithTimeZone> =
            (status == post::PostStatus::Published).then(|| now.into());

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            title: Set(input.title),
            content: Set(input.content),
            excerpt: Set(input.excerpt),
            featured_image: Set(input.featured_image),
            category: Set(input.category),
            tags: Set(serde_json::json!(input.tags)),
            post_type: Set(input.post_type),
            status: Set(status),
            start_date: Set(input.start_date.map(Into::into)),
            end_date: Set(input.end_date.map(Into::into)),
            location: Set(input.location),
            capacity: Set(input.capacity),
            requirements: Set(input.requirements),
            activity_type: Set(input.activity_type),
            difficulty: Set(input.difficulty),
            duration: Set(input.duration),
            points: Set(input.points),
            instructions: Set(input.instructions),
            resources: Set(input.resources),
            published_at: Set(published_at),
            created_at: Set(now.into()),
            ..Default::default()
        };

        self.post_repo.create(model).await
    }

    /// Fetch a single piece of content and count the view.
    ///
    /// Drafts and archived content are only visible to their author and
    /// to admins; everyone else gets a not-found. The view counter is
    /// bumped for anonymous readers and for any logged-in reader other
    /// than the author. A failed counter bump never fails the read.
    pub async fn get(&self, id: &str, viewer: Option<&user::Model>) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(id).await?;

        if !super::visible_to(&post, viewer) {
            return Err(AppError::PostNotFound(id.to_string()));
        }
        if !post.is_published() {
            return Ok(post);
        }

        let counts_view = viewer.is_none_or(|u| u.id != post.author_id);
        if counts_view {
            if let Err(e) = self.post_repo.increment_view_count(id).await {
                tracing::warn!(error = %e, post_id = %id, "Failed to increment view count");
            }
        }

        Ok(post)
    }

    /// Update content. Only the author or an admin may do this.
    ///
    /// `published_at` is stamped exactly once, on the first transition
    /// to published; later unpublish/republish cycles keep the original
    /// timestamp.
    pub async fn update(
        &self,
        id: &str,
        actor: &user::Model,
        input: UpdatePostInput,
    ) -> AppResult<post::Model> {
        input.validate()?;

        let post = self.post_repo.get_by_id(id).await?;

        if post.author_id != actor.id && !actor.is_admin() {
            return Err(AppError::Forbidden(
                "Only the author can modify this content".to_string(),
            ));
        }

        // The date window must hold after the patch is applied, not
        // just for the fields present in it.
        let start = input.start_date.map(Into::into).or(post.start_date);
        let end = input.end_date.map(Into::into).or(post.end_date);
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(AppError::BadRequest(
                    "end_date must not precede start_date".to_string(),
                ));
            }
        }

        let first_publish = input.status == Some(post::PostStatus::Published)
            && post.published_at.is_none();

        let mut active: post::ActiveModel = post.into();

        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(content) = input.content {
            active.content = Set(content);
        }
        if let Some(excerpt) = input.excerpt {
            active.excerpt = Set(Some(excerpt));
        }
        if let Some(featured_image) = input.featured_image {
            active.featured_image = Set(Some(featured_image));
        }
        if let Some(category) = input.category {
            active.category = Set(Some(category));
        }
        if let Some(tags) = input.tags {
            active.tags = Set(serde_json::json!(tags));
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(start_date) = input.start_date {
            active.start_date = Set(Some(start_date.into()));
        }
        if let Some(end_date) = input.end_date {
            active.end_date = Set(Some(end_date.into()));
        }
        if let Some(location) = input.location {
            active.location = Set(Some(location));
        }
        if let Some(capacity) = input.capacity {
            active.capacity = Set(Some(capacity));
        }
        if let Some(requirements) = input.requirements {
            active.requirements = Set(Some(requirements));
        }
        if let Some(activity_type) = input.activity_type {
            active.activity_type = Set(Some(activity_type));
        }
        if let Some(difficulty) = input.difficulty {
            active.difficulty = Set(Some(difficulty));
        }
        if let Some(duration) = input.duration {
            active.duration = Set(Some(duration));
        }
        if let Some(points) = input.points {
            active.points = Set(Some(points));
        }
        if let Some(instructions) = input.instructions {
            active.instructions = Set(Some(instructions));
        }
        if let Some(resources) = input.resources {
            active.resources = Set(Some(resources));
        }

        let now = Utc::now();
        if first_publish {
            active.published_at = Set(Some(now.into()));
        }
        active.updated_at = Set(Some(now.into()));

        self.post_repo.update(active).await
    }

    /// Archive content (soft delete). Only the author or an admin.
    pub async fn archive(&self, id: &str, actor: &user::Model) -> AppResult<()> {
        let post = self.post_repo.get_by_id(id).await?;

        if post.author_id != actor.id && !actor.is_admin() {
            return Err(AppError::Forbidden(
                "Only the author can delete this content".to_string(),
            ));
        }

        let mut active: post::ActiveModel = post.into();
        active.status = Set(post::PostStatus::Archived);
        active.updated_at = Set(Some(Utc::now().into()));

        self.post_repo.update(active).await?;
        Ok(())
    }

    /// List published content, newest publication first.
    pub async fn list_published(
        &self,
        filter: PostFilter,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<post::Model>, u64)> {
        let (limit, offset) = super::page_window(page, limit);
        self.post_repo
            .find_published_paged(&filter, limit, offset)
            .await
    }

    /// List one's own content in any status.
    pub async fn list_mine(
        &self,
        author_id: &str,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<post::Model>, u64)> {
        let (limit, offset) = super::page_window(page, limit);
        self.post_repo
            .find_by_author_paged(author_id, limit, offset)
            .await
    }

    /// Most-viewed published content.
    pub async fn popular(&self, limit: u64) -> AppResult<Vec<post::Model>> {
        self.post_repo
            .find_popular(limit.clamp(1, super::MAX_PAGE_SIZE))
            .await
    }

    /// Most recently published content.
    pub async fn recent(&self, limit: u64) -> AppResult<Vec<post::Model>> {
        self.post_repo
            .find_recent(limit.clamp(1, super::MAX_PAGE_SIZE))
            .await
    }

    /// Search published content by title and body.
    pub async fn search(
        &self,
        term: &str,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<post::Model>, u64)> {
        let term = term.trim();
        if term.is_empty() {
            return Err(AppError::BadRequest("Search term is required".to_string()));
        }

        let filter = PostFilter {
            search: Some(term.to_string()),
            ..Default::default()
        };
        let (limit, offset) = super::page_window(page, limit);
        self.post_repo
            .find_published_paged(&filter, limit, offset)
            .await
    }

    /// Aggregate post counts for the admin dashboard.
    pub async fn stats(&self) -> AppResult<PostStats> {
        let total = self.post_repo.count_all().await?;
        let published = self
            .post_repo
            .count_by_status(post::PostStatus::Published)
            .await?;
        let drafts = self
            .post_repo
            .count_by_status(post::PostStatus::Draft)
            .await?;
        let new_today = self
            .post_repo
            .count_created_since(super::interaction::start_of_today())
            .await?;

        Ok(PostStats {
            total,
            published,
            drafts,
            new_today,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: &str, role: user::Role) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user_{id}"),
            email: format!("{id}@example.com"),
            password_hash: "$argon2id$test".to_string(),
            full_name: None,
            avatar_url: None,
            role,
            status: user::Status::Active,
            email_verified: false,
            last_login: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_post(id: &str, author_id: &str, status: post::PostStatus) -> post::Model {
        post::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            title: "Title".to_string(),
            content: "Body".to_string(),
            excerpt: None,
            featured_image: None,
            category: None,
            tags: serde_json::json!([]),
            post_type: post::PostType::Post,
            status,
            start_date: None,
            end_date: None,
            location: None,
            capacity: None,
            requirements: None,
            activity_type: None,
            difficulty: None,
            duration: None,
            points: None,
            instructions: None,
            resources: None,
            view_count: 0,
            like_count: 0,
            dislike_count: 0,
            comment_count: 0,
            published_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_input(title: &str, post_type: post::PostType) -> CreatePostInput {
        CreatePostInput {
            title: title.to_string(),
            content: "Body".to_string(),
            excerpt: None,
            featured_image: None,
            category: None,
            tags: Vec::new(),
            post_type,
            status: post::PostStatus::Draft,
            start_date: None,
            end_date: None,
            location: None,
            capacity: None,
            requirements: None,
            activity_type: None,
            difficulty: None,
            duration: None,
            points: None,
            instructions: None,
            resources: None,
        }
    }

    fn update_input() -> UpdatePostInput {
        UpdatePostInput {
            title: None,
            content: None,
            excerpt: None,
            featured_image: None,
            category: None,
            tags: None,
            status: None,
            start_date: None,
            end_date: None,
            location: None,
            capacity: None,
            requirements: None,
            activity_type: None,
            difficulty: None,
            duration: None,
            points: None,
            instructions: None,
            resources: None,
        }
    }

    fn create_test_service(db: Arc<sea_orm::DatabaseConnection>) -> PostService {
        PostService::new(PostRepository::new(db))
    }

    #[tokio::test]
    async fn test_create_event_requires_start_date() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_test_service(db);

        let result = service
            .create("u1", create_input("Meetup", post::PostType::Event))
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_inverted_date_window() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_test_service(db);

        let start = Utc::now();
        let mut input = create_input("Meetup", post::PostType::Event);
        input.start_date = Some(start);
        input.end_date = Some(start - chrono::Duration::hours(1));

        let result = service.create("u1", input).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_get_draft_hidden_from_strangers() {
        let draft = create_test_post("p1", "author1", post::PostStatus::Draft);
        let stranger = create_test_user("u2", user::Role::User);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[draft]])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service.get("p1", Some(&stranger)).await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_get_draft_visible_to_author() {
        let draft = create_test_post("p1", "author1", post::PostStatus::Draft);
        let author = create_test_user("author1", user::Role::User);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[draft]])
                .into_connection(),
        );

        let service = create_test_service(db);
        let found = service.get("p1", Some(&author)).await.unwrap();

        assert_eq!(found.id, "p1");
    }

    #[tokio::test]
    async fn test_get_published_counts_anonymous_view() {
        let mut published = create_test_post("p1", "author1", post::PostStatus::Published);
        published.published_at = Some(Utc::now().into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[published]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = create_test_service(db.clone());
        service.get("p1", None).await.unwrap();

        // fetch + counter update
        drop(service);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_get_published_author_view_not_counted() {
        let mut published = create_test_post("p1", "author1", post::PostStatus::Published);
        published.published_at = Some(Utc::now().into());
        let author = create_test_user("author1", user::Role::User);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[published]])
                .into_connection(),
        );

        let service = create_test_service(db.clone());
        service.get("p1", Some(&author)).await.unwrap();

        // fetch only, no counter update
        drop(service);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_update_by_stranger_forbidden() {
        let published = create_test_post("p1", "author1", post::PostStatus::Published);
        let stranger = create_test_user("u2", user::Role::User);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[published]])
                .into_connection(),
        );

        let service = create_test_service(db);
        let mut input = update_input();
        input.title = Some("Hijacked".to_string());

        let result = service.update("p1", &stranger, input).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_end_before_existing_start() {
        let start = Utc::now();
        let mut event = create_test_post("p1", "author1", post::PostStatus::Published);
        event.post_type = post::PostType::Event;
        event.start_date = Some(start.into());
        let author = create_test_user("author1", user::Role::User);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[event]])
                .into_connection(),
        );

        let service = create_test_service(db);
        let mut input = update_input();
        input.end_date = Some(start - chrono::Duration::hours(2));

        let result = service.update("p1", &author, input).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_start_after_existing_end() {
        let start = Utc::now();
        let mut event = create_test_post("p1", "author1", post::PostStatus::Published);
        event.post_type = post::PostType::Event;
        event.start_date = Some(start.into());
        event.end_date = Some((start + chrono::Duration::hours(2)).into());
        let author = create_test_user("author1", user::Role::User);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[event]])
                .into_connection(),
        );

        let service = create_test_service(db);
        let mut input = update_input();
        input.start_date = Some(start + chrono::Duration::hours(3));

        let result = service.update("p1", &author, input).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_first_publish_stamps_published_at() {
        let draft = create_test_post("p1", "author1", post::PostStatus::Draft);
        let author = create_test_user("author1", user::Role::User);

        let mut updated = draft.clone();
        updated.status = post::PostStatus::Published;
        updated.published_at = Some(Utc::now().into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[draft]])
                .append_query_results([[updated]])
                .into_connection(),
        );

        let service = create_test_service(db);
        let mut input = update_input();
        input.status = Some(post::PostStatus::Published);

        let result = service.update("p1", &author, input).await.unwrap();

        assert!(result.published_at.is_some());
    }

    #[tokio::test]
    async fn test_search_rejects_blank_term() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_test_service(db);

        let result = service.search("   ", 1, 20).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
