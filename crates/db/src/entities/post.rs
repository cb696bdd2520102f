//! Post entity.
//!
//! A post is a piece of published content. Events and activities are
//! posts with extra type-specific fields, discriminated by [`PostType`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Content subtype discriminator.
///
/// Also identifies the target of reactions and comments, which can
/// attach to any of the three content kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    #[sea_orm(string_value = "post")]
    Post,
    #[sea_orm(string_value = "event")]
    Event,
    #[sea_orm(string_value = "activity")]
    Activity,
}

/// Publication lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "published")]
    Published,
    /// Soft-deleted. Excluded from public listings.
    #[sea_orm(string_value = "archived")]
    Archived,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub author_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Short summary shown in listings
    #[sea_orm(nullable)]
    pub excerpt: Option<String>,

    #[sea_orm(nullable)]
    pub featured_image: Option<String>,

    #[sea_orm(nullable)]
    pub category: Option<String>,

    /// JSON array of tag strings
    pub tags: Json,

    pub post_type: PostType,

    pub status: PostStatus,

    // Event fields (post_type = event)
    #[sea_orm(nullable)]
    pub start_date: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub end_date: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub location: Option<String>,

    #[sea_orm(nullable)]
    pub capacity: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub requirements: Option<String>,

    // Activity fields (post_type = activity)
    #[sea_orm(nullable)]
    pub activity_type: Option<String>,

    #[sea_orm(nullable)]
    pub difficulty: Option<String>,

    /// Duration in minutes
    #[sea_orm(nullable)]
    pub duration: Option<i32>,

    #[sea_orm(nullable)]
    pub points: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub instructions: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub resources: Option<String>,

    // Denormalized counters, adjusted atomically in SQL
    #[sea_orm(default_value = 0)]
    pub view_count: i32,

    #[sea_orm(default_value = 0)]
    pub like_count: i32,

    #[sea_orm(default_value = 0)]
    pub dislike_count: i32,

    #[sea_orm(default_value = 0)]
    pub comment_count: i32,

    /// Set once, on the first transition to published
    #[sea_orm(nullable)]
    pub published_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the post is publicly visible.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Whether the post has been soft-deleted.
    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.status == PostStatus::Archived
    }
}
