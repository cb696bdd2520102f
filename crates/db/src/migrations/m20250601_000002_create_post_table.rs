//! Create post table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Post::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Post::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(Post::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Post::Content).text().not_null())
                    .col(ColumnDef::new(Post::Excerpt).string_len(512))
                    .col(ColumnDef::new(Post::FeaturedImage).string_len(512))
                    .col(ColumnDef::new(Post::Category).string_len(64))
                    .col(
                        ColumnDef::new(Post::Tags)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Post::PostType)
                            .string_len(16)
                            .not_null()
                            .default("post"),
                    )
                    .col(
                        ColumnDef::new(Post::Status)
                            .string_len(16)
                            .not_null()
                            .default("draft"),
                    )
                    // Event fields
                    .col(ColumnDef::new(Post::StartDate).timestamp_with_time_zone())
                    .col(ColumnDef::new(Post::EndDate).timestamp_with_time_zone())
                    .col(ColumnDef::new(Post::Location).string_len(255))
                    .col(ColumnDef::new(Post::Capacity).integer())
                    .col(ColumnDef::new(Post::Requirements).text())
                    // Activity fields
                    .col(ColumnDef::new(Post::ActivityType).string_len(64))
                    .col(ColumnDef::new(Post::Difficulty).string_len(32))
                    .col(ColumnDef::new(Post::Duration).integer())
                    .col(ColumnDef::new(Post::Points).integer())
                    .col(ColumnDef::new(Post::Instructions).text())
                    .col(ColumnDef::new(Post::Resources).text())
                    .col(
                        ColumnDef::new(Post::ViewCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Post::LikeCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Post::DislikeCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Post::CommentCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Post::PublishedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Post::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Post::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_author")
                            .from(Post::Table, Post::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (status, published_at) - the public listing query
        manager
            .create_index(
                Index::create()
                    .name("idx_post_status_published_at")
                    .table(Post::Table)
                    .col(Post::Status)
                    .col(Post::PublishedAt)
                    .to_owned(),
            )
            .await?;

        // Index: author_id (for "my posts")
        manager
            .create_index(
                Index::create()
                    .name("idx_post_author_id")
                    .table(Post::Table)
                    .col(Post::AuthorId)
                    .to_owned(),
            )
            .await?;

        // Index: view_count (for popular listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_post_view_count")
                    .table(Post::Table)
                    .col(Post::ViewCount)
                    .to_owned(),
            )
            .await?;

        // Index: category
        manager
            .create_index(
                Index::create()
                    .name("idx_post_category")
                    .table(Post::Table)
                    .col(Post::Category)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
    AuthorId,
    Title,
    Content,
    Excerpt,
    FeaturedImage,
    Category,
    Tags,
    PostType,
    Status,
    StartDate,
    EndDate,
    Location,
    Capacity,
    Requirements,
    ActivityType,
    Difficulty,
    Duration,
    Points,
    Instructions,
    Resources,
    ViewCount,
    LikeCount,
    DislikeCount,
    CommentCount,
    PublishedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
