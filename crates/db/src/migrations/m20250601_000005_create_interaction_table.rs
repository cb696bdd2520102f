//! Create interaction table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Interaction::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Interaction::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Interaction::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Interaction::InteractionType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Interaction::TargetType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Interaction::TargetId).string_len(32))
                    .col(ColumnDef::new(Interaction::Metadata).json())
                    .col(ColumnDef::new(Interaction::IpAddress).string_len(64))
                    .col(ColumnDef::new(Interaction::UserAgent).string_len(512))
                    .col(
                        ColumnDef::new(Interaction::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_interaction_user")
                            .from(Interaction::Table, Interaction::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, created_at) - the per-user history query
        manager
            .create_index(
                Index::create()
                    .name("idx_interaction_user_created_at")
                    .table(Interaction::Table)
                    .col(Interaction::UserId)
                    .col(Interaction::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: interaction_type (for filtered listings and stats)
        manager
            .create_index(
                Index::create()
                    .name("idx_interaction_type")
                    .table(Interaction::Table)
                    .col(Interaction::InteractionType)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for date-range filters)
        manager
            .create_index(
                Index::create()
                    .name("idx_interaction_created_at")
                    .table(Interaction::Table)
                    .col(Interaction::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Interaction::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Interaction {
    Table,
    Id,
    UserId,
    InteractionType,
    TargetType,
    TargetId,
    Metadata,
    IpAddress,
    UserAgent,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
