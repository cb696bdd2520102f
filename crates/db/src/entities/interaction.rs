//! Interaction entity.
//!
//! Append-only log of user actions: views, reactions, comments, logins
//! and admin operations. Writes are best-effort; a failed log entry
//! never fails the action that produced it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "interaction")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    /// Action name, e.g. `post_view`, `reaction_added`, `user_login`
    pub interaction_type: String,

    /// Entity kind the action targeted, e.g. `post`, `comment`, `user`
    pub target_type: String,

    #[sea_orm(nullable)]
    pub target_id: Option<String>,

    /// Free-form context captured at log time
    #[sea_orm(column_type = "Json", nullable)]
    pub metadata: Option<Json>,

    #[sea_orm(nullable)]
    pub ip_address: Option<String>,

    #[sea_orm(nullable)]
    pub user_agent: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
