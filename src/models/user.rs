use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub level: String,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing)]
    #[sea_orm(unique)]
    pub reset_pwd_hash: Option<String>,
    #[serde(skip_serializing)]
    pub reset_pwd_time: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::topic::Entity")]
    Topics,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,
}

impl Related<super::topic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topics.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn level_label(&self) -> &str {
        Level::label_for(&self.level)
    }
}

/// Membership rank stored in `users.level` as its code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Newbie,
    Member,
    Veteran,
    Moderator,
    Admin,
}

/// Code and display label of every level, lowest rank first.
pub const LEVELS: &[(Level, &str, &str)] = &[
    (Level::Newbie, "newbie", "Newbie"),
    (Level::Member, "member", "Member"),
    (Level::Veteran, "veteran", "Veteran"),
    (Level::Moderator, "moderator", "Moderator"),
    (Level::Admin, "admin", "Administrator"),
];

impl Level {
    pub fn code(self) -> &'static str {
        LEVELS
            .iter()
            .find(|(level, _, _)| *level == self)
            .map(|(_, code, _)| *code)
            .unwrap_or("newbie")
    }

    pub fn from_code(code: &str) -> Option<Self> {
        LEVELS
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(level, _, _)| *level)
    }

    /// Label shown next to an author; unknown codes are shown verbatim.
    pub fn label_for(code: &str) -> &str {
        LEVELS
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(_, _, label)| *label)
            .unwrap_or(code)
    }
}
