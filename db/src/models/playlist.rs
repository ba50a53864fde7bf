use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Governs the unlock order of a playlist's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize)]
#[serde(rename_all = "snake_case")]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "access_mode_enum"
)]
pub enum AccessMode {
    /// Every item is always unlocked.
    #[sea_orm(string_value = "any")]
    Any,
    /// Items unlock one at a time as the predecessor is completed.
    #[sea_orm(string_value = "sequential")]
    Sequential,
}

impl Default for AccessMode {
    fn default() -> Self {
        Self::Any
    }
}

impl std::fmt::Display for AccessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode_str = match self {
            AccessMode::Any => "any",
            AccessMode::Sequential => "sequential",
        };
        write!(f, "{}", mode_str)
    }
}

/// An ordered container of tests or courses, never both.
///
/// The kind of a playlist is not stored: it is inferred from which of the
/// two junction tables (`playlist_tests`, `playlist_courses`) holds rows.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "playlists")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub access_mode: AccessMode,
    /// ID of the teacher who owns the playlist. An owner viewing their own
    /// playlist bypasses access gating.
    pub teacher_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::playlist_test::Entity")]
    PlaylistTest,

    #[sea_orm(has_many = "super::playlist_course::Entity")]
    PlaylistCourse,

    #[sea_orm(has_many = "super::playlist_progress::Entity")]
    PlaylistProgress,
}

impl Related<super::playlist_test::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlaylistTest.def()
    }
}

impl Related<super::playlist_course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlaylistCourse.def()
    }
}

impl Related<super::playlist_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlaylistProgress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
