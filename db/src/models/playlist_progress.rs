use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Per-student, per-playlist progress record.
///
/// Unique on (playlist_id, student_id); created lazily on the first
/// completion, so an absent row means "no progress". The completed set is
/// stored as a JSON array of item IDs and only ever grows. It is the single
/// source of truth for access gating and completion badges.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "playlist_progress")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub playlist_id: i64,
    pub student_id: i64,
    /// The item the student is currently on, if known.
    pub current_item_id: Option<i64>,
    /// JSON array of completed item IDs, duplicate-free.
    pub completed_item_ids: Json,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::playlist::Entity",
        from = "Column::PlaylistId",
        to = "super::playlist::Column::Id"
    )]
    Playlist,
}

impl Related<super::playlist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Playlist.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parses the stored JSON array into item IDs.
    ///
    /// Non-numeric entries are skipped rather than treated as an error, so a
    /// damaged row degrades to "fewer completions" instead of a failure.
    pub fn completed_ids(&self) -> Vec<i64> {
        match self.completed_item_ids.as_array() {
            Some(values) => values.iter().filter_map(|v| v.as_i64()).collect(),
            None => Vec::new(),
        }
    }
}
