//! Persistence gateway for the progress and scoring core.
//!
//! Every query/command the core issues against the relational store goes
//! through [`PersistenceGateway`]. The services own no SQL of their own;
//! they depend on these operations only.

use crate::models::{
    playlist, playlist_course, playlist_progress, playlist_test, question, rating, test, variant,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

#[derive(Clone)]
pub struct PersistenceGateway {
    db: DatabaseConnection,
}

impl PersistenceGateway {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Fetches a test by ID.
    pub async fn get_test(&self, test_id: i64) -> Result<test::Model, GatewayError> {
        test::Entity::find_by_id(test_id)
            .one(&self.db)
            .await?
            .ok_or(GatewayError::NotFound {
                entity: "test",
                id: test_id,
            })
    }

    /// Fetches a test's questions ordered by `order_index`.
    pub async fn get_questions(&self, test_id: i64) -> Result<Vec<question::Model>, GatewayError> {
        let questions = question::Entity::find()
            .filter(question::Column::TestId.eq(test_id))
            .order_by_asc(question::Column::OrderIndex)
            .all(&self.db)
            .await?;
        Ok(questions)
    }

    /// Fetches all variants of the given questions.
    ///
    /// Rows come back ordered by question then `order_index`; grouping per
    /// question is up to the caller.
    pub async fn get_variants(
        &self,
        question_ids: &[i64],
    ) -> Result<Vec<variant::Model>, GatewayError> {
        if question_ids.is_empty() {
            return Ok(Vec::new());
        }
        let variants = variant::Entity::find()
            .filter(variant::Column::QuestionId.is_in(question_ids.to_vec()))
            .order_by_asc(variant::Column::QuestionId)
            .order_by_asc(variant::Column::OrderIndex)
            .all(&self.db)
            .await?;
        Ok(variants)
    }

    /// Fetches a playlist by ID.
    pub async fn get_playlist(&self, playlist_id: i64) -> Result<playlist::Model, GatewayError> {
        playlist::Entity::find_by_id(playlist_id)
            .one(&self.db)
            .await?
            .ok_or(GatewayError::NotFound {
                entity: "playlist",
                id: playlist_id,
            })
    }

    /// Fetches a playlist's test items ordered by `order_index`.
    pub async fn get_playlist_test_items(
        &self,
        playlist_id: i64,
    ) -> Result<Vec<playlist_test::Model>, GatewayError> {
        let items = playlist_test::Entity::find()
            .filter(playlist_test::Column::PlaylistId.eq(playlist_id))
            .order_by_asc(playlist_test::Column::OrderIndex)
            .all(&self.db)
            .await?;
        Ok(items)
    }

    /// Fetches a playlist's course items ordered by `order_index`.
    pub async fn get_playlist_course_items(
        &self,
        playlist_id: i64,
    ) -> Result<Vec<playlist_course::Model>, GatewayError> {
        let items = playlist_course::Entity::find()
            .filter(playlist_course::Column::PlaylistId.eq(playlist_id))
            .order_by_asc(playlist_course::Column::OrderIndex)
            .all(&self.db)
            .await?;
        Ok(items)
    }

    /// Fetches the progress row for a student in a playlist, if one exists.
    ///
    /// An absent row is not an error: it means the student has no recorded
    /// progress yet.
    pub async fn get_progress(
        &self,
        playlist_id: i64,
        student_id: i64,
    ) -> Result<Option<playlist_progress::Model>, GatewayError> {
        let progress = playlist_progress::Entity::find()
            .filter(playlist_progress::Column::PlaylistId.eq(playlist_id))
            .filter(playlist_progress::Column::StudentId.eq(student_id))
            .one(&self.db)
            .await?;
        Ok(progress)
    }

    /// Writes the full progress row for a student in a playlist, inserting
    /// it if none exists yet.
    pub async fn upsert_progress(
        &self,
        playlist_id: i64,
        student_id: i64,
        completed_item_ids: &[i64],
        current_item_id: Option<i64>,
    ) -> Result<playlist_progress::Model, GatewayError> {
        let ids_json = serde_json::Value::from(completed_item_ids.to_vec());
        let now = Utc::now();

        match self.get_progress(playlist_id, student_id).await? {
            Some(existing) => {
                let mut active: playlist_progress::ActiveModel = existing.into();
                active.completed_item_ids = Set(ids_json);
                active.current_item_id = Set(current_item_id);
                active.updated_at = Set(now);
                Ok(active.update(&self.db).await?)
            }
            None => {
                let active = playlist_progress::ActiveModel {
                    playlist_id: Set(playlist_id),
                    student_id: Set(student_id),
                    current_item_id: Set(current_item_id),
                    completed_item_ids: Set(ids_json),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                Ok(active.insert(&self.db).await?)
            }
        }
    }

    /// Inserts a 1-5 rating of a test, with an optional comment.
    pub async fn insert_rating(
        &self,
        test_id: i64,
        user_id: i64,
        rating: i64,
        comment: Option<String>,
    ) -> Result<rating::Model, GatewayError> {
        if !(1..=5).contains(&rating) {
            return Err(GatewayError::InvalidData(format!(
                "rating must be between 1 and 5, got {}",
                rating
            )));
        }
        let active = rating::ActiveModel {
            test_id: Set(test_id),
            user_id: Set(user_id),
            rating: Set(rating),
            comment: Set(comment),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        Ok(active.insert(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::playlist::AccessMode;
    use crate::test_utils::{
        link_course, link_test, seed_course, seed_playlist, seed_question, seed_test, seed_variant,
        setup_test_db,
    };

    #[tokio::test]
    async fn test_get_test_not_found() {
        let db = setup_test_db().await;
        let gateway = PersistenceGateway::new(db);

        let err = gateway.get_test(999).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::NotFound {
                entity: "test",
                id: 999
            }
        ));
    }

    #[tokio::test]
    async fn test_questions_come_back_in_order() {
        let db = setup_test_db().await;
        let gateway = PersistenceGateway::new(db.clone());

        let test = seed_test(&db, "Ordering", 5, 1).await;
        // Inserted out of order on purpose.
        seed_question(&db, test.id, "third", 2).await;
        seed_question(&db, test.id, "first", 0).await;
        seed_question(&db, test.id, "second", 1).await;

        let questions = gateway.get_questions(test.id).await.unwrap();
        let texts: Vec<&str> = questions.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_variants_ordered_within_question() {
        let db = setup_test_db().await;
        let gateway = PersistenceGateway::new(db.clone());

        let test = seed_test(&db, "Variants", 5, 1).await;
        let q = seed_question(&db, test.id, "pick one", 0).await;
        seed_variant(&db, q.id, "b", false, 1).await;
        seed_variant(&db, q.id, "a", true, 0).await;
        seed_variant(&db, q.id, "c", false, 2).await;

        let variants = gateway.get_variants(&[q.id]).await.unwrap();
        let texts: Vec<&str> = variants.iter().map(|v| v.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_get_variants_with_no_questions_is_empty() {
        let db = setup_test_db().await;
        let gateway = PersistenceGateway::new(db);
        assert!(gateway.get_variants(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_playlist_junctions_are_ordered_and_disjoint() {
        let db = setup_test_db().await;
        let gateway = PersistenceGateway::new(db.clone());

        let playlist = seed_playlist(&db, "Course path", AccessMode::Sequential, 1).await;
        let course_a = seed_course(&db, "Intro", 1).await;
        let course_b = seed_course(&db, "Advanced", 1).await;
        link_course(&db, playlist.id, course_b.id, 1).await;
        link_course(&db, playlist.id, course_a.id, 0).await;

        let tests = gateway.get_playlist_test_items(playlist.id).await.unwrap();
        assert!(tests.is_empty());

        let courses = gateway
            .get_playlist_course_items(playlist.id)
            .await
            .unwrap();
        let ids: Vec<i64> = courses.iter().map(|c| c.course_id).collect();
        assert_eq!(ids, vec![course_a.id, course_b.id]);
    }

    #[tokio::test]
    async fn test_upsert_progress_inserts_then_updates() {
        let db = setup_test_db().await;
        let gateway = PersistenceGateway::new(db.clone());

        let playlist = seed_playlist(&db, "Path", AccessMode::Sequential, 1).await;
        let test = seed_test(&db, "T", 5, 1).await;
        link_test(&db, playlist.id, test.id, 0).await;

        assert!(gateway.get_progress(playlist.id, 7).await.unwrap().is_none());

        let first = gateway
            .upsert_progress(playlist.id, 7, &[test.id], Some(test.id))
            .await
            .unwrap();
        assert_eq!(first.completed_ids(), vec![test.id]);
        assert_eq!(first.current_item_id, Some(test.id));

        let second = gateway
            .upsert_progress(playlist.id, 7, &[test.id, 42], Some(42))
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.completed_ids(), vec![test.id, 42]);

        let read_back = gateway.get_progress(playlist.id, 7).await.unwrap().unwrap();
        assert_eq!(read_back.completed_ids(), vec![test.id, 42]);
    }

    #[tokio::test]
    async fn test_insert_rating_validates_range() {
        let db = setup_test_db().await;
        let gateway = PersistenceGateway::new(db.clone());

        let test = seed_test(&db, "Rated", 5, 1).await;

        let rating = gateway
            .insert_rating(test.id, 7, 4, Some("solid".into()))
            .await
            .unwrap();
        assert_eq!(rating.rating, 4);

        let err = gateway.insert_rating(test.id, 7, 0, None).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidData(_)));
        let err = gateway.insert_rating(test.id, 7, 6, None).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidData(_)));
    }
}
