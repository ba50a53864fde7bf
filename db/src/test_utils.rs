//! Shared helpers for tests that need a migrated database and seed rows.

use crate::models::{course, playlist, playlist_course, playlist_test, question, test, variant};
use crate::models::playlist::AccessMode;
use chrono::Utc;
use migration::Migrator;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;

pub async fn setup_test_db() -> DatabaseConnection {
    // Session tests run under `#[tokio::test(start_paused = true)]`. On that
    // paused clock Tokio auto-advances virtual time whenever the runtime goes
    // idle, which trips sqlx's pool-acquire timeout before the in-memory SQLite
    // worker thread (a separate OS thread) finishes connecting — surfacing as
    // `PoolTimedOut`. Keeping a perpetually-ready task scheduled while we connect
    // stops the runtime from idling, so the clock never jumps past the real-time
    // connect/migrate. The connection opened here stays warm in the pool, so the
    // test's later queries reuse it without connecting again on the paused clock.
    let keepalive = tokio::spawn(async {
        loop {
            tokio::task::yield_now().await;
        }
    });

    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory db");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    keepalive.abort();

    db
}

pub async fn seed_test(
    db: &DatabaseConnection,
    title: &str,
    time_limit_minutes: i64,
    teacher_id: i64,
) -> test::Model {
    let now = Utc::now();
    test::ActiveModel {
        title: Set(title.to_string()),
        description: Set(None),
        time_limit_minutes: Set(time_limit_minutes),
        teacher_id: Set(teacher_id),
        source_document: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert test")
}

pub async fn seed_question(
    db: &DatabaseConnection,
    test_id: i64,
    text: &str,
    order_index: i64,
) -> question::Model {
    question::ActiveModel {
        test_id: Set(test_id),
        text: Set(text.to_string()),
        order_index: Set(order_index),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert question")
}

pub async fn seed_variant(
    db: &DatabaseConnection,
    question_id: i64,
    text: &str,
    is_correct: bool,
    order_index: i64,
) -> variant::Model {
    variant::ActiveModel {
        question_id: Set(question_id),
        text: Set(text.to_string()),
        is_correct: Set(is_correct),
        order_index: Set(order_index),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert variant")
}

pub async fn seed_course(db: &DatabaseConnection, title: &str, teacher_id: i64) -> course::Model {
    let now = Utc::now();
    course::ActiveModel {
        title: Set(title.to_string()),
        description: Set(None),
        video_ref: Set(None),
        teacher_id: Set(teacher_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert course")
}

pub async fn seed_playlist(
    db: &DatabaseConnection,
    title: &str,
    access_mode: AccessMode,
    teacher_id: i64,
) -> playlist::Model {
    let now = Utc::now();
    playlist::ActiveModel {
        title: Set(title.to_string()),
        access_mode: Set(access_mode),
        teacher_id: Set(teacher_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert playlist")
}

pub async fn link_test(
    db: &DatabaseConnection,
    playlist_id: i64,
    test_id: i64,
    order_index: i64,
) -> playlist_test::Model {
    playlist_test::ActiveModel {
        playlist_id: Set(playlist_id),
        test_id: Set(test_id),
        order_index: Set(order_index),
    }
    .insert(db)
    .await
    .expect("Failed to link test to playlist")
}

pub async fn link_course(
    db: &DatabaseConnection,
    playlist_id: i64,
    course_id: i64,
    order_index: i64,
) -> playlist_course::Model {
    playlist_course::ActiveModel {
        playlist_id: Set(playlist_id),
        course_id: Set(course_id),
        order_index: Set(order_index),
    }
    .insert(db)
    .await
    .expect("Failed to link course to playlist")
}
