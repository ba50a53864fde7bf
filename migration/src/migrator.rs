use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202508010001_create_tests::Migration),
            Box::new(migrations::m202508010002_create_questions::Migration),
            Box::new(migrations::m202508010003_create_variants::Migration),
            Box::new(migrations::m202508010004_create_courses::Migration),
            Box::new(migrations::m202508010005_create_playlists::Migration),
            Box::new(migrations::m202508010006_create_playlist_tests::Migration),
            Box::new(migrations::m202508010007_create_playlist_courses::Migration),
            Box::new(migrations::m202508010008_create_playlist_progress::Migration),
            Box::new(migrations::m202508010009_create_ratings::Migration),
        ]
    }
}
