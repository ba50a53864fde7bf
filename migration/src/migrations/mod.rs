pub mod m202508010001_create_tests;
pub mod m202508010002_create_questions;
pub mod m202508010003_create_variants;
pub mod m202508010004_create_courses;
pub mod m202508010005_create_playlists;
pub mod m202508010007_create_playlist_courses;
pub mod m202508010008_create_playlist_progress;
pub mod m202508010009_create_ratings;
