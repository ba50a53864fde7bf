pub mod course;
pub mod playlist;
pub mod playlist_course;
pub mod playlist_progress;
pub mod question;
pub mod rating;
pub mod variant;

pub use course::Entity as Course;
pub use playlist::Entity as Playlist;
pub use playlist_course::Entity as PlaylistCourse;
pub use playlist_progress::Entity as PlaylistProgress;
pub use playlist_test::Entity as PlaylistTest;
pub use question::Entity as Question;
pub use rating::Entity as Rating;
pub use test::Entity as Test;
pub use variant::Entity as Variant;
