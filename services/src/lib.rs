pub mod playlist_service;
pub mod progress_service;
pub mod test_session;
