//! # Engine Library
//!
//! Pure computation core for test scoring and playlist access gating.
//! Everything in this crate is a total function over in-memory values:
//! no database, no clock, no I/O. The stateful services load data through
//! the persistence gateway, hand it to these functions, and persist or
//! display whatever comes back.
//!
//! ## Key Concepts
//! - **Scoring**: an answer map (question position -> chosen variant
//!   position) evaluated against the ordered question/variant fixtures.
//! - **Access policy**: which playlist items are unlocked for a viewer,
//!   given the completion set and the playlist's access mode.
//! - **Integrity checks**: authoring-time data problems (no correct
//!   variant, empty tests) reported as warnings, never as scoring errors.

pub mod access;
pub mod check;
pub mod scorer;
pub mod types;
