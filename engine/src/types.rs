//! # Types Module
//!
//! Core data structures shared by the scoring engine and the access policy.
//! These are plain values decoupled from the storage entities; the services
//! map database rows into them before calling into this crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Answers captured during one test attempt: question position (0-based
/// index into the loaded question sequence) to the chosen variant's position
/// within that question's variant sequence. Ephemeral; only the derived
/// score and completion flag outlive the attempt.
pub type AnswerMap = HashMap<usize, usize>;

/// One candidate answer of a question, in presentation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: i64,
    pub text: String,
    pub is_correct: bool,
}

/// A question with its ordered variants, as loaded for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub variants: Vec<Variant>,
}

/// The result of scoring one finished attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestScore {
    /// Number of questions in the test.
    pub total: usize,
    /// Questions answered with the correct variant position.
    pub correct: usize,
    /// Everything else, unanswered questions included.
    pub wrong: usize,
    /// Seconds between start and finish of the attempt.
    pub time_taken_seconds: u64,
}

/// Unlock order of a playlist's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    Any,
    Sequential,
}

/// One playlist item in playlist order, reduced to what gating needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub id: i64,
}

/// Availability of one playlist item for a specific viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAvailability {
    pub id: i64,
    pub is_available: bool,
    pub is_completed: bool,
}
