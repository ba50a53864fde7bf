//! # Check Module
//!
//! Authoring-time data problems that scoring tolerates silently. Callers
//! run these checks when a test is loaded and log whatever comes back;
//! scoring itself never fails on them.

use crate::types::Question;

/// A data problem detected in a loaded question set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// The test has no questions at all.
    NoQuestions,
    /// The question at `position` has no variant flagged correct and can
    /// never be answered correctly.
    NoCorrectVariant { question_id: i64, position: usize },
    /// The question at `position` has more than one variant flagged
    /// correct; scoring treats the first in order as canonical.
    MultipleCorrectVariants {
        question_id: i64,
        position: usize,
        count: usize,
    },
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityIssue::NoQuestions => write!(f, "test has no questions"),
            IntegrityIssue::NoCorrectVariant {
                question_id,
                position,
            } => write!(
                f,
                "question {} (position {}) has no correct variant",
                question_id, position
            ),
            IntegrityIssue::MultipleCorrectVariants {
                question_id,
                position,
                count,
            } => write!(
                f,
                "question {} (position {}) has {} variants flagged correct",
                question_id, position, count
            ),
        }
    }
}

/// Scans a loaded question set for authoring problems.
pub fn integrity_issues(questions: &[Question]) -> Vec<IntegrityIssue> {
    if questions.is_empty() {
        return vec![IntegrityIssue::NoQuestions];
    }

    let mut issues = Vec::new();
    for (position, question) in questions.iter().enumerate() {
        let correct_count = question.variants.iter().filter(|v| v.is_correct).count();
        if correct_count == 0 {
            issues.push(IntegrityIssue::NoCorrectVariant {
                question_id: question.id,
                position,
            });
        } else if correct_count > 1 {
            issues.push(IntegrityIssue::MultipleCorrectVariants {
                question_id: question.id,
                position,
                count: correct_count,
            });
        }
    }
    issues
}
