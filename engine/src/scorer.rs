//! # Scorer Module
//!
//! Scores a finished test attempt. The scoring contract is deliberately
//! forgiving: an unanswered question is wrong, an out-of-range variant
//! position is wrong, and a question without a correct variant can never be
//! answered correctly. None of these conditions raises an error.

use crate::types::{AnswerMap, Question, TestScore};

/// Position of the correct variant within a question's ordered variant
/// sequence.
///
/// When more than one variant is flagged correct, the first in order is
/// canonical. `None` when no variant is flagged correct.
pub fn correct_position(question: &Question) -> Option<usize> {
    question.variants.iter().position(|v| v.is_correct)
}

/// Scores an attempt against the loaded questions.
///
/// `time_taken_seconds` is computed by the caller as allotted minus
/// remaining seconds (saturating at zero) and passed through untouched.
///
/// # Example
///
/// ```
/// use engine::scorer::score_test;
/// use engine::types::{AnswerMap, Question, Variant};
///
/// let questions = vec![Question {
///     id: 1,
///     text: "2 + 2 = ?".to_string(),
///     variants: vec![
///         Variant { id: 10, text: "4".to_string(), is_correct: true },
///         Variant { id: 11, text: "5".to_string(), is_correct: false },
///     ],
/// }];
/// let mut answers = AnswerMap::new();
/// answers.insert(0, 0);
///
/// let score = score_test(&questions, &answers, 12);
/// assert_eq!((score.total, score.correct, score.wrong), (1, 1, 0));
/// assert_eq!(score.time_taken_seconds, 12);
/// ```
pub fn score_test(questions: &[Question], answers: &AnswerMap, time_taken_seconds: u64) -> TestScore {
    let total = questions.len();
    let mut correct = 0;

    for (position, question) in questions.iter().enumerate() {
        let Some(expected) = correct_position(question) else {
            continue;
        };
        if answers.get(&position) == Some(&expected) {
            correct += 1;
        }
    }

    TestScore {
        total,
        correct,
        wrong: total - correct,
        time_taken_seconds,
    }
}
