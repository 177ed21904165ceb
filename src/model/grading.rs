//! Quiz grading.
//!
//! Grading is a single pass over the quiz questions and the submitted option
//! indexes. Validation of the quiz itself (done when a teacher saves it) lives
//! here too, so the invariants the grader relies on are checked in one place.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PASSING_SCORE: i32 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: usize,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuizValidationError {
    #[error("quiz must contain at least one question")]
    NoQuestions,
    #[error("question {index} must have a prompt")]
    EmptyPrompt { index: usize },
    #[error("question {index} must have at least two options")]
    NotEnoughOptions { index: usize },
    #[error("question {index} has correct_option {correct} out of range")]
    CorrectOptionOutOfRange { index: usize, correct: usize },
    #[error("passing_score must be between 0 and 100, got {0}")]
    PassingScoreOutOfRange(i32),
    #[error("max_attempts must be at least 1, got {0}")]
    InvalidMaxAttempts(i32),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradingError {
    #[error("expected {expected} answers, got {actual}")]
    AnswerCountMismatch { expected: usize, actual: usize },
    #[error("answer {answer} to question {index} is not one of its options")]
    AnswerOutOfRange { index: usize, answer: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeResult {
    pub results: Vec<bool>,
    pub correct: i32,
    pub total: i32,
    pub percentage: f64,
    pub passed: bool,
}

pub fn validate_quiz(
    questions: &[QuizQuestion],
    passing_score: i32,
    max_attempts: Option<i32>,
) -> Result<(), QuizValidationError> {
    if questions.is_empty() {
        return Err(QuizValidationError::NoQuestions);
    }

    for (index, q) in questions.iter().enumerate() {
        if q.prompt.trim().is_empty() {
            return Err(QuizValidationError::EmptyPrompt { index });
        }
        if q.options.len() < 2 {
            return Err(QuizValidationError::NotEnoughOptions { index });
        }
        if q.correct_option >= q.options.len() {
            return Err(QuizValidationError::CorrectOptionOutOfRange {
                index,
                correct: q.correct_option,
            });
        }
    }

    if !(0..=100).contains(&passing_score) {
        return Err(QuizValidationError::PassingScoreOutOfRange(passing_score));
    }

    match max_attempts {
        Some(n) if n < 1 => Err(QuizValidationError::InvalidMaxAttempts(n)),
        _ => Ok(()),
    }
}

pub fn grade(
    questions: &[QuizQuestion],
    answers: &[i64],
    passing_score: i32,
) -> Result<GradeResult, GradingError> {
    if answers.len() != questions.len() {
        return Err(GradingError::AnswerCountMismatch {
            expected: questions.len(),
            actual: answers.len(),
        });
    }

    let mut results = Vec::with_capacity(questions.len());
    for (index, (q, &answer)) in questions.iter().zip(answers).enumerate() {
        let chosen = usize::try_from(answer)
            .ok()
            .filter(|chosen| *chosen < q.options.len())
            .ok_or(GradingError::AnswerOutOfRange { index, answer })?;
        results.push(chosen == q.correct_option);
    }

    let correct = results.iter().filter(|r| **r).count() as i64;
    let total = questions.len() as i64;
    let percentage = percentage(correct, total);

    Ok(GradeResult {
        results,
        correct: correct as i32,
        total: total as i32,
        percentage,
        passed: percentage >= passing_score as f64,
    })
}

/// `part * 100 / whole`, two decimals, clamped to `0..=100`. Zero when `whole` is zero.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    let raw = part as f64 * 100.0 / whole as f64;
    ((raw * 100.0).round() / 100.0).clamp(0.0, 100.0)
}
