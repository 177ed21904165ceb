use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{
    entity::{Quiz, QuizSubmission},
    grading::QuizQuestion,
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct QuizBody {
    pub title: String,
    pub questions: Vec<QuizQuestion>,
    /// Percentage needed to pass, defaults to 60
    pub passing_score: Option<i32>,
    pub max_attempts: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuizOutline {
    pub id: Uuid,
    pub title: String,
    pub question_count: usize,
    pub passing_score: i32,
    pub max_attempts: Option<i32>,
}

impl From<&Quiz> for QuizOutline {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id(),
            title: quiz.title().to_string(),
            question_count: quiz.questions().len(),
            passing_score: quiz.passing_score(),
            max_attempts: quiz.max_attempts(),
        }
    }
}

/// A question as students see it, without the answer.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PublicQuestion {
    pub prompt: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuizPublicResponse {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub questions: Vec<PublicQuestion>,
    pub passing_score: i32,
    pub max_attempts: Option<i32>,
}

impl From<&Quiz> for QuizPublicResponse {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id(),
            course_id: quiz.course_id(),
            title: quiz.title().to_string(),
            questions: quiz
                .questions()
                .iter()
                .map(|q| PublicQuestion {
                    prompt: q.prompt.clone(),
                    options: q.options.clone(),
                })
                .collect(),
            passing_score: quiz.passing_score(),
            max_attempts: quiz.max_attempts(),
        }
    }
}

/// Owners and admins get the full quiz, students the public one.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum QuizView {
    Full(Quiz),
    Public(QuizPublicResponse),
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct QuizSubmitBody {
    /// Chosen option index per question, in question order
    pub answers: Vec<i64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuizSubmitResponse {
    pub submission: QuizSubmission,
    /// Per-question correctness, in question order
    pub results: Vec<bool>,
    pub course_progress: f64,
    pub course_completed: bool,
}
