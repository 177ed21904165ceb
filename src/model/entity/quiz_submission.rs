use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, prelude::FromRow, types::Json};
use uuid::Uuid;

use crate::{
    model::{DatabaseResult, ModelManager, ResourceTyped, grading::GradeResult},
    web::AuthenticatedUser,
};

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizSubmission {
    id: Uuid,
    user_id: Uuid,
    quiz_id: Uuid,
    #[schema(value_type = Vec<i64>)]
    answers: Json<Vec<i64>>,
    correct: i32,
    total: i32,
    percentage: f64,
    passed: bool,
    submitted_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct QuizSubmissionCreate {
    pub user_id: Uuid,
    pub quiz_id: Uuid,
    pub answers: Vec<i64>,
    pub grade: GradeResult,
}

impl ResourceTyped for QuizSubmission {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::QuizSubmission
    }
}

impl QuizSubmission {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn quiz_id(&self) -> Uuid {
        self.quiz_id
    }

    pub fn answers(&self) -> &[i64] {
        &self.answers.0
    }

    pub fn correct(&self) -> i32 {
        self.correct
    }

    pub fn total(&self) -> i32 {
        self.total
    }

    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn submitted_at(&self) -> &DateTime<Utc> {
        &self.submitted_at
    }

    /// Accepts the pool or an open transaction, so the attempt check and the
    /// insert can share one.
    pub async fn create<'e, E>(
        executor: E,
        _actor: &AuthenticatedUser,
        data: QuizSubmissionCreate,
    ) -> DatabaseResult<Self>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as(
            r#"
            INSERT INTO quiz_submissions
                (id, user_id, quiz_id, answers, correct, total, percentage, passed)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.quiz_id)
        .bind(Json(&data.answers))
        .bind(data.grade.correct)
        .bind(data.grade.total)
        .bind(data.grade.percentage)
        .bind(data.grade.passed)
        .fetch_one(executor)
        .await?;

        Ok(row)
    }

    pub async fn count_attempts<'e, E>(
        executor: E,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        quiz_id: Uuid,
    ) -> DatabaseResult<i64>
    where
        E: PgExecutor<'e>,
    {
        let result: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quiz_submissions WHERE user_id = $1 AND quiz_id = $2",
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_one(executor)
        .await?;
        Ok(result)
    }

    /// Newest first. `user_id: None` returns every student's submissions.
    pub async fn all_by_quiz(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        quiz_id: Uuid,
        user_id: Option<Uuid>,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT * FROM quiz_submissions
            WHERE quiz_id = $1
            AND ($2::uuid IS NULL OR user_id = $2)
            ORDER BY submitted_at DESC
            "#,
        )
        .bind(quiz_id)
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
