use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{DatabaseResult, ModelManager, ResourceTyped},
    web::AuthenticatedUser,
};

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct LessonProgress {
    id: Uuid,
    user_id: Uuid,
    lesson_id: Uuid,
    completed_at: DateTime<Utc>,
}

impl ResourceTyped for LessonProgress {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::LessonProgress
    }
}

impl LessonProgress {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn lesson_id(&self) -> Uuid {
        self.lesson_id
    }

    pub fn completed_at(&self) -> &DateTime<Utc> {
        &self.completed_at
    }

    /// Idempotent: completing a lesson twice keeps the first completion time.
    pub async fn mark_completed(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        lesson_id: Uuid,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO lesson_progress (id, user_id, lesson_id)
            VALUES ($1,$2,$3)
            ON CONFLICT (user_id, lesson_id)
            DO UPDATE SET completed_at = lesson_progress.completed_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(lesson_id)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }
}
