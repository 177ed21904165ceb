use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, prelude::FromRow};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Enrollment {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    progress: f64,
    enrolled_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl ResourceTyped for Enrollment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Enrollment
    }
}

impl Enrollment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn enrolled_at(&self) -> &DateTime<Utc> {
        &self.enrolled_at
    }

    pub fn completed_at(&self) -> Option<&DateTime<Utc>> {
        self.completed_at.as_ref()
    }
}

#[derive(Debug)]
pub struct EnrollmentCreate {
    pub user_id: Uuid,
    pub course_id: Uuid,
}

impl EnrollmentCreate {
    pub fn new(user_id: Uuid, course_id: Uuid) -> Self {
        Self { user_id, course_id }
    }
}

#[async_trait]
impl CrudRepository<Enrollment, EnrollmentCreate, Uuid> for Enrollment {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: EnrollmentCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO enrollments (id, user_id, course_id)
            VALUES ($1,$2,$3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.course_id)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    /// Moves the enrollment to another user/course pair and resets its progress.
    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: EnrollmentCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            UPDATE enrollments
            SET user_id = $1, course_id = $2, progress = 0, completed_at = NULL
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(data.course_id)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM enrollments WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Enrollments of the acting user.
    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT * FROM enrollments
            WHERE user_id = $1
            ORDER BY enrolled_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(actor.user_id())
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE user_id = $1")
            .bind(actor.user_id())
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Enrollment {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}

// Utils

impl Enrollment {
    pub async fn find_by_user_and_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM enrollments WHERE user_id = $1 AND course_id = $2")
                .bind(user_id)
                .bind(course_id)
                .fetch_optional(mm.executor())
                .await?;
        Ok(result)
    }

    /// Row-locks the enrollment until the surrounding transaction ends.
    pub async fn lock_for_user<'e, E>(
        executor: E,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query_as(
            "SELECT * FROM enrollments WHERE user_id = $1 AND course_id = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(executor)
        .await?;
        Ok(result)
    }

    pub async fn user_ids_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Uuid>> {
        let result = sqlx::query_scalar("SELECT user_id FROM enrollments WHERE course_id = $1")
            .bind(course_id)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn count_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<i64> {
        let result: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE course_id = $1")
                .bind(course_id)
                .fetch_one(mm.executor())
                .await?;
        Ok(result)
    }

    /// Stores a recomputed progress. `completed_at` keeps its first value while
    /// the course stays complete and is cleared otherwise.
    pub async fn set_progress(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
        progress: f64,
        complete: bool,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            UPDATE enrollments
            SET progress = $1,
                completed_at = CASE WHEN $2 THEN COALESCE(completed_at, now()) ELSE NULL END
            WHERE user_id = $3 AND course_id = $4
            RETURNING *
            "#,
        )
        .bind(progress)
        .bind(complete)
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(mm.executor())
        .await?;

        Ok(row)
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct EnrollmentWithCourseRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub progress: f64,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl EnrollmentWithCourseRow {
    pub async fn fetch_for_user(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                e.id,
                e.course_id,
                c.title AS course_title,
                e.progress,
                e.enrolled_at,
                e.completed_at
            FROM enrollments e
            JOIN courses c ON c.id = e.course_id
            WHERE e.user_id = $1
            ORDER BY e.enrolled_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct EnrolledStudentRow {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub progress: f64,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl EnrolledStudentRow {
    pub async fn fetch_for_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                u.id AS user_id,
                u.username,
                u.email,
                e.progress,
                e.enrolled_at,
                e.completed_at
            FROM enrollments e
            JOIN users u ON u.id = e.user_id
            WHERE e.course_id = $1
            ORDER BY e.enrolled_at
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
