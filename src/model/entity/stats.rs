use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::{
    model::{DatabaseResult, ModelManager},
    web::AuthenticatedUser,
};

/// Platform-wide counters for the admin dashboard.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct PlatformStats {
    pub students: i64,
    pub teachers: i64,
    pub admins: i64,
    pub banned_users: i64,
    pub courses: i64,
    pub published_courses: i64,
    pub enrollments: i64,
    pub completed_enrollments: i64,
    pub quiz_submissions: i64,
}

impl PlatformStats {
    pub async fn fetch(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users WHERE role = 'student') AS students,
                (SELECT COUNT(*) FROM users WHERE role = 'teacher') AS teachers,
                (SELECT COUNT(*) FROM users WHERE role = 'admin') AS admins,
                (SELECT COUNT(*) FROM users WHERE status = 'banned') AS banned_users,
                (SELECT COUNT(*) FROM courses) AS courses,
                (SELECT COUNT(*) FROM courses WHERE published) AS published_courses,
                (SELECT COUNT(*) FROM enrollments) AS enrollments,
                (SELECT COUNT(*) FROM enrollments WHERE completed_at IS NOT NULL) AS completed_enrollments,
                (SELECT COUNT(*) FROM quiz_submissions) AS quiz_submissions
            "#,
        )
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }
}
