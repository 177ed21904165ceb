//! Enrollment progress aggregation.
//!
//! A course is made of lessons and quizzes. A lesson counts as done once the
//! student marked it complete, a quiz once any of their submissions passed.

use serde::Serialize;
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    model::{
        ModelManager, entity::Enrollment, error::DatabaseResult, grading::percentage,
    },
    web::AuthenticatedUser,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow, utoipa::ToSchema)]
pub struct CourseProgress {
    pub completed_lessons: i64,
    pub total_lessons: i64,
    pub passed_quizzes: i64,
    pub total_quizzes: i64,
}

impl CourseProgress {
    pub fn done(&self) -> i64 {
        self.completed_lessons + self.passed_quizzes
    }

    pub fn total(&self) -> i64 {
        self.total_lessons + self.total_quizzes
    }

    pub fn percentage(&self) -> f64 {
        percentage(self.done(), self.total())
    }

    /// An empty course is never complete.
    pub fn is_complete(&self) -> bool {
        self.total() > 0 && self.done() >= self.total()
    }

    pub async fn fetch(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM lessons WHERE course_id = $2) AS total_lessons,
                (
                    SELECT COUNT(*)
                    FROM lesson_progress lp
                    JOIN lessons l ON l.id = lp.lesson_id
                    WHERE l.course_id = $2 AND lp.user_id = $1
                ) AS completed_lessons,
                (SELECT COUNT(*) FROM quizzes WHERE course_id = $2) AS total_quizzes,
                (
                    SELECT COUNT(DISTINCT qs.quiz_id)
                    FROM quiz_submissions qs
                    JOIN quizzes q ON q.id = qs.quiz_id
                    WHERE q.course_id = $2 AND qs.user_id = $1 AND qs.passed
                ) AS passed_quizzes
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }
}

/// Recomputes and stores the progress of one enrollment. Returns `None` when
/// the user is not enrolled in the course.
#[tracing::instrument(skip(mm, actor))]
pub async fn update_enrollment_progress(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    user_id: Uuid,
    course_id: Uuid,
) -> DatabaseResult<Option<Enrollment>> {
    let progress = CourseProgress::fetch(mm, actor, user_id, course_id).await?;
    let updated = Enrollment::set_progress(
        mm,
        actor,
        user_id,
        course_id,
        progress.percentage(),
        progress.is_complete(),
    )
    .await?;

    if let Some(enrollment) = &updated {
        tracing::debug!(
            progress = enrollment.progress(),
            done = progress.done(),
            total = progress.total(),
            "enrollment progress updated"
        );
    }

    Ok(updated)
}

/// Recomputes every enrollment of a course, after its lessons or quizzes changed.
#[tracing::instrument(skip(mm, actor))]
pub async fn update_course_progress(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    course_id: Uuid,
) -> DatabaseResult<usize> {
    let user_ids = Enrollment::user_ids_by_course(mm, actor, course_id).await?;
    for user_id in &user_ids {
        update_enrollment_progress(mm, actor, *user_id, course_id).await?;
    }
    Ok(user_ids.len())
}

#[cfg(test)]
mod test {
    use super::*;

    fn progress(cl: i64, tl: i64, pq: i64, tq: i64) -> CourseProgress {
        CourseProgress {
            completed_lessons: cl,
            total_lessons: tl,
            passed_quizzes: pq,
            total_quizzes: tq,
        }
    }

    #[test]
    fn empty_course_has_zero_progress() {
        let p = progress(0, 0, 0, 0);
        assert_eq!(p.percentage(), 0.0);
        assert!(!p.is_complete());
    }

    #[test]
    fn lessons_and_quizzes_weigh_equally() {
        let p = progress(2, 3, 1, 1);
        assert_eq!(p.done(), 3);
        assert_eq!(p.total(), 4);
        assert_eq!(p.percentage(), 75.0);
        assert!(!p.is_complete());
    }

    #[test]
    fn full_completion() {
        let p = progress(3, 3, 2, 2);
        assert_eq!(p.percentage(), 100.0);
        assert!(p.is_complete());
    }

    #[test]
    fn new_content_reopens_course() {
        let before = progress(1, 1, 0, 0);
        assert!(before.is_complete());
        let after = progress(1, 2, 0, 0);
        assert!(!after.is_complete());
        assert_eq!(after.percentage(), 50.0);
    }

    #[test]
    fn thirds_round_to_two_decimals() {
        assert_eq!(progress(1, 3, 0, 0).percentage(), 33.33);
    }
}
