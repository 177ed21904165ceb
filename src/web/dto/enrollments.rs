use serde::Serialize;

use crate::model::{entity::Enrollment, progress::CourseProgress};

#[derive(Serialize, utoipa::ToSchema)]
pub struct EnrollmentProgressResponse {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    #[serde(flatten)]
    pub counts: CourseProgress,
}
