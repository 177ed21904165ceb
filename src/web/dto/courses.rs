use serde::{Deserialize, Serialize};

use crate::{
    model::entity::Course,
    web::dto::{lessons::LessonOutline, quizzes::QuizOutline},
};

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Case-insensitive title substring
    pub search: Option<String>,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub lessons: Vec<LessonOutline>,
    pub quizzes: Vec<QuizOutline>,
    pub enrollment_count: i64,
}
