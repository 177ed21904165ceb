use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{Lesson, LessonWithStatusRow};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LessonBody {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub order_index: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LessonOutline {
    pub id: Uuid,
    pub title: String,
    pub order_index: i32,
}

impl From<&Lesson> for LessonOutline {
    fn from(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id(),
            title: lesson.title().to_string(),
            order_index: lesson.order_index(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LessonResponse {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub content: String,
    pub order_index: i32,
    pub completed: bool,
}

impl From<LessonWithStatusRow> for LessonResponse {
    fn from(row: LessonWithStatusRow) -> Self {
        Self {
            id: row.id,
            course_id: row.course_id,
            title: row.title,
            content: row.content,
            order_index: row.order_index,
            completed: row.completed,
        }
    }
}
