use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::middlewares::AUTH_TOKEN;

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    AUTH_TOKEN,
                    "JWT token for current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::routes::user::user_signup_handler,
        crate::web::routes::user::user_signin_handler,
        crate::web::routes::user::user_signout_handler,
        crate::web::routes::user::user_me_handler,
        crate::web::routes::user::user_verify_handler,
        crate::web::routes::user::user_password_handler,
        crate::web::routes::user::user_list_handler,
        crate::web::routes::user::user_update_handler,
        crate::web::routes::user::user_delete_handler,
        crate::web::routes::courses::course_list_handler,
        crate::web::routes::courses::course_mine_handler,
        crate::web::routes::courses::course_create_handler,
        crate::web::routes::courses::course_get_handler,
        crate::web::routes::courses::course_update_handler,
        crate::web::routes::courses::course_delete_handler,
        crate::web::routes::courses::course_publish_handler,
        crate::web::routes::courses::course_unpublish_handler,
        crate::web::routes::courses::course_students_handler,
        crate::web::routes::courses::course_enroll_handler,
        crate::web::routes::courses::course_unenroll_handler,
        crate::web::routes::courses::course_progress_handler,
        crate::web::routes::lessons::lesson_list_handler,
        crate::web::routes::lessons::lesson_create_handler,
        crate::web::routes::lessons::lesson_get_handler,
        crate::web::routes::lessons::lesson_update_handler,
        crate::web::routes::lessons::lesson_delete_handler,
        crate::web::routes::lessons::lesson_complete_handler,
        crate::web::routes::quizzes::quiz_list_handler,
        crate::web::routes::quizzes::quiz_create_handler,
        crate::web::routes::quizzes::quiz_get_handler,
        crate::web::routes::quizzes::quiz_update_handler,
        crate::web::routes::quizzes::quiz_delete_handler,
        crate::web::routes::quizzes::quiz_submit_handler,
        crate::web::routes::quizzes::quiz_submissions_handler,
        crate::web::routes::enrollments::enrollment_list_handler,
        crate::web::routes::admin::admin_stats_handler,
        crate::web::routes::admin::admin_users_handler,
        crate::web::routes::admin::admin_ban_handler,
        crate::web::routes::admin::admin_unban_handler,
        crate::web::routes::admin::admin_delete_user_handler,
        crate::web::routes::admin::admin_unpublish_course_handler,
    ),
    modifiers(&CookieAuthModifier),
    tags(
        (name = "account", description = "Registration, sessions and profiles"),
        (name = "courses", description = "Course catalogue and authoring"),
        (name = "lessons", description = "Lesson content and completion"),
        (name = "quizzes", description = "Quizzes, submissions and grading"),
        (name = "enrollments", description = "Enrollment and progress"),
        (name = "admin", description = "Moderation and platform statistics"),
    ),
)]
pub struct ApiDoc;
