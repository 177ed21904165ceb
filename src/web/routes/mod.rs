use axum::Router;
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::{
    Config,
    model::{
        CrudRepository, HasOwner, ModelManager, ResourceType, ResourceTyped, check_owner,
        entity::{Course, Enrollment, Lesson, Quiz, UserEntity},
        is_owner,
    },
    web::{AppState, AuthenticatedUser, WebError, WebResult, doc::ApiDoc},
};

pub mod admin;
pub mod courses;
pub mod enrollments;
pub mod lessons;
pub mod quizzes;
pub mod user;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// Page size, 1..=100, defaults to 20
    limit: Option<i64>,
    offset: Option<i64>,
}

impl PaginationQuery {
    pub fn bounds(&self) -> (i64, i64) {
        page_bounds(self.limit, self.offset)
    }
}

/// Clamps client supplied pagination into `(limit, offset)`.
pub fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (
        limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        offset.unwrap_or(0).max(0),
    )
}

pub fn build_app(state: AppState, config: &Config) -> Router {
    let mut router = Router::new()
        .nest("/api/v1/account", user::routes(state.clone()))
        .nest("/api/v1/courses", courses::routes(state.clone()))
        .nest("/api/v1/lessons", lessons::routes(state.clone()))
        .nest("/api/v1/quizzes", quizzes::routes(state.clone()))
        .nest("/api/v1/enrollments", enrollments::routes(state.clone()))
        .nest("/api/v1/admin", admin::routes(state.clone()));

    if config.app().docs() {
        router = router
            .merge(SwaggerUi::new("/api/v1/docs").url("/api-doc/openapi.json", ApiDoc::openapi()));
    }

    router
        .layer(CookieManagerLayer::default())
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
}

// Lookups shared by handlers

pub(crate) async fn find_user(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<UserEntity> {
    UserEntity::find_by_id(mm, actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(UserEntity::get_resource_type()))
}

pub(crate) async fn find_course(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Course> {
    Course::find_by_id(mm, actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))
}

pub(crate) async fn find_lesson(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Lesson> {
    Lesson::find_by_id(mm, actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Lesson::get_resource_type()))
}

pub(crate) async fn find_quiz(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Quiz> {
    Quiz::find_by_id(mm, actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Quiz::get_resource_type()))
}

/// Ownership check for mutations, admins pass.
pub(crate) async fn require_owner<T>(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    resource: &T,
) -> WebResult<()>
where
    T: HasOwner<OwnerId = Uuid> + ResourceTyped + Sync,
{
    check_owner(mm, actor, resource)
        .await
        .map_err(|e| WebError::resource_access_error(T::get_resource_type(), e))
}

/// Published courses are visible to every signed in user, drafts only to
/// their teacher and admins.
pub(crate) async fn require_course_visible(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    course: &Course,
) -> WebResult<()> {
    if course.is_published() {
        return Ok(());
    }
    require_owner(mm, actor, course).await
}

/// How the acting user relates to the content of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContentAccess {
    /// Teacher of the course or an admin
    Author,
    Learner,
}

/// Lesson and quiz content is open to the course teacher, admins and
/// enrolled students.
pub(crate) async fn require_content_access(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    course: &Course,
    resource_type: ResourceType,
) -> WebResult<ContentAccess> {
    let owner = is_owner(mm, actor, course)
        .await
        .map_err(|e| WebError::resource_fetch_error(resource_type.clone(), e))?;
    if owner {
        return Ok(ContentAccess::Author);
    }

    find_enrollment(mm, actor, course.id())
        .await?
        .map(|_| ContentAccess::Learner)
        .ok_or(WebError::resource_forbidden(resource_type))
}

pub(crate) async fn find_enrollment(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    course_id: Uuid,
) -> WebResult<Option<Enrollment>> {
    Enrollment::find_by_user_and_course(mm, actor, actor.user_id(), course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))
}

/// Student actions on course content need an enrollment, otherwise 403.
pub(crate) async fn require_enrollment(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    course_id: Uuid,
) -> WebResult<Enrollment> {
    find_enrollment(mm, actor, course_id)
        .await?
        .ok_or_else(|| WebError::resource_forbidden(Enrollment::get_resource_type()))
}

/// Recomputes the progress of every enrollment in a course after its
/// lessons or quizzes changed.
pub(crate) async fn refresh_course_progress(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    course_id: Uuid,
) -> WebResult<()> {
    let updated = crate::model::progress::update_course_progress(mm, actor, course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;
    tracing::debug!(%course_id, enrollments = updated, "course progress refreshed");
    Ok(())
}
