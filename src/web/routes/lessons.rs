use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, DatabaseError, ResourceType, ResourceTyped,
        entity::{Enrollment, Lesson, LessonCreate, LessonProgress, LessonWithStatusRow},
        progress::update_enrollment_progress,
    },
    utils::validate::validate_title,
    web::{
        AppState, RequestContext, UserRole, WebError, WebResult,
        dto::lessons::{LessonBody, LessonOutline, LessonResponse},
        error::ErrorResponse,
        middlewares,
        routes::{
            find_course, find_lesson, refresh_course_progress, require_content_access,
            require_course_visible, require_enrollment, require_owner,
        },
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{id}",
            get(lesson_get_handler)
                .put(lesson_update_handler)
                .delete(lesson_delete_handler),
        )
        .route("/{id}/complete", post(lesson_complete_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn lesson_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(Lesson::get_resource_type(), e)
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/lessons",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Lesson outlines in course order", body = Vec<LessonOutline>),
        (status = 403, description = "Course is not published", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "lessons",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn lesson_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_course(state.pool(), user, course_id).await?;
    require_course_visible(state.pool(), user, &course).await?;

    let lessons = Lesson::all_by_course(state.pool(), user, course_id)
        .await
        .map_err(lesson_error)?;
    let outlines: Vec<LessonOutline> = lessons.iter().map(LessonOutline::from).collect();

    Ok((StatusCode::OK, Json(outlines)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/lessons",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = LessonBody,
    responses(
        (status = 201, description = "Lesson created", body = Lesson),
        (status = 400, description = "Invalid title", body = ErrorResponse),
        (status = 403, description = "Not the teacher of this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "lessons",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn lesson_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<LessonBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with_role(UserRole::AUTHORS)?;
    let course = find_course(state.pool(), user, course_id).await?;
    require_owner(state.pool(), user, &course).await?;
    validate_title(&payload.title).map_err(WebError::bad_request)?;

    let data = LessonCreate {
        course_id,
        title: payload.title,
        content: payload.content,
        order_index: payload.order_index,
    };
    let created = Lesson::create(state.pool(), user, data)
        .await
        .map_err(lesson_error)?;

    refresh_course_progress(state.pool(), user, course_id).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/lessons/{id}",
    params(("id" = Uuid, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "Lesson with completion status", body = LessonResponse),
        (status = 403, description = "Not enrolled in the course", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    tag = "lessons",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn lesson_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = find_lesson(state.pool(), user, id).await?;
    let course = find_course(state.pool(), user, lesson.course_id()).await?;
    require_content_access(state.pool(), user, &course, ResourceType::Lesson).await?;

    let row = LessonWithStatusRow::find_by_id(state.pool(), user, id)
        .await
        .map_err(lesson_error)?
        .ok_or_else(|| WebError::resource_not_found(ResourceType::Lesson))?;

    Ok((StatusCode::OK, Json(LessonResponse::from(row))))
}

#[utoipa::path(
    put,
    path = "/api/v1/lessons/{id}",
    params(("id" = Uuid, Path, description = "Lesson id")),
    request_body = LessonBody,
    responses(
        (status = 200, description = "Lesson updated", body = Lesson),
        (status = 400, description = "Invalid title", body = ErrorResponse),
        (status = 403, description = "Not the teacher of this course", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    tag = "lessons",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn lesson_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LessonBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = find_lesson(state.pool(), user, id).await?;
    require_owner(state.pool(), user, &lesson).await?;
    validate_title(&payload.title).map_err(WebError::bad_request)?;

    let data = LessonCreate {
        course_id: lesson.course_id(),
        title: payload.title,
        content: payload.content,
        order_index: payload.order_index,
    };
    let updated = lesson
        .update(state.pool(), user, data)
        .await
        .map_err(lesson_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/lessons/{id}",
    params(("id" = Uuid, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "Lesson deleted"),
        (status = 403, description = "Not the teacher of this course", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    tag = "lessons",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn lesson_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let lesson = find_lesson(state.pool(), user, id).await?;
    require_owner(state.pool(), user, &lesson).await?;

    let course_id = lesson.course_id();
    lesson
        .delete(state.pool(), user)
        .await
        .map_err(lesson_error)?;

    refresh_course_progress(state.pool(), user, course_id).await?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/lessons/{id}/complete",
    params(("id" = Uuid, Path, description = "Lesson id")),
    description = "Marks the lesson complete for the current student. Repeating the call changes nothing.",
    responses(
        (status = 200, description = "Updated enrollment", body = Enrollment),
        (status = 403, description = "Not a student or not enrolled", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    tag = "lessons",
    security(
        ("cookie" = [])
    )
)]
#[tracing::instrument(skip(ctx, state))]
pub(crate) async fn lesson_complete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with_role(UserRole::LEARNERS)?;
    let lesson = find_lesson(state.pool(), user, id).await?;
    require_enrollment(state.pool(), user, lesson.course_id()).await?;

    LessonProgress::mark_completed(state.pool(), user, user.user_id(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(LessonProgress::get_resource_type(), e))?;

    let enrollment =
        update_enrollment_progress(state.pool(), user, user.user_id(), lesson.course_id())
            .await
            .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?
            .ok_or_else(|| WebError::resource_not_found(Enrollment::get_resource_type()))?;

    Ok((StatusCode::OK, Json(enrollment)))
}
