use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, DatabaseError, ResourceTyped,
        entity::{
            Course, CourseCreate, EnrolledStudentRow, Enrollment, EnrollmentCreate, Lesson, Quiz,
        },
        progress::{CourseProgress, update_enrollment_progress},
    },
    utils::validate::validate_title,
    web::{
        AppState, RequestContext, UserRole, WebError, WebResult,
        dto::{
            courses::{CourseDetail, CourseListQuery},
            enrollments::EnrollmentProgressResponse,
            lessons::LessonOutline,
            quizzes::QuizOutline,
        },
        error::ErrorResponse,
        middlewares,
        routes::{
            PaginationQuery, find_course, find_enrollment, lessons, page_bounds, quizzes,
            require_course_visible, require_owner,
        },
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(course_list_handler).post(course_create_handler))
        .route("/mine", get(course_mine_handler))
        .route(
            "/{id}",
            get(course_get_handler)
                .put(course_update_handler)
                .delete(course_delete_handler),
        )
        .route("/{id}/publish", post(course_publish_handler))
        .route("/{id}/unpublish", post(course_unpublish_handler))
        .route("/{id}/students", get(course_students_handler))
        .route(
            "/{id}/lessons",
            get(lessons::lesson_list_handler).post(lessons::lesson_create_handler),
        )
        .route(
            "/{id}/quizzes",
            get(quizzes::quiz_list_handler).post(quizzes::quiz_create_handler),
        )
        .route(
            "/{id}/enroll",
            post(course_enroll_handler).delete(course_unenroll_handler),
        )
        .route("/{id}/progress", get(course_progress_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn course_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(Course::get_resource_type(), e)
}

fn enrollment_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(Enrollment::get_resource_type(), e)
}

#[utoipa::path(
    get,
    path = "/api/v1/courses",
    params(CourseListQuery),
    description = "Published courses, newest first",
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<Course>),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_list_handler(
    ctx: RequestContext,
    Query(query): Query<CourseListQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let (limit, offset) = page_bounds(query.limit, query.offset);
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let page = Course::page_published(state.pool(), user, search, limit, offset)
        .await
        .map_err(course_error)?;

    Ok((StatusCode::OK, Json(page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/mine",
    params(PaginationQuery),
    description = "Courses taught by the current user, drafts included",
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<Course>),
        (status = 403, description = "Only teachers and admins own courses", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_mine_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with_role(UserRole::AUTHORS)?;
    let (limit, offset) = page.bounds();

    let page = Course::page_by_teacher(state.pool(), user, user.user_id(), limit, offset)
        .await
        .map_err(course_error)?;

    Ok((StatusCode::OK, Json(page)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses",
    request_body = CourseCreate,
    description = "Creates an unpublished course owned by the current user",
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Invalid title", body = ErrorResponse),
        (status = 403, description = "Only teachers and admins create courses", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub(crate) async fn course_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with_role(UserRole::AUTHORS)?;
    validate_title(&payload.title).map_err(WebError::bad_request)?;

    let created = Course::create(state.pool(), user, payload)
        .await
        .map_err(course_error)?;
    tracing::info!(id = %created.id(), teacher = %user.user_id(), "course created");

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course with lesson and quiz outlines", body = CourseDetail),
        (status = 403, description = "Course is not published", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_course(state.pool(), user, id).await?;
    require_course_visible(state.pool(), user, &course).await?;

    let (lessons, quizzes, enrollment_count) = tokio::try_join!(
        Lesson::all_by_course(state.pool(), user, id),
        Quiz::all_by_course(state.pool(), user, id),
        Enrollment::count_by_course(state.pool(), user, id),
    )
    .map_err(course_error)?;

    let detail = CourseDetail {
        course,
        lessons: lessons.iter().map(LessonOutline::from).collect(),
        quizzes: quizzes.iter().map(QuizOutline::from).collect(),
        enrollment_count,
    };

    Ok((StatusCode::OK, Json(detail)))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = CourseCreate,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 400, description = "Invalid title", body = ErrorResponse),
        (status = 403, description = "Not the teacher of this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_course(state.pool(), user, id).await?;
    require_owner(state.pool(), user, &course).await?;
    validate_title(&payload.title).map_err(WebError::bad_request)?;

    let updated = course
        .update(state.pool(), user, payload)
        .await
        .map_err(course_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    description = "Deletes the course with its lessons, quizzes, enrollments and submissions",
    responses(
        (status = 200, description = "Course deleted"),
        (status = 403, description = "Not the teacher of this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_course(state.pool(), user, id).await?;
    require_owner(state.pool(), user, &course).await?;

    course
        .delete(state.pool(), user)
        .await
        .map_err(course_error)?;
    tracing::info!(%id, by = %user.user_id(), "course deleted");

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/publish",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course published", body = Course),
        (status = 400, description = "Course has no lessons", body = ErrorResponse),
        (status = 403, description = "Not the teacher of this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_publish_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_course(state.pool(), user, id).await?;
    require_owner(state.pool(), user, &course).await?;

    let lessons = Lesson::count_by_course(state.pool(), user, id)
        .await
        .map_err(course_error)?;
    if lessons == 0 {
        return Err(WebError::bad_request(
            "a course needs at least one lesson to be published",
        ));
    }

    let published = course
        .set_published(state.pool(), user, true)
        .await
        .map_err(course_error)?;

    Ok((StatusCode::OK, Json(published)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/unpublish",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course hidden from the catalogue", body = Course),
        (status = 403, description = "Not the teacher of this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_unpublish_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_course(state.pool(), user, id).await?;
    require_owner(state.pool(), user, &course).await?;

    let unpublished = course
        .set_published(state.pool(), user, false)
        .await
        .map_err(course_error)?;

    Ok((StatusCode::OK, Json(unpublished)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/students",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Enrolled students with their progress", body = Vec<EnrolledStudentRow>),
        (status = 403, description = "Not the teacher of this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_students_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_course(state.pool(), user, id).await?;
    require_owner(state.pool(), user, &course).await?;

    let students = EnrolledStudentRow::fetch_for_course(state.pool(), user, id)
        .await
        .map_err(enrollment_error)?;

    Ok((StatusCode::OK, Json(students)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/enroll",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 201, description = "Enrolled", body = Enrollment),
        (status = 400, description = "Course is not published", body = ErrorResponse),
        (status = 403, description = "Only students enroll", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Already enrolled", body = ErrorResponse),
    ),
    tag = "enrollments",
    security(
        ("cookie" = [])
    )
)]
#[tracing::instrument(skip(ctx, state))]
pub(crate) async fn course_enroll_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with_role(UserRole::LEARNERS)?;
    let course = find_course(state.pool(), user, id).await?;
    if !course.is_published() {
        return Err(WebError::bad_request("course is not published"));
    }

    let already_enrolled = || {
        WebError::resource_conflict(Enrollment::get_resource_type(), "already enrolled")
    };
    if find_enrollment(state.pool(), user, id).await?.is_some() {
        return Err(already_enrolled());
    }

    let created = Enrollment::create(state.pool(), user, EnrollmentCreate::new(user.user_id(), id))
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                already_enrolled()
            } else {
                enrollment_error(e)
            }
        })?;

    // lessons completed before an earlier unenroll still count
    let enrollment = update_enrollment_progress(state.pool(), user, user.user_id(), id)
        .await
        .map_err(enrollment_error)?
        .unwrap_or(created);
    tracing::info!(user = %user.user_id(), course = %id, "enrolled");

    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}/enroll",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Unenrolled"),
        (status = 403, description = "Only students unenroll", body = ErrorResponse),
        (status = 404, description = "Not enrolled", body = ErrorResponse),
    ),
    tag = "enrollments",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_unenroll_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with_role(UserRole::LEARNERS)?;
    let enrollment = find_enrollment(state.pool(), user, id)
        .await?
        .ok_or_else(|| WebError::resource_not_found(Enrollment::get_resource_type()))?;

    enrollment
        .delete(state.pool(), user)
        .await
        .map_err(enrollment_error)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/progress",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Enrollment with lesson and quiz counts", body = EnrollmentProgressResponse),
        (status = 404, description = "Course not found or not enrolled", body = ErrorResponse),
    ),
    tag = "enrollments",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn course_progress_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    find_course(state.pool(), user, id).await?;

    let enrollment = find_enrollment(state.pool(), user, id)
        .await?
        .ok_or_else(|| WebError::resource_not_found(Enrollment::get_resource_type()))?;
    let counts = CourseProgress::fetch(state.pool(), user, user.user_id(), id)
        .await
        .map_err(enrollment_error)?;

    Ok((StatusCode::OK, Json(EnrollmentProgressResponse { enrollment, counts })))
}
