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
        entity::{Enrollment, Quiz, QuizCreate, QuizSubmission, QuizSubmissionCreate},
        grading::{DEFAULT_PASSING_SCORE, validate_quiz},
        progress::update_enrollment_progress,
    },
    utils::validate::validate_title,
    web::{
        AppState, AuthenticatedUser, RequestContext, UserRole, WebError, WebResult,
        dto::quizzes::{
            QuizBody, QuizOutline, QuizPublicResponse, QuizSubmitBody, QuizSubmitResponse,
            QuizView,
        },
        error::ErrorResponse,
        middlewares,
        routes::{
            ContentAccess, find_course, find_quiz, refresh_course_progress,
            require_content_access, require_course_visible, require_enrollment, require_owner,
        },
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{id}",
            get(quiz_get_handler)
                .put(quiz_update_handler)
                .delete(quiz_delete_handler),
        )
        .route("/{id}/submit", post(quiz_submit_handler))
        .route("/{id}/submissions", get(quiz_submissions_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn quiz_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(Quiz::get_resource_type(), e)
}

fn submission_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(QuizSubmission::get_resource_type(), e)
}

/// Validates a quiz body and turns it into the stored shape.
fn quiz_data(course_id: Uuid, payload: QuizBody) -> WebResult<QuizCreate> {
    validate_title(&payload.title).map_err(WebError::bad_request)?;
    let passing_score = payload.passing_score.unwrap_or(DEFAULT_PASSING_SCORE);
    validate_quiz(&payload.questions, passing_score, payload.max_attempts)
        .map_err(|e| WebError::bad_request(e.to_string()))?;

    Ok(QuizCreate {
        course_id,
        title: payload.title,
        questions: payload.questions,
        passing_score,
        max_attempts: payload.max_attempts,
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/quizzes",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Quiz outlines of the course", body = Vec<QuizOutline>),
        (status = 403, description = "Course is not published", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn quiz_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_course(state.pool(), user, course_id).await?;
    require_course_visible(state.pool(), user, &course).await?;

    let quizzes = Quiz::all_by_course(state.pool(), user, course_id)
        .await
        .map_err(quiz_error)?;
    let outlines: Vec<QuizOutline> = quizzes.iter().map(QuizOutline::from).collect();

    Ok((StatusCode::OK, Json(outlines)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/quizzes",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = QuizBody,
    responses(
        (status = 201, description = "Quiz created", body = Quiz),
        (status = 400, description = "Invalid questions, passing score or attempts", body = ErrorResponse),
        (status = 403, description = "Not the teacher of this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn quiz_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<QuizBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with_role(UserRole::AUTHORS)?;
    let course = find_course(state.pool(), user, course_id).await?;
    require_owner(state.pool(), user, &course).await?;

    let data = quiz_data(course_id, payload)?;
    let created = Quiz::create(state.pool(), user, data)
        .await
        .map_err(quiz_error)?;

    refresh_course_progress(state.pool(), user, course_id).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes/{id}",
    params(("id" = Uuid, Path, description = "Quiz id")),
    description = "Students get the questions without answers, the course teacher and admins get the full quiz",
    responses(
        (status = 200, description = "Quiz", body = QuizView),
        (status = 403, description = "Not enrolled in the course", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn quiz_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = find_quiz(state.pool(), user, id).await?;
    let course = find_course(state.pool(), user, quiz.course_id()).await?;

    let view = match require_content_access(state.pool(), user, &course, ResourceType::Quiz).await? {
        ContentAccess::Author => QuizView::Full(quiz),
        ContentAccess::Learner => QuizView::Public(QuizPublicResponse::from(&quiz)),
    };

    Ok((StatusCode::OK, Json(view)))
}

#[utoipa::path(
    put,
    path = "/api/v1/quizzes/{id}",
    params(("id" = Uuid, Path, description = "Quiz id")),
    request_body = QuizBody,
    responses(
        (status = 200, description = "Quiz updated", body = Quiz),
        (status = 400, description = "Invalid questions, passing score or attempts", body = ErrorResponse),
        (status = 403, description = "Not the teacher of this course", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn quiz_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuizBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = find_quiz(state.pool(), user, id).await?;
    require_owner(state.pool(), user, &quiz).await?;

    // stored submissions keep their `passed` flag, so progress is unaffected
    let data = quiz_data(quiz.course_id(), payload)?;
    let updated = quiz
        .update(state.pool(), user, data)
        .await
        .map_err(quiz_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/quizzes/{id}",
    params(("id" = Uuid, Path, description = "Quiz id")),
    responses(
        (status = 200, description = "Quiz deleted"),
        (status = 403, description = "Not the teacher of this course", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn quiz_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = find_quiz(state.pool(), user, id).await?;
    require_owner(state.pool(), user, &quiz).await?;

    let course_id = quiz.course_id();
    quiz.delete(state.pool(), user).await.map_err(quiz_error)?;

    refresh_course_progress(state.pool(), user, course_id).await?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/quizzes/{id}/submit",
    params(("id" = Uuid, Path, description = "Quiz id")),
    request_body = QuizSubmitBody,
    responses(
        (status = 201, description = "Graded submission", body = QuizSubmitResponse),
        (status = 400, description = "Answers do not match the questions", body = ErrorResponse),
        (status = 403, description = "Not a student or not enrolled", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 409, description = "No attempts left", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
#[tracing::instrument(skip(ctx, state, payload))]
pub(crate) async fn quiz_submit_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuizSubmitBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with_role(UserRole::LEARNERS)?;
    let quiz = find_quiz(state.pool(), user, id).await?;
    require_enrollment(state.pool(), user, quiz.course_id()).await?;

    let grade = quiz
        .grade(&payload.answers)
        .map_err(|e| WebError::bad_request(e.to_string()))?;

    // submits of one student serialize on the enrollment row until commit
    let mut tx = state
        .pool()
        .executor()
        .begin()
        .await
        .map_err(|e| submission_error(e.into()))?;

    Enrollment::lock_for_user(&mut *tx, user.user_id(), quiz.course_id())
        .await
        .map_err(submission_error)?
        .ok_or_else(|| WebError::resource_forbidden(Enrollment::get_resource_type()))?;

    if let Some(max_attempts) = quiz.max_attempts() {
        let attempts = QuizSubmission::count_attempts(&mut *tx, user, user.user_id(), id)
            .await
            .map_err(submission_error)?;
        if attempts >= i64::from(max_attempts) {
            return Err(WebError::resource_conflict(
                QuizSubmission::get_resource_type(),
                format!("all {max_attempts} attempts are used"),
            ));
        }
    }

    let results = grade.results.clone();
    let submission = QuizSubmission::create(
        &mut *tx,
        user,
        QuizSubmissionCreate {
            user_id: user.user_id(),
            quiz_id: id,
            answers: payload.answers,
            grade,
        },
    )
    .await
    .map_err(submission_error)?;

    tx.commit().await.map_err(|e| submission_error(e.into()))?;

    let enrollment = update_enrollment_progress(state.pool(), user, user.user_id(), quiz.course_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Enrollment::get_resource_type()))?;

    tracing::info!(
        percentage = submission.percentage(),
        passed = submission.passed(),
        "quiz submitted"
    );

    let response = QuizSubmitResponse {
        submission,
        results,
        course_progress: enrollment.progress(),
        course_completed: enrollment.completed_at().is_some(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes/{id}/submissions",
    params(("id" = Uuid, Path, description = "Quiz id")),
    description = "Students see their own submissions, the course teacher and admins see all of them. Newest first.",
    responses(
        (status = 200, description = "Submissions", body = Vec<QuizSubmission>),
        (status = 403, description = "Not enrolled in the course", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
    ),
    tag = "quizzes",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn quiz_submissions_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = find_quiz(state.pool(), user, id).await?;
    let course = find_course(state.pool(), user, quiz.course_id()).await?;

    let only_user = submissions_scope(
        user,
        require_content_access(state.pool(), user, &course, ResourceType::QuizSubmission).await?,
    );
    let submissions = QuizSubmission::all_by_quiz(state.pool(), user, id, only_user)
        .await
        .map_err(submission_error)?;

    Ok((StatusCode::OK, Json(submissions)))
}

fn submissions_scope(user: &AuthenticatedUser, access: ContentAccess) -> Option<Uuid> {
    match access {
        ContentAccess::Author => None,
        ContentAccess::Learner => Some(user.user_id()),
    }
}
