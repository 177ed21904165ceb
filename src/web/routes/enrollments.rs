use axum::{
    Json, Router, extract::State, http::StatusCode, middleware, response::IntoResponse,
    routing::get,
};

use crate::{
    model::{
        ResourceTyped,
        entity::{Enrollment, EnrollmentWithCourseRow},
    },
    web::{AppState, RequestContext, WebError, WebResult, error::ErrorResponse, middlewares},
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(enrollment_list_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/enrollments",
    description = "Enrollments of the current user with course titles, newest first",
    responses(
        (status = 200, description = "Enrollments", body = Vec<EnrollmentWithCourseRow>),
        (status = 401, description = "Not signed in", body = ErrorResponse),
    ),
    tag = "enrollments",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn enrollment_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let rows = EnrollmentWithCourseRow::fetch_for_user(state.pool(), user, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(rows)))
}
