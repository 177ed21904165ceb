//! Platform moderation. Every route here requires the admin role.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, DatabaseError, ResourceTyped,
        entity::{Course, ModerationAction, PlatformStats, UserEntity, UserStatus},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, UserRole, WebError, WebResult,
        dto::users::UserListQuery,
        error::ErrorResponse,
        middlewares,
        routes::{find_course, find_user, page_bounds},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/stats", get(admin_stats_handler))
        .route("/users", get(admin_users_handler))
        .route("/users/{id}", delete(admin_delete_user_handler))
        .route("/users/{id}/ban", post(admin_ban_handler))
        .route("/users/{id}/unban", post(admin_unban_handler))
        .route("/courses/{id}/unpublish", post(admin_unpublish_course_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn user_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(UserEntity::get_resource_type(), e)
}

/// Ban or unban after the moderation guard approved the transition.
async fn moderate(
    state: &AppState,
    admin: &AuthenticatedUser,
    id: Uuid,
    action: ModerationAction,
) -> WebResult<UserEntity> {
    let target = find_user(state.pool(), admin, id).await?;
    let status = target
        .check_moderation(admin.user_id(), action)?
        .unwrap_or(UserStatus::Active);

    let updated = target
        .set_status(state.pool(), admin, status)
        .await
        .map_err(user_error)?;
    tracing::info!(%id, status = status.as_str(), by = %admin.user_id(), "user moderated");

    Ok(updated)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    responses(
        (status = 200, description = "Platform counters", body = PlatformStats),
        (status = 403, description = "Admins only", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn admin_stats_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.user_with_role(UserRole::ADMINS)?;

    let stats = PlatformStats::fetch(state.pool(), admin)
        .await
        .map_err(user_error)?;

    Ok((StatusCode::OK, Json(stats)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<UserEntity>),
        (status = 403, description = "Admins only", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn admin_users_handler(
    ctx: RequestContext,
    Query(query): Query<UserListQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.user_with_role(UserRole::ADMINS)?;
    let (limit, offset) = page_bounds(query.limit, query.offset);

    let page = UserEntity::page_filtered(state.pool(), admin, &query.filter(), limit, offset)
        .await
        .map_err(user_error)?;

    Ok((StatusCode::OK, Json(page)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{id}/ban",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User banned", body = UserEntity),
        (status = 400, description = "Admins cannot ban themselves", body = ErrorResponse),
        (status = 403, description = "Admins cannot be banned", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "User is already banned", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn admin_ban_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.user_with_role(UserRole::ADMINS)?;
    let updated = moderate(&state, admin, id, ModerationAction::Ban).await?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{id}/unban",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User unbanned", body = UserEntity),
        (status = 400, description = "Admins cannot unban themselves", body = ErrorResponse),
        (status = 403, description = "Admins cannot be moderated", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "User is not banned", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn admin_unban_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.user_with_role(UserRole::ADMINS)?;
    let updated = moderate(&state, admin, id, ModerationAction::Unban).await?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "Admins cannot delete themselves here", body = ErrorResponse),
        (status = 403, description = "Admins cannot be deleted", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn admin_delete_user_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.user_with_role(UserRole::ADMINS)?;
    let target = find_user(state.pool(), admin, id).await?;
    target.check_moderation(admin.user_id(), ModerationAction::Delete)?;

    target
        .delete(state.pool(), admin)
        .await
        .map_err(user_error)?;
    tracing::info!(%id, by = %admin.user_id(), "user deleted by admin");

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/courses/{id}/unpublish",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course unpublished", body = Course),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    tag = "admin",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn admin_unpublish_course_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let admin = ctx.user_with_role(UserRole::ADMINS)?;
    let course = find_course(state.pool(), admin, id).await?;

    let updated = course
        .set_published(state.pool(), admin, false)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;
    tracing::info!(%id, by = %admin.user_id(), "course unpublished by admin");

    Ok((StatusCode::OK, Json(updated)))
}
