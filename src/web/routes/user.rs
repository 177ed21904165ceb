use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    auth::{hash_password, verify_dummy_password, verify_password},
    model::{
        CrudRepository, DatabaseError, ResourceTyped,
        entity::{ModerationAction, UserEntity, UserEntityCreateUpdate},
    },
    utils::validate::{validate_email, validate_password, validate_username},
    web::{
        AppState, AuthenticatedUser, RequestContext, UserRole, WebError, WebResult,
        dto::users::{PasswordChangeBody, SigninBody, SignupBody, UserListQuery, UserUpdateBody},
        error::ErrorResponse,
        middlewares::{self, clear_auth_cookie, set_auth_cookie},
        routes::{find_user, page_bounds, require_owner},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/page", get(user_list_handler))
        .route("/me", get(user_me_handler))
        .route("/verify", get(user_verify_handler))
        .route("/password", put(user_password_handler))
        .route(
            "/{id}",
            put(user_update_handler).delete(user_delete_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/signup", post(user_signup_handler))
        .route("/signin", post(user_signin_handler))
        .route("/signout", post(user_signout_handler))
        .merge(protected)
        .with_state(state)
}

fn user_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(UserEntity::get_resource_type(), e)
}

/// A unique violation that slipped past `find_conflicting` is still a conflict.
fn identity_write_error(e: DatabaseError) -> WebError {
    if e.is_unique_violation() {
        WebError::registration_conflict()
    } else {
        user_error(e)
    }
}

fn validate_identity(username: &str, email: &str) -> WebResult<()> {
    validate_username(username).map_err(WebError::bad_request)?;
    validate_email(email).map_err(WebError::bad_request)?;
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signup",
    request_body = SignupBody,
    description = "Registers a student or teacher account and signs it in",
    responses(
        (status = 200, description = "User created successfully", body = UserEntity),
        (status = 400, description = "Invalid username, email, password or role", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account"
)]
#[tracing::instrument(skip_all)]
pub(crate) async fn user_signup_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<SignupBody>,
) -> WebResult<impl IntoResponse> {
    validate_identity(&payload.username, &payload.email)?;
    validate_password(&payload.password).map_err(WebError::bad_request)?;

    let role = payload.role.unwrap_or(UserRole::Student);
    if role == UserRole::Admin {
        return Err(WebError::bad_request("admin accounts cannot be registered"));
    }

    let admin = AuthenticatedUser::admin();
    let conflict =
        UserEntity::find_conflicting(state.pool(), &admin, &payload.username, &payload.email, None)
            .await
            .map_err(user_error)?;
    if conflict.is_some() {
        return Err(WebError::registration_conflict());
    }

    let password_hash = hash_password(&payload.password).map_err(WebError::server_crypt_error)?;
    let data = UserEntityCreateUpdate {
        username: payload.username,
        email: payload.email,
        password_hash,
        role,
    };

    let created = UserEntity::create(state.pool(), &admin, data)
        .await
        .map_err(identity_write_error)?;

    set_auth_cookie(&cookies, created.id()).await?;
    tracing::info!(id = %created.id(), role = %role, "user registered");

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signin",
    description = "Authorizes user in the system",
    request_body = SigninBody,
    responses(
        (status = 200, description = "User signed in", body = UserEntity),
        (status = 401, description = "Credentials invalid", body = ErrorResponse),
        (status = 403, description = "Account is banned", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
)]
#[tracing::instrument(skip_all)]
pub(crate) async fn user_signin_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<SigninBody>,
) -> WebResult<impl IntoResponse> {
    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_username(state.pool(), &admin, &payload.username)
        .await
        .map_err(user_error)?;
    let Some(found) = found else {
        verify_dummy_password(&payload.password);
        return Err(WebError::auth_invalid_credentials());
    };

    let is_verified =
        verify_password(found.hash(), &payload.password).map_err(WebError::server_crypt_error)?;
    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    if found.is_banned() {
        return Err(WebError::account_banned());
    }

    set_auth_cookie(&cookies, found.id()).await?;

    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signout",
    description = "Removes the session cookie",
    responses(
        (status = 200, description = "Signed out"),
    ),
    tag = "account",
)]
pub(crate) async fn user_signout_handler(cookies: Cookies) -> impl IntoResponse {
    clear_auth_cookie(&cookies);
    StatusCode::OK
}

#[utoipa::path(
    get,
    path = "/api/v1/account/me",
    responses(
        (status = 200, description = "Current user", body = UserEntity),
        (status = 401, description = "Not signed in", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn user_me_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = find_user(state.pool(), user, user.user_id()).await?;

    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/verify",
    responses(
        (status = 200, description = "Session is valid"),
        (status = 401, description = "Not signed in"),
    ),
    tag = "account",
)]
pub(crate) async fn user_verify_handler(ctx: RequestContext) -> StatusCode {
    match ctx.maybe_user() {
        Some(_) => StatusCode::OK,
        None => StatusCode::UNAUTHORIZED,
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/account/password",
    request_body = PasswordChangeBody,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "New password is too weak", body = ErrorResponse),
        (status = 401, description = "Old password is wrong", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn user_password_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<PasswordChangeBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = find_user(state.pool(), user, user.user_id()).await?;

    let is_verified = verify_password(found.hash(), &payload.old_password)
        .map_err(WebError::server_crypt_error)?;
    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    validate_password(&payload.new_password).map_err(WebError::bad_request)?;
    let hash = hash_password(&payload.new_password).map_err(WebError::server_crypt_error)?;

    found
        .set_password(state.pool(), user, hash)
        .await
        .map_err(user_error)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/account/page",
    params(UserListQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<UserEntity>),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn user_list_handler(
    ctx: RequestContext,
    Query(query): Query<UserListQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with_role(UserRole::ADMINS)?;
    let (limit, offset) = page_bounds(query.limit, query.offset);

    let users = UserEntity::page_filtered(state.pool(), user, &query.filter(), limit, offset)
        .await
        .map_err(user_error)?;

    Ok((StatusCode::OK, Json(users)))
}

#[utoipa::path(
    put,
    path = "/api/v1/account/{id}",
    request_body = UserUpdateBody,
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User updated successfully", body = UserEntity),
        (status = 400, description = "Invalid username or email", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You doesn't have enough permissions to do this", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn user_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = find_user(state.pool(), user, id).await?;
    require_owner(state.pool(), user, &found).await?;
    validate_identity(&payload.username, &payload.email)?;

    let conflict =
        UserEntity::find_conflicting(state.pool(), user, &payload.username, &payload.email, Some(id))
            .await
            .map_err(user_error)?;
    if conflict.is_some() {
        return Err(WebError::registration_conflict());
    }

    let data = UserEntityCreateUpdate {
        username: payload.username,
        email: payload.email,
        password_hash: String::new(), // not in use
        role: found.role(),
    };

    let updated = found
        .update(state.pool(), user, data)
        .await
        .map_err(identity_write_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/account/{id}",
    description = "Deletes own account, or any non-admin account when called by an admin",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted successfully"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
pub(crate) async fn user_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = find_user(state.pool(), user, id).await?;

    let is_self = found.id() == user.user_id();
    if !is_self {
        if !user.is_admin() {
            return Err(WebError::resource_forbidden(UserEntity::get_resource_type()));
        }
        found.check_moderation(user.user_id(), ModerationAction::Delete)?;
    }

    found
        .delete(state.pool(), user)
        .await
        .map_err(user_error)?;

    if is_self {
        clear_auth_cookie(&cookies);
    }
    tracing::info!(%id, by = %user.user_id(), "user deleted");

    Ok(StatusCode::OK)
}
