use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::errors::ErrorKind;
use tower_cookies::{Cookie, Cookies, cookie::SameSite};
use uuid::Uuid;

use crate::{
    Config, auth,
    model::{CrudRepository, ResourceTyped, entity::UserEntity},
    web::{AppState, RequestContext, WebResult, context::AuthenticatedUser, error::WebError},
};

pub static AUTH_TOKEN: &str = "SID";

/// Resolves the `SID` cookie into a `RequestContext`. Requests without a
/// cookie, with an expired token, or whose user no longer exists continue
/// anonymously. A malformed token is rejected with 400.
pub async fn extract_context_fn(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    // signout leaves an empty cookie behind on some clients
    let token = match cookies.get(AUTH_TOKEN) {
        Some(token) if !token.value().is_empty() => token,
        _ => {
            req.extensions_mut().insert(RequestContext::new(None));
            return Ok(next.run(req).await);
        }
    };

    let jwt = Config::get_or_init(false).await.app().jwt();
    let claims = match auth::process_token(token.value(), jwt) {
        Ok(claims) => claims,
        Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
            tracing::debug!("session token expired");
            req.extensions_mut().insert(RequestContext::new(None));
            return Ok(next.run(req).await);
        }
        Err(e) => return Err(WebError::auth_cookie_invalid(AUTH_TOKEN, e)),
    };

    let Some(id) = claims.claims.user_id() else {
        tracing::warn!(sub = %claims.claims.sub, "token subject is not a user id");
        req.extensions_mut().insert(RequestContext::new(None));
        return Ok(next.run(req).await);
    };

    let found = UserEntity::find_by_id(state.pool(), &AuthenticatedUser::admin(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    match found {
        Some(user) if user.is_banned() => Err(WebError::account_banned()),
        Some(user) => {
            req.extensions_mut()
                .insert(RequestContext::new(Some(AuthenticatedUser::new(id, user.role()))));

            Ok(next.run(req).await)
        }
        None => {
            req.extensions_mut().insert(RequestContext::new(None));
            Ok(next.run(req).await)
        }
    }
}

/// Issues a session token for `user_id` and stores it in the `SID` cookie.
pub async fn set_auth_cookie(cookies: &Cookies, user_id: Uuid) -> WebResult<()> {
    let config = Config::get_or_init(false).await;
    let claims = auth::UserClaims::for_user(user_id, config.app().token_ttl_hours());
    let token = auth::generate_token(claims, config.app().jwt())
        .map_err(|e| WebError::server_crypt_error(e.into()))?;

    let mut cookie = Cookie::new(AUTH_TOKEN, token);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookies.add(cookie);
    Ok(())
}

pub fn clear_auth_cookie(cookies: &Cookies) {
    let mut cookie = Cookie::new(AUTH_TOKEN, "");
    cookie.set_path("/");
    cookies.remove(cookie);
}
