mod auth;
pub use auth::{AUTH_TOKEN, clear_auth_cookie, extract_context_fn, set_auth_cookie};
