use serde::Deserialize;

use crate::{
    model::entity::{UserFilter, UserStatus},
    web::UserRole,
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SignupBody {
    pub username: String,
    pub email: String,
    pub password: String,
    /// `student` (default) or `teacher`
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SigninBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UserUpdateBody {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PasswordChangeBody {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

impl UserListQuery {
    pub fn filter(&self) -> UserFilter {
        UserFilter {
            role: self.role,
            status: self.status,
        }
    }
}
