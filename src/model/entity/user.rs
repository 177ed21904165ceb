use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::web::AuthenticatedUser;
use crate::web::UserRole;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{ModelManager, Page, error::DatabaseResult, repo::CrudRepository};

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct UserEntity {
    id: uuid::Uuid,
    username: String,
    email: String,
    #[serde(skip)]
    password_hash: String,
    role: String,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct UserEntityCreateUpdate {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Banned,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Banned => "banned",
        }
    }
}

impl From<&str> for UserStatus {
    fn from(value: &str) -> Self {
        match value {
            "banned" => Self::Banned,
            _ => Self::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Ban,
    Unban,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModerationError {
    #[error("admins cannot moderate themselves")]
    SelfModeration,
    #[error("admins cannot be moderated")]
    AdminTarget,
    #[error("user is already banned")]
    AlreadyBanned,
    #[error("user is not banned")]
    NotBanned,
}

/// Optional filters of the admin user listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

impl ResourceTyped for UserEntity {
    fn get_resource_type() -> crate::model::repo::ResourceType {
        crate::model::repo::ResourceType::User
    }
}

impl UserEntity {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }

    pub fn status(&self) -> UserStatus {
        UserStatus::from(self.status.as_str())
    }

    pub fn is_banned(&self) -> bool {
        self.status() == UserStatus::Banned
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    /// Validates an admin action against this user. Returns the status the
    /// user ends up in, `None` for deletion.
    pub fn check_moderation(
        &self,
        actor_id: Uuid,
        action: ModerationAction,
    ) -> Result<Option<UserStatus>, ModerationError> {
        if self.id == actor_id {
            return Err(ModerationError::SelfModeration);
        }
        if self.role() == UserRole::Admin {
            return Err(ModerationError::AdminTarget);
        }

        match (action, self.status()) {
            (ModerationAction::Ban, UserStatus::Banned) => Err(ModerationError::AlreadyBanned),
            (ModerationAction::Ban, UserStatus::Active) => Ok(Some(UserStatus::Banned)),
            (ModerationAction::Unban, UserStatus::Active) => Err(ModerationError::NotBanned),
            (ModerationAction::Unban, UserStatus::Banned) => Ok(Some(UserStatus::Active)),
            (ModerationAction::Delete, _) => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl CrudRepository<UserEntity, UserEntityCreateUpdate, uuid::Uuid> for UserEntity {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreateUpdate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO users (id, username, email, password_hash, role, status)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(data.role.to_string())
        .bind(UserStatus::Active.as_str())
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    /// Updates username and email. Password, role and status have their own setters.
    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreateUpdate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE users SET username = $1, email = $2 WHERE id = $3")
            .bind(&data.username)
            .bind(&data.email)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.username = data.username;
        self.email = data.email;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM users ORDER BY created_at LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(UserEntity, UserEntityCreateUpdate, Uuid);

#[async_trait]
impl HasOwner for UserEntity {
    type OwnerId = uuid::Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.id) // owners of users are themselves
    }
}

impl UserEntity {
    pub async fn find_by_username(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        username: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Any user other than `except` holding this username or email.
    pub async fn find_conflicting(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        username: &str,
        email: &str,
        except: Option<Uuid>,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT * FROM users
            WHERE (username = $1 OR lower(email) = lower($2))
            AND ($3::uuid IS NULL OR id <> $3)
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(except)
        .fetch_optional(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn page_filtered(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        filter: &UserFilter,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Page<Self>> {
        let items = sqlx::query_as(
            r#"
            SELECT * FROM users
            WHERE ($1::text IS NULL OR role = $1)
            AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.role.map(|r| r.to_string()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE ($1::text IS NULL OR role = $1)
            AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(filter.role.map(|r| r.to_string()))
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_one(mm.executor())
        .await?;

        Ok(Page::new(items, total, limit, offset))
    }

    pub async fn set_password(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        password_hash: String,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(&password_hash)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.password_hash = password_hash;
        Ok(self)
    }

    pub async fn set_status(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        status: UserStatus,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE users SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.status = status.as_str().to_string();
        Ok(self)
    }

    /// Creates the configured administrator unless a user with that name exists.
    #[tracing::instrument(skip(mm, password))]
    pub async fn ensure_admin(
        mm: &ModelManager,
        username: &str,
        email: &str,
        password: &str,
    ) -> DatabaseResult<Self> {
        let actor = AuthenticatedUser::admin();
        if let Some(existing) = Self::find_by_username(mm, &actor, username).await? {
            return Ok(existing);
        }

        let password_hash = crate::auth::hash_password(password)?;
        let admin = Self::create(
            mm,
            &actor,
            UserEntityCreateUpdate {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role: UserRole::Admin,
            },
        )
        .await?;

        tracing::info!(id = %admin.id(), "bootstrap admin created");
        Ok(admin)
    }
}
