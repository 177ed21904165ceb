use crate::{
    model::{
        ModelManager,
        error::{DatabaseError, DatabaseResult},
    },
    web::{AuthenticatedUser, UserRole},
};

/// Resources that belong to a single user. For course content the owner is
/// the teacher of the course the resource lives in.
#[async_trait::async_trait]
pub trait HasOwner {
    type OwnerId: PartialEq + Send + Sync;
    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        ctx: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId>;
}

pub async fn check_access<T: HasOwner<OwnerId = O>, O: PartialEq + Send + Sync>(
    mm: &ModelManager,
    ctx: &AuthenticatedUser,
    resource: &T,
    expected: O,
) -> DatabaseResult<()> {
    // admin can get all resources
    if ctx.user_role() == UserRole::Admin {
        return Ok(());
    }

    let actual_owner = resource.get_owner_id(mm, ctx).await?;

    if actual_owner == expected {
        Ok(())
    } else {
        Err(DatabaseError::Forbidden)
    }
}

/// `check_access` against the acting user.
pub async fn check_owner<T: HasOwner<OwnerId = uuid::Uuid> + Sync>(
    mm: &ModelManager,
    ctx: &AuthenticatedUser,
    resource: &T,
) -> DatabaseResult<()> {
    check_access(mm, ctx, resource, ctx.user_id()).await
}

/// Same as `check_owner` but never errors, for read paths that branch on it.
pub async fn is_owner<T: HasOwner<OwnerId = uuid::Uuid> + Sync>(
    mm: &ModelManager,
    ctx: &AuthenticatedUser,
    resource: &T,
) -> DatabaseResult<bool> {
    match check_owner(mm, ctx, resource).await {
        Ok(()) => Ok(true),
        Err(DatabaseError::Forbidden) => Ok(false),
        Err(e) => Err(e),
    }
}
