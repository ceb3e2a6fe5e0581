/// Role and ownership checks for handlers
///
/// Route guards protect whole areas; these helpers cover the finer checks
/// inside ordinary routes, such as "only the author or staff may delete
/// this comment".
///
/// # Example
///
/// ```no_run
/// use coursehub_shared::auth::authorization::require_owner_or_staff;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, caller: Uuid, author: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// require_owner_or_staff(&pool, caller, author).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::role::{AppRole, UserRole};

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Not authorized to modify this resource")]
    NotOwner,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Highest role of a user, read from `user_roles`
pub async fn effective_role(pool: &PgPool, user_id: Uuid) -> Result<AppRole, sqlx::Error> {
    let roles = UserRole::roles_for_user(pool, user_id).await?;
    Ok(AppRole::highest(&roles))
}

/// Whether `role` acting as `actor` may modify something owned by `owner`
pub fn may_modify(actor: Uuid, owner: Uuid, role: AppRole) -> bool {
    actor == owner || role.is_staff()
}

/// Owners may always act on their own rows; anyone else must be staff
///
/// # Returns
///
/// True when access was granted through staff rights rather than ownership
pub async fn require_owner_or_staff(pool: &PgPool, actor: Uuid, owner: Uuid) -> Result<bool, AuthzError> {
    if actor == owner {
        return Ok(false);
    }

    let role = effective_role(pool, actor).await?;
    if !may_modify(actor, owner, role) {
        return Err(AuthzError::NotOwner);
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_may_modify() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(may_modify(owner, owner, AppRole::User));
        assert!(!may_modify(other, owner, AppRole::User));
        assert!(may_modify(other, owner, AppRole::Moderator));
        assert!(may_modify(other, owner, AppRole::Admin));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(AuthzError::NotOwner.to_string(), "Not authorized to modify this resource");
    }
}
