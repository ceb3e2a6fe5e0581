/// Role rows
///
/// Roles are stored one row per (user, role). Every account gets `user` at
/// registration; staff additionally hold `moderator` or `admin`. Lookups are
/// never cached: route guards read the rows on every request.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE app_role AS ENUM ('user', 'moderator', 'admin');
///
/// CREATE TABLE user_roles (
///     user_id UUID NOT NULL REFERENCES profiles(user_id),
///     role app_role NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (user_id, role)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Application roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "app_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppRole {
    /// Regular member: publish, comment, rate, follow
    User,

    /// Reviews pending courses and edits, handles reports
    Moderator,

    /// Everything a moderator can do, plus users, roles, bans and categories
    Admin,
}

impl AppRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppRole::User => "user",
            AppRole::Moderator => "moderator",
            AppRole::Admin => "admin",
        }
    }

    /// Checks if this role includes the permissions of `required`
    ///
    /// Hierarchy: Admin > Moderator > User
    pub fn has_permission(&self, required: &AppRole) -> bool {
        self.level() >= required.level()
    }

    /// Moderators and admins
    pub fn is_staff(&self) -> bool {
        matches!(self, AppRole::Moderator | AppRole::Admin)
    }

    /// Highest role in a set of role rows (User when the set is empty)
    pub fn highest(roles: &[AppRole]) -> AppRole {
        roles
            .iter()
            .copied()
            .max_by_key(AppRole::level)
            .unwrap_or(AppRole::User)
    }

    fn level(&self) -> u8 {
        match self {
            AppRole::Admin => 3,
            AppRole::Moderator => 2,
            AppRole::User => 1,
        }
    }
}

/// One role row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRole {
    pub user_id: Uuid,
    pub role: AppRole,
    pub created_at: DateTime<Utc>,
}

impl UserRole {
    /// Grants a role; granting an existing role is a no-op
    ///
    /// # Returns
    ///
    /// True if a new row was inserted
    pub async fn grant(pool: &PgPool, user_id: Uuid, role: AppRole) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role)
            VALUES ($1, $2)
            ON CONFLICT (user_id, role) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All roles held by a user
    pub async fn roles_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<AppRole>, sqlx::Error> {
        sqlx::query_scalar::<_, AppRole>(
            "SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Replaces a user's staff role
    ///
    /// The user keeps the base `user` role; `moderator` and `admin` rows are
    /// replaced by `role` (or removed when `role` is `User`). Runs in a
    /// single transaction.
    pub async fn set_role(pool: &PgPool, user_id: Uuid, role: AppRole) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role <> 'user'")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for granted in [AppRole::User, role] {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(granted)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_hierarchy() {
        assert!(AppRole::Admin.has_permission(&AppRole::Moderator));
        assert!(AppRole::Admin.has_permission(&AppRole::User));
        assert!(AppRole::Moderator.has_permission(&AppRole::Moderator));
        assert!(!AppRole::Moderator.has_permission(&AppRole::Admin));
        assert!(!AppRole::User.has_permission(&AppRole::Moderator));
    }

    #[test]
    fn test_is_staff() {
        assert!(AppRole::Admin.is_staff());
        assert!(AppRole::Moderator.is_staff());
        assert!(!AppRole::User.is_staff());
    }

    #[test]
    fn test_highest_role() {
        assert_eq!(AppRole::highest(&[]), AppRole::User);
        assert_eq!(
            AppRole::highest(&[AppRole::User, AppRole::Admin, AppRole::Moderator]),
            AppRole::Admin
        );
        assert_eq!(
            AppRole::highest(&[AppRole::Moderator, AppRole::User]),
            AppRole::Moderator
        );
    }

    #[test]
    fn test_role_serde_lowercase() {
        let json = serde_json::to_string(&AppRole::Moderator).unwrap();
        assert_eq!(json, "\"moderator\"");

        let parsed: AppRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, AppRole::Admin);
    }
}
