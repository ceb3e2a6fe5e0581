/// Public profiles
///
/// One profile per user, keyed by the same UUID as the identity in `users`.
/// The `banned` flag lives here so that it survives deletion of the identity.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE profiles (
///     user_id UUID PRIMARY KEY,
///     username VARCHAR(50) NOT NULL UNIQUE,
///     bio TEXT,
///     avatar_url VARCHAR(512),
///     banned BOOLEAN NOT NULL DEFAULT FALSE,
///     banned_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const PROFILE_COLUMNS: &str =
    "user_id, username, bio, avatar_url, banned, banned_at, created_at, updated_at";

/// Public profile of a user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    /// Same ID as the identity in `users`
    pub user_id: Uuid,

    /// Unique handle shown in the UI
    pub username: String,

    /// Free-form biography
    pub bio: Option<String>,

    /// Avatar URL
    pub avatar_url: Option<String>,

    /// Set by the ban cascade; never cleared automatically
    pub banned: bool,

    /// When the ban was applied
    pub banned_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compact profile used in follower lists, comments and forum threads
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProfileSummary {
    pub user_id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// Aggregate counts displayed on a profile page
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProfileStats {
    pub followers: i64,
    pub following: i64,
    pub approved_courses: i64,
}

/// Input for creating a profile
#[derive(Debug, Clone)]
pub struct CreateProfile {
    pub user_id: Uuid,
    pub username: String,
}

/// Fields a user may change on their own profile
///
/// Only `Some` fields are written. Use `Some(None)` to clear an optional field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfile {
    pub username: Option<String>,
    pub bio: Option<Option<String>>,
    pub avatar_url: Option<Option<String>>,
}

impl UpdateProfile {
    /// True if no field would change
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.bio.is_none() && self.avatar_url.is_none()
    }
}

impl Profile {
    /// Creates a profile
    ///
    /// # Errors
    ///
    /// Returns an error if the username is taken (`profiles_username_key`)
    /// or a profile already exists for the user.
    pub async fn create(pool: &PgPool, data: CreateProfile) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO profiles (user_id, username) VALUES ($1, $2) RETURNING {}",
            PROFILE_COLUMNS
        );

        sqlx::query_as::<_, Profile>(&query)
            .bind(data.user_id)
            .bind(data.username)
            .fetch_one(pool)
            .await
    }

    /// Finds a profile by user ID
    pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM profiles WHERE user_id = $1", PROFILE_COLUMNS);

        sqlx::query_as::<_, Profile>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a profile by username
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM profiles WHERE username = $1", PROFILE_COLUMNS);

        sqlx::query_as::<_, Profile>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Updates the non-`None` fields of a profile
    ///
    /// # Returns
    ///
    /// The updated profile, or None if it doesn't exist
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE profiles SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.username.is_some() {
            bind_count += 1;
            query.push_str(&format!(", username = ${}", bind_count));
        }
        if data.bio.is_some() {
            bind_count += 1;
            query.push_str(&format!(", bio = ${}", bind_count));
        }
        if data.avatar_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", avatar_url = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE user_id = $1 RETURNING {}", PROFILE_COLUMNS));

        let mut q = sqlx::query_as::<_, Profile>(&query).bind(user_id);

        if let Some(username) = data.username {
            q = q.bind(username);
        }
        if let Some(bio) = data.bio {
            q = q.bind(bio);
        }
        if let Some(avatar_url) = data.avatar_url {
            q = q.bind(avatar_url);
        }

        q.fetch_optional(pool).await
    }

    /// Returns true if the profile exists and is banned
    pub async fn is_banned(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let banned: Option<bool> =
            sqlx::query_scalar("SELECT banned FROM profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;

        Ok(banned.unwrap_or(false))
    }

    /// Sets `banned = true` and stamps `banned_at`
    pub async fn mark_banned(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET banned = TRUE, banned_at = NOW(), updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Lists profiles, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM profiles ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            PROFILE_COLUMNS
        );

        sqlx::query_as::<_, Profile>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Counts profiles, split into (total, banned)
    pub async fn count(pool: &PgPool) -> Result<(i64, i64), sqlx::Error> {
        sqlx::query_as("SELECT COUNT(*), COUNT(*) FILTER (WHERE banned) FROM profiles")
            .fetch_one(pool)
            .await
    }

    /// Follower, following and approved-course counts for a profile
    pub async fn stats(pool: &PgPool, user_id: Uuid) -> Result<ProfileStats, sqlx::Error> {
        sqlx::query_as::<_, ProfileStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM user_follows WHERE following_id = $1) AS followers,
                (SELECT COUNT(*) FROM user_follows WHERE follower_id = $1) AS following,
                (SELECT COUNT(*) FROM courses
                    WHERE author_id = $1 AND status = 'approved') AS approved_courses
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}

/// Checks a username: 3-30 characters of ASCII letters, digits, `_` or `-`
pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if !(3..=30).contains(&len) {
        return Err("Username must be 3-30 characters".to_string());
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err("Username may only contain letters, digits, '_' and '-'".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_profile_default_is_empty() {
        assert!(UpdateProfile::default().is_empty());

        let update = UpdateProfile {
            bio: Some(None),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("rustacean").is_ok());
        assert!(validate_username("a_b-c").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"x".repeat(31)).is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("émile").is_err());
    }
}
