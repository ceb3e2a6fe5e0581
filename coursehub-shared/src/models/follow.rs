/// Follow graph
///
/// Directed edges `follower -> following`. Self-follows are rejected both
/// here and by a CHECK constraint.

use sqlx::PgPool;
use uuid::Uuid;

use super::profile::ProfileSummary;

/// Creates the edge; following twice is a no-op
///
/// # Returns
///
/// True if a new edge was created
pub async fn follow(pool: &PgPool, follower_id: Uuid, following_id: Uuid) -> Result<bool, sqlx::Error> {
    if follower_id == following_id {
        return Ok(false);
    }

    let result = sqlx::query(
        r#"
        INSERT INTO user_follows (follower_id, following_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(follower_id)
    .bind(following_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn unfollow(pool: &PgPool, follower_id: Uuid, following_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM user_follows WHERE follower_id = $1 AND following_id = $2")
        .bind(follower_id)
        .bind(following_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn is_following(pool: &PgPool, follower_id: Uuid, following_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM user_follows WHERE follower_id = $1 AND following_id = $2)",
    )
    .bind(follower_id)
    .bind(following_id)
    .fetch_one(pool)
    .await
}

/// Profiles following `user_id`, newest first
pub async fn followers(pool: &PgPool, user_id: Uuid) -> Result<Vec<ProfileSummary>, sqlx::Error> {
    sqlx::query_as::<_, ProfileSummary>(
        r#"
        SELECT p.user_id, p.username, p.avatar_url
        FROM user_follows f
        JOIN profiles p ON p.user_id = f.follower_id
        WHERE f.following_id = $1 AND p.banned = FALSE
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Profiles `user_id` follows, newest first
pub async fn following(pool: &PgPool, user_id: Uuid) -> Result<Vec<ProfileSummary>, sqlx::Error> {
    sqlx::query_as::<_, ProfileSummary>(
        r#"
        SELECT p.user_id, p.username, p.avatar_url
        FROM user_follows f
        JOIN profiles p ON p.user_id = f.following_id
        WHERE f.follower_id = $1 AND p.banned = FALSE
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
