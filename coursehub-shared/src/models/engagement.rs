/// Likes, saves and views
///
/// Likes and saves are toggles keyed by (user, course). Views are counted
/// once per client session: the `(course_id, session_id)` unique key makes a
/// repeated view from the same session a no-op.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::course::Course;

/// Toggle-style interactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engagement {
    Like,
    Save,
}

impl Engagement {
    fn table(&self) -> &'static str {
        match self {
            Engagement::Like => "course_likes",
            Engagement::Save => "course_saves",
        }
    }
}

/// State after a toggle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// Whether the user now likes/saves the course
    pub active: bool,

    /// Recomputed counter on the course
    pub count: i64,
}

/// Flips a like or save for (user, course)
///
/// Deletes the row if it exists, inserts it otherwise, then recomputes the
/// course counters.
pub async fn toggle(
    pool: &PgPool,
    kind: Engagement,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<ToggleOutcome, sqlx::Error> {
    let table = kind.table();

    let removed = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND course_id = $2",
        table
    ))
    .bind(user_id)
    .bind(course_id)
    .execute(pool)
    .await?
    .rows_affected()
        > 0;

    if !removed {
        sqlx::query(&format!(
            "INSERT INTO {} (user_id, course_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            table
        ))
        .bind(user_id)
        .bind(course_id)
        .execute(pool)
        .await?;
    }

    Course::refresh_counters(pool, &[course_id]).await?;

    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE course_id = $1",
        table
    ))
    .bind(course_id)
    .fetch_one(pool)
    .await?;

    debug!(?kind, %user_id, %course_id, active = !removed, "Engagement toggled");

    Ok(ToggleOutcome {
        active: !removed,
        count,
    })
}

/// Whether the user currently likes/saves the course
pub async fn is_active(
    pool: &PgPool,
    kind: Engagement,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(&format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = $1 AND course_id = $2)",
        kind.table()
    ))
    .bind(user_id)
    .bind(course_id)
    .fetch_one(pool)
    .await
}

/// Records a view for a session and bumps `view_count` if it is new
///
/// # Returns
///
/// True if this (course, session) pair had not been seen before
pub async fn record_view(
    pool: &PgPool,
    course_id: Uuid,
    user_id: Option<Uuid>,
    session_id: &str,
) -> Result<bool, sqlx::Error> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO course_views (course_id, user_id, session_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (course_id, session_id) DO NOTHING
        "#,
    )
    .bind(course_id)
    .bind(user_id)
    .bind(session_id)
    .execute(pool)
    .await?
    .rows_affected()
        > 0;

    if inserted {
        Course::increment_view_count(pool, course_id).await?;
    }

    Ok(inserted)
}
