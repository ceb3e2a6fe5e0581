/// Course ratings
///
/// A user has at most one rating per course. Submitting again updates the
/// existing row (`course_ratings_user_course_key`), and the course's
/// `rating_avg`/`rating_count` are recomputed afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::course::Course;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseRating {
    pub id: Uuid,
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CourseRating {
    /// Inserts or updates the caller's rating, then refreshes the course
    /// counters
    ///
    /// Idempotent per (user, course): the second call updates the first row.
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        course_id: Uuid,
        rating: i16,
    ) -> Result<Self, sqlx::Error> {
        let row = sqlx::query_as::<_, CourseRating>(
            r#"
            INSERT INTO course_ratings (course_id, user_id, rating)
            VALUES ($1, $2, $3)
            ON CONFLICT ON CONSTRAINT course_ratings_user_course_key
            DO UPDATE SET rating = EXCLUDED.rating, updated_at = NOW()
            RETURNING id, course_id, user_id, rating, created_at, updated_at
            "#,
        )
        .bind(course_id)
        .bind(user_id)
        .bind(rating)
        .fetch_one(pool)
        .await?;

        Course::refresh_counters(pool, &[course_id]).await?;

        Ok(row)
    }

    /// The caller's current rating of a course, if any
    pub async fn find(
        pool: &PgPool,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CourseRating>(
            r#"
            SELECT id, course_id, user_id, rating, created_at, updated_at
            FROM course_ratings
            WHERE user_id = $1 AND course_id = $2
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn count_for_course(pool: &PgPool, course_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM course_ratings WHERE course_id = $1")
            .bind(course_id)
            .fetch_one(pool)
            .await
    }
}

