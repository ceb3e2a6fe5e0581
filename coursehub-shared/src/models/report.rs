/// Course reports filed by members
///
/// Reports are cleared when a moderator decides on the course.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseReport {
    pub id: Uuid,
    pub course_id: Uuid,
    pub reporter_id: Uuid,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Report row with the course title and reporter name for the review queue
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OpenCourseReport {
    pub id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub reporter_id: Uuid,
    pub reporter_username: Option<String>,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl CourseReport {
    pub async fn create(
        pool: &PgPool,
        course_id: Uuid,
        reporter_id: Uuid,
        reason: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CourseReport>(
            r#"
            INSERT INTO course_reports (course_id, reporter_id, reason)
            VALUES ($1, $2, $3)
            RETURNING id, course_id, reporter_id, reason, created_at
            "#,
        )
        .bind(course_id)
        .bind(reporter_id)
        .bind(reason.trim())
        .fetch_one(pool)
        .await
    }

    /// All reports, oldest first
    pub async fn list_open(pool: &PgPool) -> Result<Vec<OpenCourseReport>, sqlx::Error> {
        sqlx::query_as::<_, OpenCourseReport>(
            r#"
            SELECT r.id, r.course_id, c.title AS course_title, r.reporter_id,
                   p.username AS reporter_username, r.reason, r.created_at
            FROM course_reports r
            JOIN courses c ON c.id = r.course_id
            LEFT JOIN profiles p ON p.user_id = r.reporter_id
            ORDER BY r.created_at ASC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Dismisses a single report
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM course_reports WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Clears every report for a course
    pub async fn delete_for_course(pool: &PgPool, course_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM course_reports WHERE course_id = $1")
            .bind(course_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn count_for_course(pool: &PgPool, course_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM course_reports WHERE course_id = $1")
            .bind(course_id)
            .fetch_one(pool)
            .await
    }
}
