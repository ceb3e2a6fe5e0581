/// Pending edits of approved courses
///
/// An approved course stays live while its author's changes wait for a
/// moderator. Each `None` field of an edit means "unchanged".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::course::{CourseChanges, CourseStatus};

const EDIT_COLUMNS: &str = "id, course_id, author_id, title, description, video_url, \
    thumbnail_url, category_id, status, created_at, moderated_at, moderated_by";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseEdit {
    pub id: Uuid,
    pub course_id: Uuid,
    pub author_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub moderated_by: Option<Uuid>,
}

impl CourseEdit {
    /// Stores a pending edit for a course
    pub async fn create(
        pool: &PgPool,
        course_id: Uuid,
        author_id: Uuid,
        changes: &CourseChanges,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO course_edits (course_id, author_id, title, description, video_url,
                                      thumbnail_url, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            EDIT_COLUMNS
        );

        sqlx::query_as::<_, CourseEdit>(&query)
            .bind(course_id)
            .bind(author_id)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(&changes.video_url)
            .bind(&changes.thumbnail_url)
            .bind(changes.category_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM course_edits WHERE id = $1", EDIT_COLUMNS);

        sqlx::query_as::<_, CourseEdit>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Pending edits, oldest first
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM course_edits WHERE status = 'pending' ORDER BY created_at ASC",
            EDIT_COLUMNS
        );

        sqlx::query_as::<_, CourseEdit>(&query).fetch_all(pool).await
    }

    /// Marks an edit approved or rejected
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: CourseStatus,
        moderator_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE course_edits
            SET status = $2, moderated_at = NOW(), moderated_by = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(moderator_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Copies the edit's non-NULL fields onto its course
    pub async fn apply_to_course(pool: &PgPool, edit: &CourseEdit) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE courses SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                video_url = COALESCE($4, video_url),
                thumbnail_url = COALESCE($5, thumbnail_url),
                category_id = COALESCE($6, category_id),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(edit.course_id)
        .bind(&edit.title)
        .bind(&edit.description)
        .bind(&edit.video_url)
        .bind(&edit.thumbnail_url)
        .bind(edit.category_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Number of edits awaiting review
    pub async fn count_pending(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM course_edits WHERE status = 'pending'")
            .fetch_one(pool)
            .await
    }
}
