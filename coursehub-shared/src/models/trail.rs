/// Learning trails
///
/// A trail is an ordered list of courses curated by one user. Positions in
/// `trail_courses` are kept dense (`0..n`) after every mutation: inserts and
/// reorders rewrite the whole order, removals re-compact it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::course::CourseStatus;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LearningTrail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trail with its course count for listings
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrailListing {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub course_count: i64,
    pub updated_at: DateTime<Utc>,
}

/// One course inside a trail
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrailEntry {
    pub course_id: Uuid,
    pub position: i32,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub status: CourseStatus,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTrail {
    pub title: String,
    pub description: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTrail {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub is_public: Option<bool>,
}

/// Inserts `id` at `position` (appends when `None` or past the end)
///
/// An id already present is moved rather than duplicated.
pub fn insert_at(order: &[Uuid], id: Uuid, position: Option<usize>) -> Vec<Uuid> {
    let mut next: Vec<Uuid> = order.iter().copied().filter(|c| *c != id).collect();
    let index = position.unwrap_or(next.len()).min(next.len());
    next.insert(index, id);
    next
}

/// Removes `id`, keeping the relative order of the rest
pub fn remove_from(order: &[Uuid], id: Uuid) -> Vec<Uuid> {
    order.iter().copied().filter(|c| *c != id).collect()
}

/// Trail operations that can fail on input as well as on the database
#[derive(Debug, thiserror::Error)]
pub enum TrailError {
    #[error("Expected {expected} course ids, got {got}")]
    WrongLength { expected: usize, got: usize },

    #[error("Course ids must be unique")]
    DuplicateCourse,

    #[error("Course ids must match the trail's courses")]
    UnknownCourse,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Checks that `requested` is a permutation of `current`
pub fn validate_reorder(current: &[Uuid], requested: &[Uuid]) -> Result<(), TrailError> {
    if current.len() != requested.len() {
        return Err(TrailError::WrongLength {
            expected: current.len(),
            got: requested.len(),
        });
    }

    let mut a = current.to_vec();
    let mut b = requested.to_vec();
    a.sort();
    b.sort();

    if b.windows(2).any(|w| w[0] == w[1]) {
        return Err(TrailError::DuplicateCourse);
    }
    if a != b {
        return Err(TrailError::UnknownCourse);
    }
    Ok(())
}

const TRAIL_COLUMNS: &str = "id, user_id, title, description, is_public, created_at, updated_at";

impl LearningTrail {
    pub async fn create(pool: &PgPool, user_id: Uuid, data: &CreateTrail) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO learning_trails (user_id, title, description, is_public)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            TRAIL_COLUMNS
        );

        sqlx::query_as::<_, LearningTrail>(&query)
            .bind(user_id)
            .bind(data.title.trim())
            .bind(&data.description)
            .bind(data.is_public)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM learning_trails WHERE id = $1", TRAIL_COLUMNS);

        sqlx::query_as::<_, LearningTrail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Public trails, most recently updated first
    pub async fn list_public(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<TrailListing>, sqlx::Error> {
        sqlx::query_as::<_, TrailListing>(
            r#"
            SELECT t.id, t.user_id, t.title, t.description, t.is_public,
                   (SELECT COUNT(*) FROM trail_courses tc WHERE tc.trail_id = t.id) AS course_count,
                   t.updated_at
            FROM learning_trails t
            WHERE t.is_public = TRUE
            ORDER BY t.updated_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<TrailListing>, sqlx::Error> {
        sqlx::query_as::<_, TrailListing>(
            r#"
            SELECT t.id, t.user_id, t.title, t.description, t.is_public,
                   (SELECT COUNT(*) FROM trail_courses tc WHERE tc.trail_id = t.id) AS course_count,
                   t.updated_at
            FROM learning_trails t
            WHERE t.user_id = $1
            ORDER BY t.updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: &UpdateTrail) -> Result<Option<Self>, sqlx::Error> {
        let mut builder = sqlx::QueryBuilder::new("UPDATE learning_trails SET updated_at = NOW()");

        if let Some(title) = &data.title {
            builder.push(", title = ").push_bind(title.trim().to_string());
        }
        if let Some(description) = &data.description {
            builder.push(", description = ").push_bind(description.clone());
        }
        if let Some(is_public) = data.is_public {
            builder.push(", is_public = ").push_bind(is_public);
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" RETURNING ").push(TRAIL_COLUMNS);

        builder
            .build_query_as::<LearningTrail>()
            .fetch_optional(pool)
            .await
    }

    /// Deletes the trail and its memberships
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM trail_courses WHERE trail_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM learning_trails WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Courses of a trail in position order
    pub async fn entries(pool: &PgPool, trail_id: Uuid) -> Result<Vec<TrailEntry>, sqlx::Error> {
        sqlx::query_as::<_, TrailEntry>(
            r#"
            SELECT tc.course_id, tc.position, c.title, c.thumbnail_url, c.status, tc.added_at
            FROM trail_courses tc
            JOIN courses c ON c.id = tc.course_id
            WHERE tc.trail_id = $1
            ORDER BY tc.position ASC
            "#,
        )
        .bind(trail_id)
        .fetch_all(pool)
        .await
    }

    async fn course_order(pool: &PgPool, trail_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT course_id FROM trail_courses WHERE trail_id = $1 ORDER BY position ASC, added_at ASC",
        )
        .bind(trail_id)
        .fetch_all(pool)
        .await
    }

    /// Adds a course at `position` (or at the end) and rewrites positions
    pub async fn add_course(
        pool: &PgPool,
        trail_id: Uuid,
        course_id: Uuid,
        position: Option<usize>,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        let current = Self::course_order(pool, trail_id).await?;
        let order = insert_at(&current, course_id, position);

        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO trail_courses (trail_id, course_id, position)
            VALUES ($1, $2, $3)
            ON CONFLICT (trail_id, course_id) DO NOTHING
            "#,
        )
        .bind(trail_id)
        .bind(course_id)
        .bind(order.len() as i32)
        .execute(&mut *tx)
        .await?;

        write_positions(&mut tx, trail_id, &order).await?;
        touch(&mut tx, trail_id).await?;

        tx.commit().await?;

        Ok(order)
    }

    /// Removes a course and closes the gap
    pub async fn remove_course(pool: &PgPool, trail_id: Uuid, course_id: Uuid) -> Result<bool, sqlx::Error> {
        let current = Self::course_order(pool, trail_id).await?;
        if !current.contains(&course_id) {
            return Ok(false);
        }
        let order = remove_from(&current, course_id);

        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM trail_courses WHERE trail_id = $1 AND course_id = $2")
            .bind(trail_id)
            .bind(course_id)
            .execute(&mut *tx)
            .await?;

        write_positions(&mut tx, trail_id, &order).await?;
        touch(&mut tx, trail_id).await?;

        tx.commit().await?;

        Ok(true)
    }

    /// Applies a full new order
    ///
    /// # Errors
    ///
    /// Any [`TrailError`] input variant when `order` is not a permutation of
    /// the trail's courses; nothing is written in that case.
    pub async fn reorder(pool: &PgPool, trail_id: Uuid, order: &[Uuid]) -> Result<(), TrailError> {
        let current = Self::course_order(pool, trail_id).await?;
        validate_reorder(&current, order)?;

        let mut tx = pool.begin().await?;
        write_positions(&mut tx, trail_id, order).await?;
        touch(&mut tx, trail_id).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Trails that contain any of the given courses
    pub async fn ids_containing(pool: &PgPool, course_ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT DISTINCT trail_id FROM trail_courses WHERE course_id = ANY($1)")
            .bind(course_ids)
            .fetch_all(pool)
            .await
    }

    /// Renumbers positions of the given trails to `0..n`, preserving order
    pub async fn compact_positions(pool: &PgPool, trail_ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        if trail_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE trail_courses t
            SET position = (r.rn - 1)::INTEGER
            FROM (
                SELECT trail_id, course_id,
                       ROW_NUMBER() OVER (PARTITION BY trail_id ORDER BY position, added_at) AS rn
                FROM trail_courses
                WHERE trail_id = ANY($1)
            ) r
            WHERE t.trail_id = r.trail_id
              AND t.course_id = r.course_id
              AND t.position <> (r.rn - 1)::INTEGER
            "#,
        )
        .bind(trail_ids)
        .execute(pool)
        .await?;

        debug!(trails = trail_ids.len(), rows = result.rows_affected(), "Trail positions compacted");

        Ok(result.rows_affected())
    }
}

async fn write_positions(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    trail_id: Uuid,
    order: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE trail_courses t
        SET position = (o.ord - 1)::INTEGER
        FROM UNNEST($2::UUID[]) WITH ORDINALITY AS o(course_id, ord)
        WHERE t.trail_id = $1 AND t.course_id = o.course_id
        "#,
    )
    .bind(trail_id)
    .bind(order)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn touch(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, trail_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE learning_trails SET updated_at = NOW() WHERE id = $1")
        .bind(trail_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_insert_at_appends_by_default() {
        let order = ids(2);
        let new = Uuid::new_v4();
        let next = insert_at(&order, new, None);
        assert_eq!(next, vec![order[0], order[1], new]);
    }

    #[test]
    fn test_insert_at_clamps_and_moves() {
        let order = ids(3);
        assert_eq!(insert_at(&order, order[2], Some(0)), vec![order[2], order[0], order[1]]);

        let new = Uuid::new_v4();
        assert_eq!(insert_at(&order, new, Some(99)).last(), Some(&new));
    }

    #[test]
    fn test_remove_from_keeps_relative_order() {
        let order = ids(4);
        assert_eq!(remove_from(&order, order[1]), vec![order[0], order[2], order[3]]);
    }

    #[test]
    fn test_validate_reorder() {
        let order = ids(3);
        let reversed: Vec<Uuid> = order.iter().rev().copied().collect();
        assert!(validate_reorder(&order, &reversed).is_ok());
        assert!(matches!(
            validate_reorder(&order, &order[..2]),
            Err(TrailError::WrongLength { expected: 3, got: 2 })
        ));
        assert!(matches!(
            validate_reorder(&order, &[order[0], order[0], order[1]]),
            Err(TrailError::DuplicateCourse)
        ));
        assert!(matches!(
            validate_reorder(&order, &[order[0], order[1], Uuid::new_v4()]),
            Err(TrailError::UnknownCourse)
        ));
        assert_eq!(
            validate_reorder(&order, &[]).unwrap_err().to_string(),
            "Expected 3 course ids, got 0"
        );
    }
}
