/// Course categories
///
/// Categories are managed by admins. Deleting a category never deletes the
/// courses filed under it: their `category_id` is cleared first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

const SLUG_CONSTRAINT: &str = "categories_slug_key";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// What a category deletion touched
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryDeletion {
    /// Courses whose `category_id` was cleared
    pub detached_courses: u64,

    /// Whether the category row itself was removed
    pub deleted: bool,
}

impl Category {
    /// Creates a category; the slug is derived from the name
    ///
    /// Distinct names can share a slug ("C++" and "C"), and some have none
    /// ("+++"). Those get a random suffix so the name alone decides whether
    /// the category already exists.
    pub async fn create(pool: &PgPool, name: &str) -> Result<Self, sqlx::Error> {
        let name = name.trim();
        let slug = slugify(name);

        if !slug.is_empty() {
            match Self::insert(pool, name, &slug).await {
                Err(sqlx::Error::Database(e))
                    if e.is_unique_violation() && e.constraint() == Some(SLUG_CONSTRAINT) => {}
                other => return other,
            }
        }

        let slug = with_suffix(&slug, Uuid::new_v4());
        debug!(%slug, "Category slug taken or empty, using suffixed slug");
        Self::insert(pool, name, &slug).await
    }

    async fn insert(pool: &PgPool, name: &str, slug: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, slug)
            VALUES ($1, $2)
            RETURNING id, name, slug, created_at
            "#,
        )
        .bind(name)
        .bind(slug)
        .fetch_one(pool)
        .await
    }

    /// All categories in name order
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, created_at FROM categories ORDER BY name",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a category, detaching (not deleting) its courses
    ///
    /// Courses and pending edits that reference the category get a NULL
    /// `category_id` before the category row is removed, inside one
    /// transaction.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<CategoryDeletion, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let detached = sqlx::query("UPDATE courses SET category_id = NULL WHERE category_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("UPDATE course_edits SET category_id = NULL WHERE category_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        tx.commit().await?;

        info!(category_id = %id, detached_courses = detached, deleted, "Category deleted");

        Ok(CategoryDeletion {
            detached_courses: detached,
            deleted,
        })
    }
}

/// Lowercase alphanumeric words joined by `-`
///
/// "Web Development & Design" becomes "web-development-design". Letters
/// outside ASCII are kept, so "Программирование" keeps its slug.
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn with_suffix(slug: &str, id: Uuid) -> String {
    let tag = &id.simple().to_string()[..8];
    if slug.is_empty() {
        tag.to_string()
    } else {
        format!("{}-{}", slug, tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Web Development & Design"), "web-development-design");
        assert_eq!(slugify("  Rust  "), "rust");
        assert_eq!(slugify("C++ / Systems"), "c-systems");
        assert_eq!(slugify("Data-Science 101"), "data-science-101");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_keeps_non_latin_letters() {
        assert_eq!(slugify("Программирование"), "программирование");
        assert_eq!(slugify("Ünïcode Básico"), "ünïcode-básico");
        assert_eq!(slugify("数据 科学"), "数据-科学");
    }

    #[test]
    fn test_with_suffix() {
        let id = Uuid::parse_str("0123456789abcdef0123456789abcdef").unwrap();
        assert_eq!(with_suffix("c", id), "c-01234567");
        assert_eq!(with_suffix("", id), "01234567");
    }
}
