/// Course model and database operations
///
/// A course is a video (an external link, or a clip uploaded through the
/// client-side upload widget) with a title, description and optional
/// category. Courses start `pending` and only `approved` courses show up in
/// search and feeds.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE course_status AS ENUM ('pending', 'approved', 'rejected');
/// CREATE TYPE video_source AS ENUM ('link', 'upload');
///
/// CREATE TABLE courses (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     author_id UUID NOT NULL REFERENCES profiles(user_id),
///     category_id UUID REFERENCES categories(id),
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     video_source video_source NOT NULL,
///     video_url VARCHAR(1024) NOT NULL,
///     video_duration_seconds DOUBLE PRECISION,
///     video_format VARCHAR(32),
///     video_size_bytes BIGINT,
///     thumbnail_url VARCHAR(1024),
///     status course_status NOT NULL DEFAULT 'pending',
///     view_count BIGINT NOT NULL DEFAULT 0,
///     like_count BIGINT NOT NULL DEFAULT 0,
///     save_count BIGINT NOT NULL DEFAULT 0,
///     rating_avg DOUBLE PRECISION NOT NULL DEFAULT 0,
///     rating_count BIGINT NOT NULL DEFAULT 0,
///     moderated_at TIMESTAMPTZ,
///     moderated_by UUID,
///     rejection_reason TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Counters
///
/// `like_count`, `save_count`, `rating_avg` and `rating_count` are recomputed
/// from their source tables by [`Course::refresh_counters`] after every
/// mutation. `view_count` is bumped only when a new (course, session) view is
/// recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidateUrl, ValidationError, ValidationErrors};

const COURSE_COLUMNS: &str = "id, author_id, category_id, title, description, video_source, \
    video_url, video_duration_seconds, video_format, video_size_bytes, thumbnail_url, status, \
    view_count, like_count, save_count, rating_avg, rating_count, moderated_at, moderated_by, \
    rejection_reason, created_at, updated_at";

/// Maximum page size accepted by list operations
pub const MAX_PAGE_SIZE: i64 = 100;

/// Moderation lifecycle of a course or a course edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "course_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    /// Awaiting moderation
    Pending,

    /// Visible to everyone
    Approved,

    /// Hidden; the author may edit and resubmit
    Rejected,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Pending => "pending",
            CourseStatus::Approved => "approved",
            CourseStatus::Rejected => "rejected",
        }
    }
}

/// Where the video comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "video_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VideoSource {
    /// External link (e.g. a video platform URL)
    Link,

    /// Clip uploaded through the media widget
    Upload,
}

/// Asset metadata returned by the upload widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct VideoAsset {
    /// Delivery URL of the uploaded clip
    #[validate(custom(function = "web_url"))]
    pub url: String,

    /// Duration in seconds
    #[validate(range(min = 0.0, message = "Video duration must be non-negative"))]
    pub duration: Option<f64>,

    /// Container format, e.g. "mp4"
    #[validate(length(min = 1, max = 32, message = "Video format must be 1-32 characters"))]
    pub format: Option<String>,

    /// Size in bytes
    #[validate(range(min = 0, message = "Video size must be non-negative"))]
    pub size: Option<i64>,
}

/// The video attached to a new course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum CourseVideo {
    Link { url: String },
    Upload(VideoAsset),
}

impl CourseVideo {
    pub fn source(&self) -> VideoSource {
        match self {
            CourseVideo::Link { .. } => VideoSource::Link,
            CourseVideo::Upload(_) => VideoSource::Upload,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            CourseVideo::Link { url } => url,
            CourseVideo::Upload(asset) => &asset.url,
        }
    }
}

impl Validate for CourseVideo {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            CourseVideo::Link { url } => {
                let mut errors = ValidationErrors::new();
                if let Err(e) = web_url(url) {
                    errors.add("url", e);
                }
                if errors.is_empty() {
                    Ok(())
                } else {
                    Err(errors)
                }
            }
            CourseVideo::Upload(asset) => asset.validate(),
        }
    }
}

fn url_error(message: &'static str) -> ValidationError {
    let mut error = ValidationError::new("url");
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Accepts only absolute http(s) URLs whose host is a DNS name or IPv4 address
pub fn web_url(url: &str) -> Result<(), ValidationError> {
    if !url.validate_url() {
        return Err(url_error("Must be a valid URL"));
    }

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| url_error("URL must start with http:// or https://"))?;

    let authority = rest.split(&['/', '?', '#'][..]).next().unwrap_or_default();
    let host = match authority.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => authority,
    };

    let valid_host = !host.is_empty()
        && host
            .split('.')
            .all(|label| !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
    if !valid_host {
        return Err(url_error("URL must include a valid host"));
    }

    Ok(())
}

/// Course row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course {
    pub id: Uuid,
    pub author_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub video_source: VideoSource,
    pub video_url: String,
    pub video_duration_seconds: Option<f64>,
    pub video_format: Option<String>,
    pub video_size_bytes: Option<i64>,
    pub thumbnail_url: Option<String>,
    pub status: CourseStatus,
    pub view_count: i64,
    pub like_count: i64,
    pub save_count: i64,
    pub rating_avg: f64,
    pub rating_count: i64,
    pub moderated_at: Option<DateTime<Utc>>,
    pub moderated_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Approved courses are public; anything else is visible only to its
    /// author and to staff.
    pub fn is_visible_to(&self, viewer: Option<Uuid>, viewer_is_staff: bool) -> bool {
        self.status == CourseStatus::Approved
            || viewer_is_staff
            || viewer == Some(self.author_id)
    }
}

/// Input for creating a course (always created `pending`)
#[derive(Debug, Clone)]
pub struct CreateCourse {
    pub author_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub video: CourseVideo,
    pub thumbnail_url: Option<String>,
}

/// Field changes requested by an author
///
/// Applied in place to pending/rejected courses; stored as a pending
/// [`CourseEdit`](crate::models::course_edit::CourseEdit) for approved ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub category_id: Option<Uuid>,
}

impl CourseChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.video_url.is_none()
            && self.thumbnail_url.is_none()
            && self.category_id.is_none()
    }
}

/// Result ordering for course search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseSort {
    #[default]
    Newest,
    Popular,
    TopRated,
}

impl CourseSort {
    fn order_by(&self) -> &'static str {
        match self {
            CourseSort::Newest => " ORDER BY created_at DESC",
            CourseSort::Popular => " ORDER BY view_count DESC, like_count DESC, created_at DESC",
            CourseSort::TopRated => " ORDER BY rating_avg DESC, rating_count DESC, created_at DESC",
        }
    }
}

/// Search filters over approved courses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseSearch {
    /// Case-insensitive substring of title or description
    pub query: Option<String>,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub sort: CourseSort,
    pub limit: i64,
    pub offset: i64,
}

impl Default for CourseSearch {
    fn default() -> Self {
        Self {
            query: None,
            category_id: None,
            author_id: None,
            sort: CourseSort::Newest,
            limit: 20,
            offset: 0,
        }
    }
}

/// Clamps a requested page to `1..=MAX_PAGE_SIZE` and a non-negative offset
pub fn clamp_page(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_PAGE_SIZE), offset.max(0))
}

/// Escapes `%`, `_` and `\` so user input is matched literally by ILIKE
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Course {
    /// Creates a pending course
    pub async fn create(pool: &PgPool, data: CreateCourse) -> Result<Self, sqlx::Error> {
        let (duration, format, size) = match &data.video {
            CourseVideo::Link { .. } => (None, None, None),
            CourseVideo::Upload(asset) => (asset.duration, asset.format.clone(), asset.size),
        };

        let query = format!(
            r#"
            INSERT INTO courses (author_id, category_id, title, description, video_source,
                                 video_url, video_duration_seconds, video_format,
                                 video_size_bytes, thumbnail_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            COURSE_COLUMNS
        );

        sqlx::query_as::<_, Course>(&query)
            .bind(data.author_id)
            .bind(data.category_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.video.source())
            .bind(data.video.url())
            .bind(duration)
            .bind(format)
            .bind(size)
            .bind(data.thumbnail_url)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM courses WHERE id = $1", COURSE_COLUMNS);

        sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Searches approved courses
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use coursehub_shared::models::course::{Course, CourseSearch, CourseSort};
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// let top = Course::search(&pool, &CourseSearch {
    ///     query: Some("ownership".to_string()),
    ///     sort: CourseSort::TopRated,
    ///     ..Default::default()
    /// })
    /// .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn search(pool: &PgPool, search: &CourseSearch) -> Result<Vec<Self>, sqlx::Error> {
        let (limit, offset) = clamp_page(search.limit, search.offset);

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM courses WHERE status = 'approved'",
            COURSE_COLUMNS
        ));

        if let Some(text) = search.query.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", escape_like(text));
            qb.push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category_id) = search.category_id {
            qb.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(author_id) = search.author_id {
            qb.push(" AND author_id = ").push_bind(author_id);
        }

        qb.push(search.sort.order_by());
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);

        qb.build_query_as::<Course>().fetch_all(pool).await
    }

    /// Every course of an author, any status, newest first
    pub async fn list_by_author(pool: &PgPool, author_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM courses WHERE author_id = $1 ORDER BY created_at DESC",
            COURSE_COLUMNS
        );

        sqlx::query_as::<_, Course>(&query)
            .bind(author_id)
            .fetch_all(pool)
            .await
    }

    /// IDs of every course an author owns
    pub async fn ids_by_author(pool: &PgPool, author_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM courses WHERE author_id = $1")
            .bind(author_id)
            .fetch_all(pool)
            .await
    }

    /// Courses in a given status, oldest first (moderation queue order)
    pub async fn list_by_status(
        pool: &PgPool,
        status: CourseStatus,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let (limit, offset) = clamp_page(limit, offset);
        let query = format!(
            "SELECT {} FROM courses WHERE status = $1 ORDER BY created_at ASC LIMIT $2 OFFSET $3",
            COURSE_COLUMNS
        );

        sqlx::query_as::<_, Course>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Approved courses a user has saved, most recently saved first
    pub async fn list_saved_by(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {} FROM courses c
            JOIN course_saves s ON s.course_id = c.id
            WHERE s.user_id = $1 AND c.status = 'approved'
            ORDER BY s.created_at DESC
            "#,
            prefixed_columns("c")
        );

        sqlx::query_as::<_, Course>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Approved courses by authors the user follows, newest first
    pub async fn feed_for(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let (limit, offset) = clamp_page(limit, offset);
        let query = format!(
            r#"
            SELECT {} FROM courses c
            JOIN user_follows f ON f.following_id = c.author_id
            WHERE f.follower_id = $1 AND c.status = 'approved'
            ORDER BY c.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            prefixed_columns("c")
        );

        sqlx::query_as::<_, Course>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Applies author changes directly to the course row
    ///
    /// With `resubmit` the course goes back to `pending` and its previous
    /// moderation stamp and rejection reason are cleared.
    pub async fn apply_changes(
        pool: &PgPool,
        id: Uuid,
        changes: &CourseChanges,
        resubmit: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE courses SET updated_at = NOW()");

        if let Some(title) = &changes.title {
            qb.push(", title = ").push_bind(title.clone());
        }
        if let Some(description) = &changes.description {
            qb.push(", description = ").push_bind(description.clone());
        }
        if let Some(video_url) = &changes.video_url {
            qb.push(", video_url = ").push_bind(video_url.clone());
        }
        if let Some(thumbnail_url) = &changes.thumbnail_url {
            qb.push(", thumbnail_url = ").push_bind(thumbnail_url.clone());
        }
        if let Some(category_id) = changes.category_id {
            qb.push(", category_id = ").push_bind(category_id);
        }
        if resubmit {
            qb.push(
                ", status = 'pending', moderated_at = NULL, moderated_by = NULL, \
                 rejection_reason = NULL",
            );
        }

        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING ").push(COURSE_COLUMNS);

        qb.build_query_as::<Course>().fetch_optional(pool).await
    }

    /// Moves a course to `status` and stamps the moderator
    ///
    /// The rejection reason is stored for rejections and cleared otherwise.
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: CourseStatus,
        moderator_id: Uuid,
        reason: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let reason = match status {
            CourseStatus::Rejected => reason,
            _ => None,
        };

        let result = sqlx::query(
            r#"
            UPDATE courses
            SET status = $2, moderated_at = NOW(), moderated_by = $3,
                rejection_reason = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(moderator_id)
        .bind(reason)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Recomputes like/save/rating counters from their source tables
    pub async fn refresh_counters(pool: &PgPool, course_ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        if course_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE courses c SET
                like_count = (SELECT COUNT(*) FROM course_likes l WHERE l.course_id = c.id),
                save_count = (SELECT COUNT(*) FROM course_saves s WHERE s.course_id = c.id),
                rating_count = (SELECT COUNT(*) FROM course_ratings r WHERE r.course_id = c.id),
                rating_avg = COALESCE(
                    (SELECT AVG(r.rating)::DOUBLE PRECISION FROM course_ratings r
                     WHERE r.course_id = c.id), 0)
            WHERE c.id = ANY($1)
            "#,
        )
        .bind(course_ids)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Adds one to `view_count`
    pub async fn increment_view_count(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE courses SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of courses per status as (pending, approved, rejected)
    pub async fn count_by_status(pool: &PgPool) -> Result<(i64, i64, i64), sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pending'),
                COUNT(*) FILTER (WHERE status = 'approved'),
                COUNT(*) FILTER (WHERE status = 'rejected')
            FROM courses
            "#,
        )
        .fetch_one(pool)
        .await
    }
}

fn prefixed_columns(alias: &str) -> String {
    COURSE_COLUMNS
        .split(',')
        .map(|column| format!("{}.{}", alias, column.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("rust"), "rust");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("snake_case"), "snake\\_case");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(20, 0), (20, 0));
        assert_eq!(clamp_page(0, -5), (1, 0));
        assert_eq!(clamp_page(10_000, 40), (MAX_PAGE_SIZE, 40));
    }

    #[test]
    fn test_web_url() {
        assert!(web_url("https://videos.example.com/watch?v=42").is_ok());
        assert!(web_url("http://localhost:8080/clip.mp4").is_ok());
        assert!(web_url("ftp://example.com/clip").is_err());
        assert!(web_url("https://").is_err());
        assert!(web_url("https:///path-only").is_err());
        assert!(web_url("javascript:alert(1)").is_err());
    }

    #[test]
    fn test_web_url_rejects_junk_hosts() {
        for url in [
            "https://<script>/x",
            "http://:80/",
            "https://a\"b.com/",
            "https://exa%mple..com",
            "https://user@/x",
        ] {
            let err = web_url(url).unwrap_err();
            assert_eq!(err.code, "url", "{url} should be rejected");
        }
    }

    #[test]
    fn test_course_video_validation() {
        let link = CourseVideo::Link {
            url: "https://videos.example.com/intro".to_string(),
        };
        assert!(link.validate().is_ok());
        assert_eq!(link.source(), VideoSource::Link);

        let upload = CourseVideo::Upload(VideoAsset {
            url: "https://cdn.example.com/v/abc.mp4".to_string(),
            duration: Some(93.5),
            format: Some("mp4".to_string()),
            size: Some(1_048_576),
        });
        assert!(upload.validate().is_ok());
        assert_eq!(upload.source(), VideoSource::Upload);
        assert_eq!(upload.url(), "https://cdn.example.com/v/abc.mp4");

        let negative = CourseVideo::Upload(VideoAsset {
            url: "https://cdn.example.com/v/abc.mp4".to_string(),
            duration: Some(-1.0),
            format: None,
            size: None,
        });
        let errors = negative.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("duration"));

        let bad_link = CourseVideo::Link {
            url: "https://exa%mple..com".to_string(),
        };
        let errors = bad_link.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("url"));
    }

    #[test]
    fn test_course_video_deserialize_tagged() {
        let link: CourseVideo = serde_json::from_value(serde_json::json!({
            "source": "link",
            "url": "https://videos.example.com/intro"
        }))
        .unwrap();
        assert_eq!(link.source(), VideoSource::Link);

        let upload: CourseVideo = serde_json::from_value(serde_json::json!({
            "source": "upload",
            "url": "https://cdn.example.com/v/abc.mp4",
            "duration": 12.0,
            "format": "webm",
            "size": 2048
        }))
        .unwrap();
        assert_eq!(upload.source(), VideoSource::Upload);
    }

    #[test]
    fn test_prefixed_columns() {
        let columns = prefixed_columns("c");
        assert!(columns.starts_with("c.id, c.author_id"));
        assert!(columns.ends_with("c.updated_at"));
        assert!(!columns.contains("c. "));
    }

    fn sample(status: CourseStatus, author_id: Uuid) -> Course {
        Course {
            id: Uuid::new_v4(),
            author_id,
            category_id: None,
            title: "Lifetimes".to_string(),
            description: String::new(),
            video_source: VideoSource::Link,
            video_url: "https://videos.example.com/l".to_string(),
            video_duration_seconds: None,
            video_format: None,
            video_size_bytes: None,
            thumbnail_url: None,
            status,
            view_count: 0,
            like_count: 0,
            save_count: 0,
            rating_avg: 0.0,
            rating_count: 0,
            moderated_at: None,
            moderated_by: None,
            rejection_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_visibility() {
        let author = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let approved = sample(CourseStatus::Approved, author);
        assert!(approved.is_visible_to(None, false));

        let pending = sample(CourseStatus::Pending, author);
        assert!(!pending.is_visible_to(None, false));
        assert!(!pending.is_visible_to(Some(stranger), false));
        assert!(pending.is_visible_to(Some(author), false));
        assert!(pending.is_visible_to(Some(stranger), true));
    }
}
