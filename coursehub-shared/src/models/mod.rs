/// Database models for CourseHub
///
/// This module contains all database models and their CRUD operations.
/// Multi-table removals (course deletion, bans, forum threads) live in
/// [`crate::cascade`], not here.
///
/// # Models
///
/// - `user`: Authentication identities (email + password hash)
/// - `profile`: Public profiles, including the `banned` flag
/// - `role`: Role rows (user / moderator / admin)
/// - `category`: Course categories
/// - `course`: Courses, search and counters
/// - `course_edit`: Pending edits of approved courses
/// - `comment`: Course comments
/// - `rating`: One rating per (user, course)
/// - `engagement`: Likes, saves and session-deduplicated views
/// - `report`: Course reports
/// - `moderation_log`: Moderation audit trail
/// - `forum`: Forum topics, replies and their reports
/// - `trail`: Learning trails (ordered course lists)
/// - `follow`: Follow graph between users
///
/// # Example
///
/// ```no_run
/// use coursehub_shared::models::course::{Course, CourseSearch};
/// use coursehub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let search = CourseSearch {
///     query: Some("rust".to_string()),
///     ..Default::default()
/// };
/// let courses = Course::search(&pool, &search).await?;
/// # Ok(())
/// # }
/// ```

pub mod category;
pub mod comment;
pub mod course;
pub mod course_edit;
pub mod engagement;
pub mod follow;
pub mod forum;
pub mod moderation_log;
pub mod profile;
pub mod rating;
pub mod report;
pub mod role;
pub mod trail;
pub mod user;
