/// Course endpoints
///
/// # Endpoints
///
/// - `GET /v1/courses`: search approved courses
/// - `POST /v1/courses`: submit a course (created `pending`)
/// - `GET /v1/courses/:id`: one course; non-approved ones only for the author and staff
/// - `PATCH /v1/courses/:id`: edit own course
/// - `DELETE /v1/courses/:id`: delete own course and everything attached to it
/// - `GET /v1/me/courses`, `GET /v1/me/saved`, `GET /v1/feed`
///
/// Editing an approved course stores a pending edit for moderators instead
/// of changing the live course. Editing a pending or rejected course changes
/// it in place and puts it back in the moderation queue.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::Pagination,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use coursehub_shared::{
    auth::{authorization::effective_role, middleware::AuthContext},
    cascade::{self, CascadeReport, CourseDeletion},
    models::{
        category::Category,
        course::{web_url, Course, CourseChanges, CourseSearch, CourseSort, CourseStatus, CourseVideo, CreateCourse},
        course_edit::CourseEdit,
        engagement::{self, Engagement},
        rating::CourseRating,
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Deserialize)]
pub struct CourseQuery {
    pub q: Option<String>,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    #[serde(default)]
    pub sort: CourseSort,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<CourseQuery> for CourseSearch {
    fn from(query: CourseQuery) -> Self {
        let defaults = Pagination::default();
        let page = Pagination {
            limit: query.limit.unwrap_or(defaults.limit),
            offset: query.offset.unwrap_or(defaults.offset),
        };
        let (limit, offset) = page.bounds();
        CourseSearch {
            query: query.q.map(|q| q.trim().to_string()).filter(|q| !q.is_empty()),
            category_id: query.category_id,
            author_id: query.author_id,
            sort: query.sort,
            limit,
            offset,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 3, max = 200, message = "Title must be 3-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Description must be 1-5000 characters"))]
    pub description: String,

    pub category_id: Option<Uuid>,

    /// `{"source": "link", "url": ...}` or the upload widget's asset with `"source": "upload"`
    pub video: CourseVideo,

    #[validate(url(message = "Thumbnail must be a valid URL"))]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 3, max = 200, message = "Title must be 3-200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000, message = "Description must be 1-5000 characters"))]
    pub description: Option<String>,

    #[validate(url(message = "Video must be a valid URL"))]
    pub video_url: Option<String>,

    #[validate(url(message = "Thumbnail must be a valid URL"))]
    pub thumbnail_url: Option<String>,

    pub category_id: Option<Uuid>,
}

impl From<UpdateCourseRequest> for CourseChanges {
    fn from(req: UpdateCourseRequest) -> Self {
        CourseChanges {
            title: req.title.map(|t| t.trim().to_string()),
            description: req.description,
            video_url: req.video_url,
            thumbnail_url: req.thumbnail_url,
            category_id: req.category_id,
        }
    }
}

/// What the caller has done with a course
#[derive(Debug, Serialize)]
pub struct ViewerState {
    pub liked: bool,
    pub saved: bool,
    pub rating: Option<i16>,
}

#[derive(Debug, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer: Option<ViewerState>,
}

/// Result of `PATCH /v1/courses/:id`
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CourseUpdate {
    /// Changed in place and resubmitted for review
    Resubmitted { course: Course },

    /// Stored for review; the live course is unchanged
    EditPending { edit: CourseEdit },
}

/// Whether the caller holds a moderator or admin role
pub(crate) async fn caller_is_staff(state: &AppState, caller: Option<AuthContext>) -> ApiResult<bool> {
    match caller {
        Some(auth) => Ok(effective_role(&state.db, auth.user_id).await?.is_staff()),
        None => Ok(false),
    }
}

/// Loads a course the caller may see
///
/// Hidden courses answer 404 so their existence is not revealed.
pub(crate) async fn visible_course(
    state: &AppState,
    course_id: Uuid,
    caller: Option<AuthContext>,
) -> ApiResult<Course> {
    let not_found = || ApiError::NotFound("Course not found".to_string());

    let course = Course::find_by_id(&state.db, course_id).await?.ok_or_else(not_found)?;

    if course.status == CourseStatus::Approved {
        return Ok(course);
    }

    let viewer = caller.map(|auth| auth.user_id);
    let staff = viewer != Some(course.author_id) && caller_is_staff(state, caller).await?;

    if course.is_visible_to(viewer, staff) {
        Ok(course)
    } else {
        Err(not_found())
    }
}

/// Loads a course and checks that the caller wrote it
async fn own_course(state: &AppState, course_id: Uuid, auth: AuthContext) -> ApiResult<Course> {
    let course = Course::find_by_id(&state.db, course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    if !auth.is(course.author_id) {
        return Err(ApiError::Forbidden("Only the author can change this course".to_string()));
    }

    Ok(course)
}

async fn ensure_category(state: &AppState, category_id: Option<Uuid>) -> ApiResult<()> {
    if let Some(id) = category_id {
        if Category::find_by_id(&state.db, id).await?.is_none() {
            return Err(ApiError::invalid("category_id", "Unknown category"));
        }
    }
    Ok(())
}

/// Narrows optional URL fields to http(s) with a DNS host
fn check_web_urls(fields: &[(&'static str, Option<&str>)]) -> ApiResult<()> {
    let mut errors = ValidationErrors::new();
    for (field, url) in fields {
        if let Some(Err(e)) = url.map(web_url) {
            errors.add(*field, e);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.into())
    }
}

pub async fn search_courses(
    State(state): State<AppState>,
    Query(query): Query<CourseQuery>,
) -> ApiResult<Json<Vec<Course>>> {
    let search = CourseSearch::from(query);
    Ok(Json(Course::search(&state.db, &search).await?))
}

pub async fn create_course(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateCourseRequest>,
) -> ApiResult<(StatusCode, Json<Course>)> {
    req.validate()?;
    req.video.validate()?;
    check_web_urls(&[("thumbnail_url", req.thumbnail_url.as_deref())])?;
    ensure_category(&state, req.category_id).await?;

    let course = Course::create(
        &state.db,
        CreateCourse {
            author_id: auth.user_id,
            category_id: req.category_id,
            title: req.title.trim().to_string(),
            description: req.description,
            video: req.video,
            thumbnail_url: req.thumbnail_url,
        },
    )
    .await?;

    info!(course_id = %course.id, author_id = %auth.user_id, "Course submitted");

    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn get_course(
    State(state): State<AppState>,
    caller: Option<AuthContext>,
    Path(course_id): Path<Uuid>,
) -> ApiResult<Json<CourseDetail>> {
    let course = visible_course(&state, course_id, caller).await?;

    let viewer = match caller {
        Some(auth) => Some(ViewerState {
            liked: engagement::is_active(&state.db, Engagement::Like, auth.user_id, course.id).await?,
            saved: engagement::is_active(&state.db, Engagement::Save, auth.user_id, course.id).await?,
            rating: CourseRating::find(&state.db, auth.user_id, course.id)
                .await?
                .map(|r| r.rating),
        }),
        None => None,
    };

    Ok(Json(CourseDetail { course, viewer }))
}

pub async fn update_course(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
    Json(req): Json<UpdateCourseRequest>,
) -> ApiResult<(StatusCode, Json<CourseUpdate>)> {
    req.validate()?;
    check_web_urls(&[
        ("video_url", req.video_url.as_deref()),
        ("thumbnail_url", req.thumbnail_url.as_deref()),
    ])?;
    ensure_category(&state, req.category_id).await?;

    let changes = CourseChanges::from(req);
    if changes.is_empty() {
        return Err(ApiError::BadRequest("No changes provided".to_string()));
    }

    let course = own_course(&state, course_id, auth).await?;

    if course.status == CourseStatus::Approved {
        let edit = CourseEdit::create(&state.db, course.id, auth.user_id, &changes).await?;
        info!(course_id = %course.id, edit_id = %edit.id, "Edit submitted for review");
        return Ok((StatusCode::ACCEPTED, Json(CourseUpdate::EditPending { edit })));
    }

    let course = Course::apply_changes(&state.db, course.id, &changes, true)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    Ok((StatusCode::OK, Json(CourseUpdate::Resubmitted { course })))
}

pub async fn delete_course(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(course_id): Path<Uuid>,
) -> ApiResult<Json<CascadeReport>> {
    let course = own_course(&state, course_id, auth).await?;
    let report = cascade::delete_course(&state.db, course.id, CourseDeletion::ByAuthor).await?;
    Ok(Json(report))
}

/// Every course the caller wrote, in any status
pub async fn list_own_courses(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<Vec<Course>>> {
    Ok(Json(Course::list_by_author(&state.db, auth.user_id).await?))
}

pub async fn list_saved_courses(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<Vec<Course>>> {
    Ok(Json(Course::list_saved_by(&state.db, auth.user_id).await?))
}

/// Approved courses from followed authors
pub async fn feed(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Course>>> {
    let (limit, offset) = page.bounds();
    Ok(Json(Course::feed_for(&state.db, auth.user_id, limit, offset).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_becomes_search() {
        let query: CourseQuery = serde_json::from_value(serde_json::json!({
            "q": "  borrow checker ",
            "sort": "top_rated",
            "limit": 500
        }))
        .unwrap();

        let search = CourseSearch::from(query);
        assert_eq!(search.query.as_deref(), Some("borrow checker"));
        assert_eq!(search.sort, CourseSort::TopRated);
        assert_eq!(search.limit, 100);
        assert_eq!(search.offset, 0);
    }

    #[test]
    fn test_blank_query_is_ignored() {
        let query: CourseQuery = serde_json::from_value(serde_json::json!({ "q": "   " })).unwrap();
        assert!(CourseSearch::from(query).query.is_none());
    }

    #[test]
    fn test_create_request_accepts_upload_asset() {
        let req: CreateCourseRequest = serde_json::from_value(serde_json::json!({
            "title": "Tokio in practice",
            "description": "Runtimes, tasks and channels",
            "video": {
                "source": "upload",
                "url": "https://media.example.com/v/abc.mp4",
                "duration": 312.5,
                "format": "mp4",
                "size": 1048576
            }
        }))
        .unwrap();

        assert!(req.validate().is_ok());
        assert!(req.video.validate().is_ok());
        assert!(matches!(req.video, CourseVideo::Upload(_)));
    }

    #[test]
    fn test_junk_video_urls_rejected() {
        let req: CreateCourseRequest = serde_json::from_value(serde_json::json!({
            "title": "Tokio in practice",
            "description": "Runtimes, tasks and channels",
            "video": { "source": "link", "url": "https://<script>/x" },
            "thumbnail_url": "not a url"
        }))
        .unwrap();

        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("thumbnail_url"));
        assert!(req.video.validate().is_err());
    }

    #[test]
    fn test_update_urls_need_a_web_host() {
        assert!(check_web_urls(&[("video_url", Some("https://videos.example.com/intro")), ("thumbnail_url", None)]).is_ok());

        let err = check_web_urls(&[
            ("video_url", Some("https://a\"b.com/")),
            ("thumbnail_url", Some("mailto:someone@example.com")),
        ])
        .unwrap_err();
        let ApiError::ValidationError(details) = err else {
            panic!("expected a validation error");
        };
        let fields: Vec<_> = details.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, ["thumbnail_url", "video_url"]);
    }

    #[test]
    fn test_update_outcome_is_tagged() {
        let edit_json = serde_json::to_value(CourseUpdate::EditPending {
            edit: CourseEdit {
                id: Uuid::nil(),
                course_id: Uuid::nil(),
                author_id: Uuid::nil(),
                title: Some("New".to_string()),
                description: None,
                video_url: None,
                thumbnail_url: None,
                category_id: None,
                status: CourseStatus::Pending,
                created_at: chrono::Utc::now(),
                moderated_at: None,
                moderated_by: None,
            },
        })
        .unwrap();

        assert_eq!(edit_json["outcome"], "edit_pending");
        assert_eq!(edit_json["edit"]["title"], "New");
    }
}
